//! Objects keyed by id whose entries are parsed one by one.

use std::collections::{btree_map, BTreeMap};

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::lenient;

/// A `key -> T` object such as `cluster.machines` or `cluster.processes`.
///
/// Entries that do not convert to `T` are dropped with a warning, but the
/// object's size as it appeared in the document is kept in [`len`](Self::len).
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    entries: BTreeMap<String, T>,
    listed: usize,
}

impl<T> Keyed<T> {
    /// Number of entries in the document, usable or not.
    pub fn len(&self) -> usize {
        self.listed
    }

    pub fn is_empty(&self) -> bool {
        self.listed == 0
    }

    /// The usable entries.
    pub fn entries(&self) -> &BTreeMap<String, T> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Usable entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, T> {
        self.entries.iter()
    }

    pub fn values(&self) -> btree_map::Values<'_, String, T> {
        self.entries.values()
    }
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            listed: 0,
        }
    }
}

impl<T> FromIterator<(String, T)> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let entries: BTreeMap<String, T> = iter.into_iter().collect();
        let listed = entries.len();
        Self { entries, listed }
    }
}

impl<'a, T> IntoIterator for &'a Keyed<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = btree_map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Keyed<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(entries) => Ok(Keyed {
                listed: entries.len(),
                entries: entries
                    .into_iter()
                    .filter_map(|(key, value)| lenient::coerce(value).map(|parsed| (key, parsed)))
                    .collect(),
            }),
            other => Err(D::Error::custom(format_args!(
                "expected an object, found {}",
                lenient::kind(&other)
            ))),
        }
    }
}
