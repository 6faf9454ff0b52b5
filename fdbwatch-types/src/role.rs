//! Roles hosted by a process (`cluster.processes.*.roles`).

use std::slice;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::lenient;
use crate::{HzCounter, LatencyStatistics, Lag};

/// A role (storage, log, proxy, ...) running inside a process.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Role {
    /// Role type, e.g. `"storage"`. Roles without it are not reported.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub role: Option<String>,

    /// Role instance id. For map-shaped `roles` this falls back to the map key.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub input_bytes: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub durable_bytes: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub total_queries: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub bytes_queried: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub finished_queries: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub keys_queried: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub low_priority_queries: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub mutation_bytes: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub mutations: Option<HzCounter>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub stored_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub query_queue_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub local_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_available_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_free_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_inline_keys: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_total_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_total_nodes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_total_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub kvstore_used_bytes: Option<f64>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub data_lag: Option<Lag>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub durability_lag: Option<Lag>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub read_latency_statistics: Option<LatencyStatistics>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub commit_latency_statistics: Option<LatencyStatistics>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub grv_latency_statistics: Option<GrvLatencyStatistics>,
}

impl Role {
    /// Rate-counter fields in reporting order, paired with their names.
    pub fn hz_counters(&self) -> [(&'static str, Option<HzCounter>); 9] {
        [
            ("input_bytes", self.input_bytes),
            ("durable_bytes", self.durable_bytes),
            ("total_queries", self.total_queries),
            ("bytes_queried", self.bytes_queried),
            ("finished_queries", self.finished_queries),
            ("keys_queried", self.keys_queried),
            ("low_priority_queries", self.low_priority_queries),
            ("mutation_bytes", self.mutation_bytes),
            ("mutations", self.mutations),
        ]
    }

    /// Plain gauge fields in reporting order, paired with their names.
    pub fn gauges(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("stored_bytes", self.stored_bytes),
            ("query_queue_max", self.query_queue_max),
            ("local_rate", self.local_rate),
            ("kvstore_available_bytes", self.kvstore_available_bytes),
            ("kvstore_free_bytes", self.kvstore_free_bytes),
            ("kvstore_inline_keys", self.kvstore_inline_keys),
            ("kvstore_total_bytes", self.kvstore_total_bytes),
            ("kvstore_total_nodes", self.kvstore_total_nodes),
            ("kvstore_total_size", self.kvstore_total_size),
            ("kvstore_used_bytes", self.kvstore_used_bytes),
        ]
    }
}

/// GRV latencies, split by transaction priority.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct GrvLatencyStatistics {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub default: Option<LatencyStatistics>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub batch: Option<LatencyStatistics>,
}

/// The roles of a process.
///
/// Depending on the tool version `roles` is either a list of role objects or
/// a map from role id to role object; both normalize to this list. Entries
/// that are not objects are dropped with a warning, but still count towards
/// [`listed`](Self::listed).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roles {
    roles: Vec<Role>,
    listed: usize,
}

impl Roles {
    pub fn new(roles: Vec<Role>) -> Self {
        let listed = roles.len();
        Self { roles, listed }
    }

    /// Number of usable roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Number of entries in the document, usable or not.
    pub fn listed(&self) -> usize {
        self.listed
    }

    pub fn iter(&self) -> slice::Iter<'_, Role> {
        self.roles.iter()
    }
}

impl<'a> IntoIterator for &'a Roles {
    type Item = &'a Role;
    type IntoIter = slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter()
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(Roles {
                listed: items.len(),
                roles: items.into_iter().filter_map(lenient::coerce).collect(),
            }),
            Value::Object(entries) => Ok(Roles {
                listed: entries.len(),
                roles: entries
                    .into_iter()
                    .filter_map(|(key, value)| {
                        let mut role: Role = lenient::coerce(value)?;
                        role.id.get_or_insert(key);
                        Some(role)
                    })
                    .collect(),
            }),
            other => Err(D::Error::custom(format_args!(
                "expected a list or map of roles, found {}",
                lenient::kind(&other)
            ))),
        }
    }
}
