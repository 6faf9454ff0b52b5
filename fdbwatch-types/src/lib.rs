//! # fdbwatch-types
//!
//! Typed schema for the JSON document printed by `fdbcli --exec "status json"`.
//!
//! The status tool omits fields depending on the role and version of each
//! process, and a few fields changed shape between tool versions. Every field
//! in this schema is therefore optional, and the shape of each field is
//! decided once, here, at parse time:
//!
//! - a missing key or a JSON `null` is simply `None`
//! - a value of an unexpected shape is logged with `tracing::warn!` and
//!   treated as `None`, it never fails the whole document
//! - `roles` is accepted both as a map (`id -> role`) and as a list
//! - `network.current_connections` is accepted both as a number and as
//!   `{"value": n}`
//!
//! ## Example
//!
//! ```rust
//! use fdbwatch_types::StatusDocument;
//!
//! let status = StatusDocument::from_json(
//!     r#"{"cluster": {"processes": {"a": {"address": "10.0.0.1:4500", "roles": []}}}}"#,
//! )
//! .unwrap();
//!
//! let cluster = status.cluster.unwrap();
//! assert_eq!(cluster.process_count(), Some(1));
//! assert_eq!(cluster.instance_count(), Some(0));
//! ```

mod cluster;
mod keyed;
mod lenient;
mod process;
mod role;
mod stats;

pub use cluster::*;
pub use keyed::Keyed;
pub use process::*;
pub use role::*;
pub use stats::*;

use serde::Deserialize;

/// Root of a `status json` document.
///
/// Only the `cluster` section is modelled. A document without a usable
/// `cluster` object parses successfully with `cluster: None`; deciding
/// whether that is fatal is up to the consumer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatusDocument {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub cluster: Option<Cluster>,
}

impl StatusDocument {
    /// Parse a status document from a JSON string.
    ///
    /// Fails only when the input is not valid JSON or not an object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a status document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
