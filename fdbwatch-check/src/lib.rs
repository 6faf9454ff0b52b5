//! # fdbwatch-check
//!
//! Monitoring check for FoundationDB clusters.
//!
//! Each poll runs `fdbcli --exec "status json"`, parses the health snapshot
//! and translates it into gauges, monotonic counts and a `can_connect`
//! service check, submitted through a [`MetricsSink`] supplied by the host.
//!
//! ## Health
//!
//! | Situation | `foundationdb.can_connect` |
//! |---|---|
//! | status parsed and translated | OK |
//! | `cluster.degraded_processes > 0` | WARNING |
//! | no output, non-zero exit, timeout, invalid JSON, no `cluster` | CRITICAL, no metrics |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fdbwatch_check::{FoundationdbCheck, InstanceConfig, RecordingSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let check = FoundationdbCheck::builder()
//!         .instance(InstanceConfig {
//!             cluster_file: Some("/etc/foundationdb/fdb.cluster".into()),
//!             tags: vec!["env:prod".to_string()],
//!             ..Default::default()
//!         })
//!         .build()?;
//!
//!     let mut sink = RecordingSink::new();
//!     check.check(&mut sink).await?;
//!
//!     for record in sink.records() {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```

mod check;
mod command;
mod config;
mod error;
mod sink;
mod source;
mod translator;

pub use check::{parse_output, FoundationdbCheck, FoundationdbCheckBuilder};
pub use command::{FdbCli, StatusCommand, STATUS_ARGS};
pub use config::{InstanceConfig, DEFAULT_BASE_COMMAND};
pub use error::CheckError;
pub use sink::{MetricRecord, MetricsSink, RecordingSink, ServiceCheckStatus};
pub use source::{CommandOutput, FileSource, StatusSource};
pub use translator::{StatusTranslator, CAN_CONNECT, DEFAULT_NAMESPACE, DEGRADED_MESSAGE};

// Re-export the schema for convenience
pub use fdbwatch_types::StatusDocument;
