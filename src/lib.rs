//! # fdbwatch
//!
//! Host driver for the FoundationDB status check.
//!
//! Loads layered [`Settings`], builds a [`FoundationdbCheck`] from them and
//! runs it on an interval through a [`Poller`], writing each poll's metrics
//! and service check with a [`RecordWriter`].
//!
//! ## Usage
//!
//! ```bash
//! # Poll every 15s using the default cluster file
//! fdbwatch
//!
//! # One poll against a specific cluster, JSON lines to a file
//! fdbwatch --once --cluster-file /etc/foundationdb/fdb.cluster --format json --output fdb.jsonl
//!
//! # Replay a saved document
//! fdbwatch --once --input status.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::time::Duration;
//! use fdbwatch::{OutputFormat, Poller, RecordWriter};
//! use fdbwatch_check::{FileSource, FoundationdbCheck};
//!
//! # tokio_test::block_on(async {
//! let check = FoundationdbCheck::builder()
//!     .source(FileSource::new("status.json"))
//!     .build()
//!     .unwrap();
//! let writer = RecordWriter::new(std::io::stdout(), OutputFormat::Json);
//! let mut poller = Poller::new(check, writer, Duration::from_secs(15));
//! let status = poller.poll_once().await.unwrap();
//! println!("{status}");
//! # });
//! ```

pub mod duration;
pub mod output;
pub mod poller;
pub mod settings;

pub use output::{OutputFormat, RecordWriter};
pub use poller::Poller;
pub use settings::{CliOverrides, Settings};

pub use fdbwatch_check::{FoundationdbCheck, ServiceCheckStatus};
