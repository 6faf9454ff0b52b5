//! Metric submission interface.
//!
//! The check never talks to a monitoring agent directly. It emits through a
//! [`MetricsSink`], which the host provides: a forwarder to an agent, a file
//! writer, or the [`RecordingSink`] used by tests and by the CLI.

use std::fmt;

use serde::Serialize;

/// Tri-state health signal, distinct from numeric metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCheckStatus {
    Ok,
    Warning,
    Critical,
}

impl ServiceCheckStatus {
    /// Numeric status code as understood by agents (0 = OK, 1 = WARNING, 2 = CRITICAL).
    pub fn code(&self) -> u8 {
        match self {
            ServiceCheckStatus::Ok => 0,
            ServiceCheckStatus::Warning => 1,
            ServiceCheckStatus::Critical => 2,
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            ServiceCheckStatus::Ok => "OK",
            ServiceCheckStatus::Warning => "WARNING",
            ServiceCheckStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ServiceCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Receiver of metric-emission calls.
pub trait MetricsSink {
    /// Submit a point-in-time value.
    fn gauge(&mut self, name: &str, value: f64, tags: &[String]);

    /// Submit a cumulative counter; the receiver is responsible for turning it into a rate.
    fn monotonic_count(&mut self, name: &str, value: f64, tags: &[String]);

    /// Submit a health signal.
    fn service_check(
        &mut self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        message: Option<&str>,
    );
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn gauge(&mut self, name: &str, value: f64, tags: &[String]) {
        (**self).gauge(name, value, tags)
    }

    fn monotonic_count(&mut self, name: &str, value: f64, tags: &[String]) {
        (**self).monotonic_count(name, value, tags)
    }

    fn service_check(
        &mut self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        message: Option<&str>,
    ) {
        (**self).service_check(name, status, tags, message)
    }
}

/// One recorded emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricRecord {
    Gauge {
        name: String,
        value: f64,
        tags: Vec<String>,
    },
    MonotonicCount {
        name: String,
        value: f64,
        tags: Vec<String>,
    },
    ServiceCheck {
        name: String,
        status: ServiceCheckStatus,
        tags: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl MetricRecord {
    pub fn name(&self) -> &str {
        match self {
            MetricRecord::Gauge { name, .. }
            | MetricRecord::MonotonicCount { name, .. }
            | MetricRecord::ServiceCheck { name, .. } => name,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            MetricRecord::Gauge { tags, .. }
            | MetricRecord::MonotonicCount { tags, .. }
            | MetricRecord::ServiceCheck { tags, .. } => tags,
        }
    }

    /// Numeric value, `None` for service checks.
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricRecord::Gauge { value, .. } | MetricRecord::MonotonicCount { value, .. } => {
                Some(*value)
            }
            MetricRecord::ServiceCheck { .. } => None,
        }
    }

    pub fn is_service_check(&self) -> bool {
        matches!(self, MetricRecord::ServiceCheck { .. })
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricRecord::Gauge { name, value, tags } => {
                write!(f, "gauge {name} {value}")?;
                write_tags(f, tags)
            }
            MetricRecord::MonotonicCount { name, value, tags } => {
                write!(f, "monotonic_count {name} {value}")?;
                write_tags(f, tags)
            }
            MetricRecord::ServiceCheck {
                name,
                status,
                tags,
                message,
            } => {
                write!(f, "service_check {name} {status}")?;
                write_tags(f, tags)?;
                if let Some(message) = message {
                    write!(f, " \"{message}\"")?;
                }
                Ok(())
            }
        }
    }
}

fn write_tags(f: &mut fmt::Formatter<'_>, tags: &[String]) -> fmt::Result {
    if tags.is_empty() {
        Ok(())
    } else {
        write!(f, " [{}]", tags.join(","))
    }
}

/// A sink that keeps every emission in memory, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Vec<MetricRecord>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Drain the recorded emissions, leaving the sink empty.
    pub fn take(&mut self) -> Vec<MetricRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records that are metrics (gauges and counters), excluding service checks.
    pub fn metrics(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(|r| !r.is_service_check())
    }

    pub fn service_checks(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(|r| r.is_service_check())
    }

    /// All records with the given name.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetricRecord> + 'a {
        self.records.iter().filter(move |r| r.name() == name)
    }

    /// Value of the first metric with the given name.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.named(name).find_map(MetricRecord::value)
    }
}

impl MetricsSink for RecordingSink {
    fn gauge(&mut self, name: &str, value: f64, tags: &[String]) {
        self.records.push(MetricRecord::Gauge {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
        });
    }

    fn monotonic_count(&mut self, name: &str, value: f64, tags: &[String]) {
        self.records.push(MetricRecord::MonotonicCount {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
        });
    }

    fn service_check(
        &mut self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        message: Option<&str>,
    ) {
        self.records.push(MetricRecord::ServiceCheck {
            name: name.to_string(),
            status,
            tags: tags.to_vec(),
            message: message.map(str::to_string),
        });
    }
}
