//! Cluster-wide section of the status document.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::lenient;
use crate::{HzCounter, Keyed, Lag, Process};

/// The `cluster` object.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Cluster {
    /// Machines keyed by machine id.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub machines: Option<Keyed<Machine>>,

    /// Processes keyed by process id. Iteration order is the key order.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub processes: Option<Keyed<Process>>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub data: Option<ClusterData>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub datacenter_lag: Option<Lag>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub workload: Option<Workload>,

    /// Probe latencies in seconds, keyed by probe name.
    #[serde(default, deserialize_with = "lenient::map")]
    pub latency_probe: Option<BTreeMap<String, f64>>,

    #[serde(default, deserialize_with = "lenient::optional")]
    pub degraded_processes: Option<f64>,
}

impl Cluster {
    pub fn machine_count(&self) -> Option<usize> {
        self.machines.as_ref().map(Keyed::len)
    }

    pub fn process_count(&self) -> Option<usize> {
        self.processes.as_ref().map(Keyed::len)
    }

    /// Total number of role entries across all processes, `None` without `processes`.
    pub fn instance_count(&self) -> Option<usize> {
        self.processes
            .as_ref()
            .map(|processes| processes.values().map(Process::role_count).sum())
    }

    /// True when the cluster reports at least one degraded process.
    pub fn is_degraded(&self) -> bool {
        self.degraded_processes.is_some_and(|count| count > 0.0)
    }
}

/// A machine entry. Only its presence is used; the fields are kept for logging.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Machine {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub excluded: Option<bool>,
}

/// The `cluster.data` object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct ClusterData {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub system_kv_size_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub total_disk_used_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub total_kv_size_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub least_operating_space_bytes_log_server: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub moving_data: Option<MovingData>,
}

impl ClusterData {
    pub fn gauges(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("system_kv_size_bytes", self.system_kv_size_bytes),
            ("total_disk_used_bytes", self.total_disk_used_bytes),
            ("total_kv_size_bytes", self.total_kv_size_bytes),
            (
                "least_operating_space_bytes_log_server",
                self.least_operating_space_bytes_log_server,
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct MovingData {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub in_flight_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub in_queue_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub total_written_bytes: Option<f64>,
}

/// The `cluster.workload` object.
///
/// Both breakdowns are open-ended: every key whose value is a rate-counter is kept.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Workload {
    #[serde(default, deserialize_with = "lenient::map")]
    pub transactions: Option<BTreeMap<String, HzCounter>>,
    #[serde(default, deserialize_with = "lenient::map")]
    pub operations: Option<BTreeMap<String, HzCounter>>,
}
