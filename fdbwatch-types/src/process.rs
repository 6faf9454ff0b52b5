//! Per-process section of the status document (`cluster.processes.*`).

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::lenient;
use crate::{HzCounter, Roles};

/// One `fdbserver` process.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Process {
    /// `ip:port` of the process. Processes without an address are not reported.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub cpu: Option<Cpu>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub disk: Option<Disk>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub memory: Option<Memory>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub network: Option<Network>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub locality: Option<Locality>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub roles: Option<Roles>,
}

impl Process {
    /// Number of role entries this process lists, zero when `roles` is absent.
    pub fn role_count(&self) -> usize {
        self.roles.as_ref().map_or(0, Roles::listed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Cpu {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub usage_cores: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Disk {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub free_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub total_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub reads: Option<DiskActivity>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub writes: Option<DiskActivity>,
}

/// Disk read or write activity.
///
/// Current tools report the total as `counter`, older ones as `count`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct DiskActivity {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub hz: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub counter: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub count: Option<f64>,
}

impl DiskActivity {
    /// Cumulative number of operations, whichever spelling was reported.
    pub fn total(&self) -> Option<f64> {
        self.counter.or(self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Memory {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub available_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub limit_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub unused_allocated_memory: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub used_bytes: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Network {
    /// Accepted as a plain number or as `{"value": n}`.
    #[serde(default, deserialize_with = "scalar_or_value")]
    pub current_connections: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub connection_errors: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub connections_closed: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub connections_established: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub megabits_received: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub megabits_sent: Option<HzCounter>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub tls_policy_failures: Option<HzCounter>,
}

impl Network {
    /// The rate-counter fields in reporting order, paired with their names.
    pub fn hz_counters(&self) -> [(&'static str, Option<HzCounter>); 6] {
        [
            ("connection_errors", self.connection_errors),
            ("connections_closed", self.connections_closed),
            ("connections_established", self.connections_established),
            ("megabits_received", self.megabits_received),
            ("megabits_sent", self.megabits_sent),
            ("tls_policy_failures", self.tls_policy_failures),
        ]
    }
}

/// Placement of a process, used for tagging.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Locality {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub machineid: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub processid: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub zoneid: Option<String>,
}

fn scalar_or_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::Object(fields) => fields.get("value").and_then(Value::as_f64),
        _ => None,
    };
    if number.is_none() {
        warn!(
            found = lenient::kind(&value),
            "ignoring network.current_connections with unexpected shape"
        );
    }
    Ok(number)
}
