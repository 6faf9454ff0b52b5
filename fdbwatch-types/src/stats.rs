//! Small value shapes that appear throughout the status document.

use serde::Deserialize;

use crate::lenient;

/// A live rate paired with a cumulative total, e.g. `{"hz": 12.5, "counter": 80211}`.
///
/// Both halves are independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct HzCounter {
    /// Instantaneous rate, per second.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub hz: Option<f64>,

    /// Monotonically increasing total.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub counter: Option<f64>,
}

impl HzCounter {
    pub fn is_empty(&self) -> bool {
        self.hz.is_none() && self.counter.is_none()
    }
}

/// Latency distribution reported by a role, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct LatencyStatistics {
    /// Number of samples; cumulative.
    #[serde(default, deserialize_with = "lenient::optional")]
    pub count: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub p25: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub p50: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub p90: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub p99: Option<f64>,
}

impl LatencyStatistics {
    /// The six distribution gauges in reporting order, paired with their names.
    pub fn gauges(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("min", self.min),
            ("max", self.max),
            ("p25", self.p25),
            ("p50", self.p50),
            ("p90", self.p90),
            ("p99", self.p99),
        ]
    }
}

/// Replication or durability lag, e.g. `{"seconds": 0.5, "versions": 500000}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Lag {
    #[serde(default, deserialize_with = "lenient::optional")]
    pub seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub versions: Option<f64>,
}
