//! Raw container resource usage records and their flattened metric form.
//!
//! The container runtime reports usage as one nested JSON document per reading
//! (see [`Stats`]). Sinks consume flat, dotted metric names instead, so every record
//! is translated into a list of [`Sample`]s by [`Stats::samples`].
//!
//! # Naming contract
//!
//! Metric names are stable and may be used by sink templates:
//!
//! - `Network.*` — receive/transmit counters summed over all interfaces.
//! - `MemoryStats.*` and `MemoryStats.Stats.*` — usage, limits and the cgroup memory breakdown.
//! - `CPUStats.*` — CPU time counters, one `CPUStats.CPUUsage.PercpuUsage.<n>` per core,
//!   and CFS throttling data.

mod cpu;
mod memory;
mod net;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

pub use cpu::{CpuStats, CpuUsage, ThrottlingData};
pub use memory::{MemoryBreakdown, MemoryStats};
pub use net::NetworkStats;

/// The kind of a metric as understood by sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A point-in-time reading (gauge-like).
    Sample,
    /// A monotonic increment.
    Count,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Sample => "sample",
            Kind::Count => "count",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single flattened metric reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: Cow<'static, str>,
    pub value: u64,
}

impl Sample {
    pub(crate) fn new(name: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One resource usage reading of a container, as streamed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Stats {
    /// Per-interface network counters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: HashMap<String, NetworkStats>,
    /// Single network object reported by old API versions.
    #[serde(default)]
    pub network: Option<NetworkStats>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_stats: MemoryStats,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpu_stats: CpuStats,
}

impl Stats {
    /// Returns the network counters summed over all interfaces.
    pub fn network(&self) -> NetworkStats {
        if self.networks.is_empty() {
            return self.network.clone().unwrap_or_default();
        }

        let mut total = NetworkStats::default();
        for iface in self.networks.values() {
            total += iface.clone();
        }
        total
    }

    /// Translates this record into the full set of flattened samples.
    ///
    /// Samples are ordered network, memory, CPU; per-core CPU usage keeps the core order.
    pub fn samples(&self) -> Vec<Sample> {
        let mut out = Vec::with_capacity(64 + self.cpu_stats.cpu_usage.percpu_usage.len());
        self.network().push_samples(&mut out);
        self.memory_stats.push_samples(&mut out);
        self.cpu_stats.push_samples(&mut out);
        out
    }
}

/// Deserializes `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
