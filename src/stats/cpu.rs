use serde::Deserialize;

use super::{Sample, null_as_default};

/// CPU accounting of a container.
///
/// All time values are reported by the runtime in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CpuStats {
    #[serde(deserialize_with = "null_as_default")]
    pub cpu_usage: CpuUsage,
    /// Host-wide CPU time, used by consumers to compute a usage percentage.
    pub system_cpu_usage: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub throttling_data: ThrottlingData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CpuUsage {
    pub total_usage: u64,
    /// Usage per core, indexed by core number. Empty on cgroup v2 hosts.
    #[serde(deserialize_with = "null_as_default")]
    pub percpu_usage: Vec<u64>,
    pub usage_in_kernelmode: u64,
    pub usage_in_usermode: u64,
}

/// CFS throttling counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ThrottlingData {
    pub periods: u64,
    pub throttled_periods: u64,
    pub throttled_time: u64,
}

impl CpuStats {
    pub(super) fn push_samples(&self, out: &mut Vec<Sample>) {
        let usage = &self.cpu_usage;
        out.push(Sample::new("CPUStats.CPUUsage.TotalUsage", usage.total_usage));
        out.push(Sample::new(
            "CPUStats.CPUUsage.UsageInUsermode",
            usage.usage_in_usermode,
        ));
        out.push(Sample::new(
            "CPUStats.CPUUsage.UsageInKernelmode",
            usage.usage_in_kernelmode,
        ));
        for (i, v) in usage.percpu_usage.iter().enumerate() {
            out.push(Sample::new(
                format!("CPUStats.CPUUsage.PercpuUsage.{i}"),
                *v,
            ));
        }
        out.push(Sample::new("CPUStats.SystemCPUUsage", self.system_cpu_usage));

        let throttling = &self.throttling_data;
        out.push(Sample::new(
            "CPUStats.ThrottlingData.Periods",
            throttling.periods,
        ));
        out.push(Sample::new(
            "CPUStats.ThrottlingData.ThrottledPeriods",
            throttling.throttled_periods,
        ));
        out.push(Sample::new(
            "CPUStats.ThrottlingData.ThrottledTime",
            throttling.throttled_time,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_stats() {
        let data = r#"{
            "cpu_usage": {"total_usage": 100, "percpu_usage": [40, 60],
                          "usage_in_kernelmode": 30, "usage_in_usermode": 70},
            "system_cpu_usage": 5000,
            "online_cpus": 2,
            "throttling_data": {"periods": 3, "throttled_periods": 2, "throttled_time": 1}
        }"#;
        let stat: CpuStats = serde_json::from_str(data).unwrap();
        assert_eq!(stat.cpu_usage.total_usage, 100);
        assert_eq!(stat.cpu_usage.percpu_usage, vec![40, 60]);
        assert_eq!(stat.system_cpu_usage, 5000);
        assert_eq!(stat.throttling_data.throttled_periods, 2);
    }

    #[test]
    fn test_samples_without_percpu_usage() {
        let mut out = Vec::new();
        CpuStats::default().push_samples(&mut out);
        let names: Vec<&str> = out.iter().map(|s| &*s.name).collect();
        assert_eq!(
            names,
            vec![
                "CPUStats.CPUUsage.TotalUsage",
                "CPUStats.CPUUsage.UsageInUsermode",
                "CPUStats.CPUUsage.UsageInKernelmode",
                "CPUStats.SystemCPUUsage",
                "CPUStats.ThrottlingData.Periods",
                "CPUStats.ThrottlingData.ThrottledPeriods",
                "CPUStats.ThrottlingData.ThrottledTime",
            ]
        );
    }
}
