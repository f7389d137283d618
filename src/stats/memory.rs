//! Memory usage as reported by the runtime.
//!
//! The top level counters (`usage`, `max_usage`, `limit`, `failcnt`) come from the memory
//! controller itself; [`MemoryBreakdown`] mirrors the cgroup v1 `memory.stat` file. Hosts
//! running cgroup v2 report a different key set, so every breakdown field falls back to zero
//! when absent.

use serde::Deserialize;

use super::{Sample, null_as_default};

/// Memory controller counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    /// Current memory usage in bytes.
    pub usage: u64,
    /// Peak memory usage in bytes.
    pub max_usage: u64,
    /// Memory limit in bytes.
    pub limit: u64,
    /// Number of times the limit was hit.
    pub failcnt: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: MemoryBreakdown,
}

/// The per-category memory breakdown (`memory.stat`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MemoryBreakdown {
    pub cache: u64,
    pub rss: u64,
    pub rss_huge: u64,
    pub mapped_file: u64,
    pub pgfault: u64,
    pub pgmajfault: u64,
    pub pgpgin: u64,
    pub pgpgout: u64,
    pub active_anon: u64,
    pub inactive_anon: u64,
    pub active_file: u64,
    pub inactive_file: u64,
    pub unevictable: u64,
    pub writeback: u64,
    pub hierarchical_memory_limit: u64,

    pub total_cache: u64,
    pub total_rss: u64,
    pub total_rss_huge: u64,
    pub total_mapped_file: u64,
    pub total_pgfault: u64,
    pub total_pgmajfault: u64,
    pub total_pgpgin: u64,
    pub total_pgpgout: u64,
    pub total_active_anon: u64,
    pub total_inactive_anon: u64,
    pub total_active_file: u64,
    pub total_inactive_file: u64,
    pub total_unevictable: u64,
    pub total_writeback: u64,
}

impl MemoryStats {
    pub(super) fn push_samples(&self, out: &mut Vec<Sample>) {
        out.push(Sample::new("MemoryStats.Usage", self.usage));
        out.push(Sample::new("MemoryStats.MaxUsage", self.max_usage));
        out.push(Sample::new("MemoryStats.Limit", self.limit));
        out.push(Sample::new("MemoryStats.Failcnt", self.failcnt));
        self.stats.push_samples(out);
    }
}

impl MemoryBreakdown {
    fn push_samples(&self, out: &mut Vec<Sample>) {
        let fields: [(&'static str, u64); 29] = [
            ("MemoryStats.Stats.Cache", self.cache),
            ("MemoryStats.Stats.Rss", self.rss),
            ("MemoryStats.Stats.RssHuge", self.rss_huge),
            ("MemoryStats.Stats.MappedFile", self.mapped_file),
            ("MemoryStats.Stats.Pgfault", self.pgfault),
            ("MemoryStats.Stats.Pgmajfault", self.pgmajfault),
            ("MemoryStats.Stats.Pgpgin", self.pgpgin),
            ("MemoryStats.Stats.Pgpgout", self.pgpgout),
            ("MemoryStats.Stats.ActiveAnon", self.active_anon),
            ("MemoryStats.Stats.InactiveAnon", self.inactive_anon),
            ("MemoryStats.Stats.ActiveFile", self.active_file),
            ("MemoryStats.Stats.InactiveFile", self.inactive_file),
            ("MemoryStats.Stats.Unevictable", self.unevictable),
            ("MemoryStats.Stats.Writeback", self.writeback),
            (
                "MemoryStats.Stats.HierarchicalMemoryLimit",
                self.hierarchical_memory_limit,
            ),
            ("MemoryStats.Stats.TotalCache", self.total_cache),
            ("MemoryStats.Stats.TotalRss", self.total_rss),
            ("MemoryStats.Stats.TotalRssHuge", self.total_rss_huge),
            ("MemoryStats.Stats.TotalMappedFile", self.total_mapped_file),
            ("MemoryStats.Stats.TotalPgfault", self.total_pgfault),
            ("MemoryStats.Stats.TotalPgmajfault", self.total_pgmajfault),
            ("MemoryStats.Stats.TotalPgpgin", self.total_pgpgin),
            ("MemoryStats.Stats.TotalPgpgout", self.total_pgpgout),
            ("MemoryStats.Stats.TotalActiveAnon", self.total_active_anon),
            ("MemoryStats.Stats.TotalInactiveAnon", self.total_inactive_anon),
            ("MemoryStats.Stats.TotalActiveFile", self.total_active_file),
            ("MemoryStats.Stats.TotalInactiveFile", self.total_inactive_file),
            ("MemoryStats.Stats.TotalUnevictable", self.total_unevictable),
            ("MemoryStats.Stats.TotalWriteback", self.total_writeback),
        ];
        out.extend(
            fields
                .into_iter()
                .map(|(name, value)| Sample::new(name, value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cgroup_v1_breakdown() {
        let data = r#"{
            "usage": 100, "max_usage": 200, "limit": 300, "failcnt": 4,
            "stats": {
                "active_anon": 1, "active_file": 2, "cache": 3, "inactive_anon": 4,
                "inactive_file": 5, "mapped_file": 6, "pgfault": 7, "pgmajfault": 8,
                "pgpgin": 9, "pgpgout": 10, "rss": 11, "rss_huge": 12, "unevictable": 13,
                "writeback": 14, "hierarchical_memory_limit": 15, "total_rss": 16
            }
        }"#;
        let stat: MemoryStats = serde_json::from_str(data).unwrap();
        assert_eq!(stat.failcnt, 4);
        assert_eq!(stat.stats.pgmajfault, 8);
        assert_eq!(stat.stats.hierarchical_memory_limit, 15);
        assert_eq!(stat.stats.total_rss, 16);
        assert_eq!(stat.stats.total_cache, 0);
    }

    #[test]
    fn test_cgroup_v2_keys_fall_back_to_zero() {
        let data = r#"{"usage": 100, "limit": 300, "stats": {"anon": 1, "file": 2}}"#;
        let stat: MemoryStats = serde_json::from_str(data).unwrap();
        assert_eq!(stat.usage, 100);
        assert_eq!(stat.stats, MemoryBreakdown::default());
    }

    #[test]
    fn test_sample_names_are_unique() {
        let mut out = Vec::new();
        MemoryStats::default().push_samples(&mut out);
        let mut names: Vec<_> = out.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), out.len());
        assert_eq!(out.len(), 33);
    }
}
