//! Running statistics and issue list for one analysis run
//!
//! The aggregator is owned by the run that feeds it; there is no shared or
//! global state, so independent analyses can run side by side. Counters only
//! grow. Partial aggregates from consecutive chunks combine with
//! [`Aggregator::merge`].

use crate::catalog::{DomainPattern, PatternGroup};
use crate::classifier::{Classification, IssueKind};
use crate::source::TraceLine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A reportable finding tied to one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub line_number: usize,
    /// Trimmed line text
    pub line: String,
    pub description: String,
}

/// Performance counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub slow_syscalls: u64,
    /// Distinct process names, in first-seen order
    pub high_cpu_processes: Vec<String>,
    pub memory_issues: u64,
    pub disk_io_heavy: u64,
    pub network_heavy: u64,
}

impl PerformanceMetrics {
    fn note_high_cpu(&mut self, process: &str) {
        if !self.high_cpu_processes.iter().any(|p| p == process) {
            self.high_cpu_processes.push(process.to_string());
        }
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_lines: u64,
    pub file_operations: u64,
    pub network_operations: u64,
    pub permission_denied: u64,
    pub network_timeouts: u64,
    /// Occurrences per domain pattern; absent means zero
    pub gitlab_patterns: BTreeMap<DomainPattern, u64>,
    pub performance_metrics: PerformanceMetrics,
}

impl Stats {
    /// Count for one pattern, zero when never seen
    pub fn pattern_count(&self, pattern: DomainPattern) -> u64 {
        self.gitlab_patterns.get(&pattern).copied().unwrap_or(0)
    }

    /// Summed count over every pattern in `group`
    pub fn group_count(&self, group: PatternGroup) -> u64 {
        self.gitlab_patterns
            .iter()
            .filter(|(pattern, _)| pattern.group() == group)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Snapshot of an aggregator: stats plus the issues found so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub stats: Stats,
    pub issues: Vec<Issue>,
}

/// Accumulates classifications into [`Stats`] and [`Issue`]s
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: Stats,
    issues: Vec<Issue>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one line's classification
    ///
    /// Every line counts toward `total_lines`, skipped or not.
    pub fn record(&mut self, line: &TraceLine, classification: Classification) {
        let stats = &mut self.stats;
        stats.total_lines += 1;

        if classification.skipped {
            return;
        }

        if classification.file_operation.is_some() {
            stats.file_operations += 1;
        }
        if classification.network_operation.is_some() {
            stats.network_operations += 1;
        }
        if classification.permission_denied {
            stats.permission_denied += 1;
        }
        if classification.network_timeout {
            stats.network_timeouts += 1;
        }
        if let Some(pattern) = classification.domain_pattern {
            *stats.gitlab_patterns.entry(pattern).or_insert(0) += 1;
        }

        let perf = &mut stats.performance_metrics;
        if classification.slow_syscall.is_some() {
            perf.slow_syscalls += 1;
        }
        if let Some(process) = &classification.high_cpu_process {
            perf.note_high_cpu(process);
        }
        if classification.memory_issue {
            perf.memory_issues += 1;
        }
        if classification.heavy_disk_io.is_some() {
            perf.disk_io_heavy += 1;
        }
        if classification.heavy_network_io.is_some() {
            perf.network_heavy += 1;
        }

        if !classification.findings.is_empty() {
            let text = line.text.trim();
            self.issues
                .extend(classification.findings.into_iter().map(|finding| Issue {
                    kind: finding.kind,
                    line_number: line.number,
                    line: text.to_string(),
                    description: finding.description,
                }));
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Deep copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stats: self.stats.clone(),
            issues: self.issues.clone(),
        }
    }

    /// Consume the aggregator without copying
    pub fn finish(self) -> Snapshot {
        Snapshot {
            stats: self.stats,
            issues: self.issues,
        }
    }

    /// Fold in a partial aggregate from a later chunk of the same trace
    ///
    /// Line numbers must already be global. Counters add, high-CPU names
    /// append in first-seen order, and issues are re-sorted (stably) by line
    /// number.
    pub fn merge(&mut self, other: Aggregator) {
        let stats = &mut self.stats;
        let theirs = other.stats;

        stats.total_lines += theirs.total_lines;
        stats.file_operations += theirs.file_operations;
        stats.network_operations += theirs.network_operations;
        stats.permission_denied += theirs.permission_denied;
        stats.network_timeouts += theirs.network_timeouts;
        for (pattern, count) in theirs.gitlab_patterns {
            *stats.gitlab_patterns.entry(pattern).or_insert(0) += count;
        }

        let perf = &mut stats.performance_metrics;
        let their_perf = theirs.performance_metrics;
        perf.slow_syscalls += their_perf.slow_syscalls;
        perf.memory_issues += their_perf.memory_issues;
        perf.disk_io_heavy += their_perf.disk_io_heavy;
        perf.network_heavy += their_perf.network_heavy;
        for process in &their_perf.high_cpu_processes {
            perf.note_high_cpu(process);
        }

        self.issues.extend(other.issues);
        self.issues.sort_by_key(|issue| issue.line_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    fn feed(aggregator: &mut Aggregator, number: usize, text: &str) {
        let line = TraceLine::new(number, text);
        aggregator.record(&line, classify(text));
    }

    fn run(lines: &[&str]) -> Aggregator {
        let mut aggregator = Aggregator::new();
        for (i, text) in lines.iter().enumerate() {
            feed(&mut aggregator, i + 1, text);
        }
        aggregator
    }

    #[test]
    fn test_single_open() {
        let agg = run(&["open(\"/etc/passwd\", O_RDONLY) = 3"]);
        assert_eq!(agg.stats().total_lines, 1);
        assert_eq!(agg.stats().file_operations, 1);
        assert!(agg.issues().is_empty());
    }

    #[test]
    fn test_skipped_lines_count_toward_total() {
        let agg = run(&["", "# comment", "   ", "#", "open(\"/etc/passwd\", O_RDONLY) = 3"]);
        assert_eq!(agg.stats().total_lines, 5);
        assert_eq!(agg.stats().file_operations, 1);
    }

    #[test]
    fn test_permission_denied_issue() {
        let agg = run(&["open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)"]);
        assert_eq!(agg.stats().permission_denied, 1);
        assert_eq!(agg.issues().len(), 1);
        let issue = &agg.issues()[0];
        assert_eq!(issue.kind, IssueKind::PermissionDenied);
        assert_eq!(issue.line_number, 1);
        assert_eq!(
            issue.line,
            "open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)"
        );
    }

    #[test]
    fn test_issue_line_text_is_trimmed() {
        let agg = run(&["   read(3, \"\", 1) = -1 EBUSY (busy)   "]);
        assert_eq!(agg.issues()[0].line, "read(3, \"\", 1) = -1 EBUSY (busy)");
    }

    #[test]
    fn test_heavy_disk_io_counter() {
        let agg = run(&["read(3, \"large_data_chunk\", 2097152) = 2097152"]);
        assert_eq!(agg.stats().performance_metrics.disk_io_heavy, 1);
        assert_eq!(agg.issues()[0].kind, IssueKind::HeavyDiskIo);
        assert!(agg.issues()[0].description.contains("2097152"));
    }

    #[test]
    fn test_pattern_counts_and_groups() {
        let agg = run(&[
            "open(\"/var/opt/gitlab/postgresql/data/base/1\", O_RDONLY) = 3",
            "open(\"/var/opt/gitlab/postgresql/data/base/2\", O_RDONLY) = 4",
            "sendto(5, \"SELECT 1\", 8, 0, NULL, 0) = 8",
            "connect(3, {sa_family=AF_UNIX, sun_path=\"/var/opt/gitlab/redis/redis.socket\"}, 32) = 0",
        ]);
        let stats = agg.stats();
        assert_eq!(stats.pattern_count(DomainPattern::Postgresql), 2);
        assert_eq!(stats.pattern_count(DomainPattern::DatabaseQuery), 1);
        assert_eq!(stats.pattern_count(DomainPattern::Sidekiq), 0);
        assert_eq!(stats.group_count(PatternGroup::Database), 3);
        assert_eq!(stats.group_count(PatternGroup::Cache), 1);
        assert_eq!(stats.group_count(PatternGroup::VersionControl), 0);
    }

    #[test]
    fn test_high_cpu_processes_deduplicated_in_order() {
        let agg = run(&[
            "[sidekiq] CPU 95%",
            "[unicorn] CPU 91%",
            "[sidekiq] CPU 99%",
        ]);
        assert_eq!(
            agg.stats().performance_metrics.high_cpu_processes,
            vec!["sidekiq".to_string(), "unicorn".to_string()]
        );
        // Every line still reports an issue
        let cpu_issues = agg
            .issues()
            .iter()
            .filter(|i| i.kind == IssueKind::HighCpuUsage)
            .count();
        assert_eq!(cpu_issues, 3);
    }

    #[test]
    fn test_issues_in_discovery_order() {
        let agg = run(&[
            "open(\"/x\", O_RDONLY) = -1 EACCES (Permission denied) ENOENT",
            "read(3, \"\", 1024) = -1 EBUSY (Device or resource busy)",
        ]);
        let summary: Vec<_> = agg
            .issues()
            .iter()
            .map(|i| (i.line_number, i.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, IssueKind::FileNotFound),
                (1, IssueKind::PermissionDenied),
                (2, IssueKind::FrequentFailures),
            ]
        );
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut agg = run(&["open(\"/etc/passwd\", O_RDONLY) = 3"]);
        let snapshot = agg.snapshot();
        feed(&mut agg, 2, "close(3) = 0");
        assert_eq!(snapshot.stats.file_operations, 1);
        assert_eq!(agg.stats().file_operations, 2);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let lines = [
            "open(\"/var/opt/gitlab/postgresql/x\", O_RDONLY) = -1 ENOENT (No such file or directory)",
            "[sidekiq] CPU 95%",
            "recv(3, \"\", 1024, 0) = -1 EAGAIN (Resource temporarily unavailable)",
            "",
            "read(3, \"\", 2097152) = 2097152 <1.5>",
            "[unicorn] CPU 91%",
            "[sidekiq] CPU 92%",
        ];
        let whole = run(&lines);

        let mut first = Aggregator::new();
        let mut second = Aggregator::new();
        for (i, text) in lines.iter().enumerate() {
            let target = if i < 3 { &mut first } else { &mut second };
            feed(target, i + 1, text);
        }
        first.merge(second);

        assert_eq!(first.snapshot(), whole.snapshot());
    }

    #[test]
    fn test_merge_out_of_order_chunk_resorts_issues() {
        let mut later = Aggregator::new();
        feed(&mut later, 2, "read(3, \"\", 1024) = -1 EBUSY (busy)");
        let mut earlier = Aggregator::new();
        feed(&mut earlier, 1, "open(\"/root/x\", O_RDONLY) = -1 EACCES (Permission denied)");

        later.merge(earlier);
        let numbers: Vec<_> = later.issues().iter().map(|i| i.line_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(later.stats().total_lines, 2);
    }

    #[test]
    fn test_stats_json_field_names() {
        let agg = run(&["open(\"/var/opt/gitlab/redis/dump.rdb\", O_RDONLY) = 3"]);
        let value = serde_json::to_value(agg.stats()).unwrap();
        for key in [
            "total_lines",
            "file_operations",
            "network_operations",
            "permission_denied",
            "network_timeouts",
            "gitlab_patterns",
            "performance_metrics",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["gitlab_patterns"]["redis"], 1);
        let perf = &value["performance_metrics"];
        for key in [
            "slow_syscalls",
            "high_cpu_processes",
            "memory_issues",
            "disk_io_heavy",
            "network_heavy",
        ] {
            assert!(perf.get(key).is_some(), "missing performance_metrics.{}", key);
        }
        assert!(perf["high_cpu_processes"].is_array());
    }

    #[test]
    fn test_issue_json_shape() {
        let agg = run(&["open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)"]);
        let value = serde_json::to_value(&agg.issues()[0]).unwrap();
        assert_eq!(value["type"], "permission-denied");
        assert_eq!(value["line_number"], 1);
        assert_eq!(value["description"], "Permission denied");
    }
}
