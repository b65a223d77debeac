//! Line classifier
//!
//! Applies every detector family to one trace line and reports what matched.
//! Classification is a pure function of the line text and the thresholds; it
//! never fails, and text that does not parse is simply a non-match.
//!
//! Families run independently, in this order (which is also the order of the
//! findings they emit):
//!
//! 1. File-operation verbs (plus `file-not-found`)
//! 2. Permission denied
//! 3. Network timeout (`EAGAIN` included)
//! 4. Network-operation verbs
//! 5. GitLab domain patterns (plus slow query / git / worker sub-checks)
//! 6. Performance bottlenecks (slow syscall, CPU, memory, heavy I/O, failures)

use crate::catalog::{DomainPattern, FileOperation, NetworkOperation, PatternGroup};
use crate::config::DetectorThresholds;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static ELAPSED_SECONDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<(\d+\.\d+)>").ok());

static ELAPSED_MS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)ms\b").ok());

static CPU_PERCENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").ok());

static PROCESS_BRACKET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9_.:/\-]+)\]").ok());

static PROCESS_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][\w.\-]*):").ok());

// Optional `strace -f` pid prefix: `[pid 123] ` or `123 `
static DISK_IO_CALL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:\[pid\s+\d+\]\s+|\d+\s+)?(?:read|write|pread(?:64)?|pwrite(?:64)?|readv|writev)\(")
        .ok()
});

static NETWORK_IO_CALL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:\[pid\s+\d+\]\s+|\d+\s+)?(?:send|recv|sendto|recvfrom)\(").ok()
});

static RETURN_BYTES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"=\s*(\d+)(?:\s+<\d+(?:\.\d+)?>)?\s*$").ok());

/// Kind of a reported finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    FileNotFound,
    PermissionDenied,
    NetworkTimeout,
    SlowDatabaseQuery,
    GitPerformance,
    ProcessIssue,
    SlowSyscall,
    HighCpuUsage,
    MemoryIssue,
    HeavyDiskIo,
    HeavyNetworkIo,
    FrequentFailures,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileNotFound => "file-not-found",
            Self::PermissionDenied => "permission-denied",
            Self::NetworkTimeout => "network-timeout",
            Self::SlowDatabaseQuery => "slow-database-query",
            Self::GitPerformance => "git-performance",
            Self::ProcessIssue => "process-issue",
            Self::SlowSyscall => "slow-syscall",
            Self::HighCpuUsage => "high-cpu-usage",
            Self::MemoryIssue => "memory-issue",
            Self::HeavyDiskIo => "heavy-disk-io",
            Self::HeavyNetworkIo => "heavy-network-io",
            Self::FrequentFailures => "frequent-failures",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding produced by one detector for one line
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: IssueKind,
    pub description: String,
}

impl Finding {
    fn new(kind: IssueKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

/// Everything the detectors found on one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Blank or comment line; no detector ran
    pub skipped: bool,
    pub file_operation: Option<FileOperation>,
    pub network_operation: Option<NetworkOperation>,
    pub permission_denied: bool,
    pub network_timeout: bool,
    pub domain_pattern: Option<DomainPattern>,
    /// Elapsed seconds of a slow syscall
    pub slow_syscall: Option<f64>,
    /// Process flagged for high CPU usage
    pub high_cpu_process: Option<String>,
    pub memory_issue: bool,
    /// Byte count of a heavy disk read/write
    pub heavy_disk_io: Option<u64>,
    /// Byte count of a heavy send/recv
    pub heavy_network_io: Option<u64>,
    /// Findings in detector evaluation order
    pub findings: Vec<Finding>,
}

impl Classification {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn push(&mut self, kind: IssueKind, description: impl Into<String>) {
        self.findings.push(Finding::new(kind, description));
    }
}

/// Whether a line is skipped entirely: blank or a `#` comment after trimming
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Line classifier configured with detector thresholds
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: DetectorThresholds,
}

impl Classifier {
    pub fn new(thresholds: DetectorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DetectorThresholds {
        &self.thresholds
    }

    /// Classify one line of trace output
    pub fn classify(&self, line: &str) -> Classification {
        if is_skippable(line) {
            return Classification::skipped();
        }
        let line = line.trim();
        let lower = line.to_ascii_lowercase();

        let mut result = Classification::default();
        self.detect_file_operation(line, &mut result);
        self.detect_permission_denied(line, &mut result);
        self.detect_network_timeout(line, &mut result);
        result.network_operation = NetworkOperation::detect(line);
        self.detect_domain_pattern(line, &lower, &mut result);
        self.detect_performance(line, &mut result);
        result
    }

    fn detect_file_operation(&self, line: &str, result: &mut Classification) {
        result.file_operation = FileOperation::detect(line);
        if result.file_operation.is_some()
            && (line.contains("ENOENT") || line.contains("No such file"))
        {
            result.push(IssueKind::FileNotFound, "File not found");
        }
    }

    fn detect_permission_denied(&self, line: &str, result: &mut Classification) {
        if line.contains("EACCES") || line.contains("Permission denied") {
            result.permission_denied = true;
            result.push(IssueKind::PermissionDenied, "Permission denied");
        }
    }

    // EAGAIN also signals a non-blocking retry; it is counted as a timeout regardless.
    fn detect_network_timeout(&self, line: &str, result: &mut Classification) {
        let timed_out = [
            "ETIMEDOUT",
            "Connection timed out",
            "EAGAIN",
            "Resource temporarily unavailable",
        ]
        .iter()
        .any(|marker| line.contains(marker));
        if timed_out {
            result.network_timeout = true;
            result.push(IssueKind::NetworkTimeout, "Network timeout detected");
        }
    }

    fn detect_domain_pattern(&self, line: &str, lower: &str, result: &mut Classification) {
        let Some(pattern) = DomainPattern::detect(line) else {
            return;
        };
        result.domain_pattern = Some(pattern);

        match pattern.group() {
            PatternGroup::Database => {
                if lower.contains("slow query") || self.has_slow_query_time(line) {
                    result.push(IssueKind::SlowDatabaseQuery, "Slow database query detected");
                }
            }
            PatternGroup::VersionControl => {
                if lower.contains("pack-objects") || lower.contains("receiving objects") {
                    result.push(
                        IssueKind::GitPerformance,
                        "Git performance issue detected (large object transfer)",
                    );
                }
            }
            PatternGroup::WorkerProcess => {
                if ["timeout", "killed", "segfault"]
                    .iter()
                    .any(|marker| lower.contains(marker))
                {
                    result.push(
                        IssueKind::ProcessIssue,
                        format!("{} process issue detected", pattern.label()),
                    );
                }
            }
            _ => {}
        }
    }

    fn has_slow_query_time(&self, line: &str) -> bool {
        let Some(re) = ELAPSED_MS.as_ref() else {
            return false;
        };
        re.captures_iter(line)
            .filter_map(|caps| caps[1].parse::<f64>().ok())
            .any(|ms| ms > self.thresholds.slow_query_ms)
    }

    fn detect_performance(&self, line: &str, result: &mut Classification) {
        self.detect_slow_syscall(line, result);
        self.detect_high_cpu(line, result);

        if line.contains("ENOMEM")
            || line.contains("Out of memory")
            || (line.contains("mmap") && line.contains("failed"))
        {
            result.memory_issue = true;
            result.push(IssueKind::MemoryIssue, "Memory allocation issue detected");
        }

        if matches_call(&DISK_IO_CALL, line) {
            if let Some(bytes) = self.heavy_transfer(line) {
                result.heavy_disk_io = Some(bytes);
                result.push(
                    IssueKind::HeavyDiskIo,
                    format!("Heavy disk I/O: {} bytes", bytes),
                );
            }
        }

        if matches_call(&NETWORK_IO_CALL, line) {
            if let Some(bytes) = self.heavy_transfer(line) {
                result.heavy_network_io = Some(bytes);
                result.push(
                    IssueKind::HeavyNetworkIo,
                    format!("Heavy network I/O: {} bytes", bytes),
                );
            }
        }

        if line.contains("= -1")
            && ["EBUSY", "EAGAIN", "EWOULDBLOCK"]
                .iter()
                .any(|errno| line.contains(errno))
        {
            result.push(
                IssueKind::FrequentFailures,
                "Syscall failed with a busy/retry error (EBUSY/EAGAIN/EWOULDBLOCK)",
            );
        }
    }

    fn detect_slow_syscall(&self, line: &str, result: &mut Classification) {
        let Some(re) = ELAPSED_SECONDS.as_ref() else {
            return;
        };
        // strace -T appends the elapsed time last
        let elapsed = re
            .captures_iter(line)
            .last()
            .and_then(|caps| caps[1].parse::<f64>().ok());

        if let Some(seconds) = elapsed.filter(|s| *s > self.thresholds.slow_syscall_seconds) {
            result.slow_syscall = Some(seconds);
            result.push(
                IssueKind::SlowSyscall,
                format!("Slow syscall: {} took {}s", syscall_name(line), seconds),
            );
        }
    }

    fn detect_high_cpu(&self, line: &str, result: &mut Classification) {
        if !line.contains("CPU") {
            return;
        }
        let Some(re) = CPU_PERCENT.as_ref() else {
            return;
        };
        let percent = re
            .captures_iter(line)
            .filter_map(|caps| caps[1].parse::<f64>().ok())
            .find(|pct| *pct > self.thresholds.high_cpu_percent);

        if let Some(percent) = percent {
            let process = process_name(line);
            result.push(
                IssueKind::HighCpuUsage,
                format!("High CPU usage: {} at {}%", process, percent),
            );
            result.high_cpu_process = Some(process);
        }
    }

    /// Trailing `= <bytes>` return value when it exceeds the heavy-I/O threshold
    fn heavy_transfer(&self, line: &str) -> Option<u64> {
        if !line.contains('=') {
            return None;
        }
        RETURN_BYTES
            .as_ref()?
            .captures(line)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .filter(|bytes| *bytes > self.thresholds.heavy_io_bytes)
    }
}

fn matches_call(regex: &LazyLock<Option<Regex>>, line: &str) -> bool {
    regex.as_ref().is_some_and(|re| re.is_match(line))
}

/// Classify with default thresholds
pub fn classify(line: &str) -> Classification {
    Classifier::default().classify(line)
}

/// Syscall name: the last token before the first `(`
pub fn syscall_name(line: &str) -> &str {
    line.split('(')
        .next()
        .and_then(|head| head.split_whitespace().last())
        .unwrap_or("unknown")
}

/// Process name from `[name]` or a leading `name:`, else "unknown"
pub fn process_name(line: &str) -> String {
    let bracketed = PROCESS_BRACKET
        .as_ref()
        .and_then(|re| re.captures(line))
        .map(|caps| caps[1].to_string());

    bracketed
        .or_else(|| {
            PROCESS_PREFIX
                .as_ref()
                .and_then(|re| re.captures(line))
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
