//! Analyzer thresholds and their TOML configuration
//!
//! Every threshold defaults to the value the analyzer has always used, so an
//! empty (or absent) configuration file changes nothing.
//!
//! # Example analyzer.toml
//!
//! ```toml
//! [detectors]
//! slow_syscall_seconds = 0.5
//! heavy_io_bytes = 4194304
//!
//! [recommendations]
//! permission_denied = 0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Per-line detector thresholds
    pub detectors: DetectorThresholds,
    /// Aggregate thresholds for recommendations
    pub recommendations: RecommendationThresholds,
}

/// Per-line thresholds. All comparisons are strict `>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorThresholds {
    /// Elapsed time in `<secs>` above which a syscall is slow
    pub slow_syscall_seconds: f64,
    /// `<n>ms` above which a database line is a slow query
    pub slow_query_ms: f64,
    /// CPU percentage above which a process is flagged
    pub high_cpu_percent: f64,
    /// Returned byte count above which an I/O call is heavy
    pub heavy_io_bytes: u64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            slow_syscall_seconds: 1.0,
            slow_query_ms: 1000.0,
            high_cpu_percent: 80.0,
            heavy_io_bytes: 1_048_576,
        }
    }
}

/// Aggregate thresholds. A rule fires when the count is strictly greater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendationThresholds {
    pub slow_syscalls: u64,
    pub disk_io_heavy: u64,
    pub network_heavy: u64,
    pub database_activity: u64,
    pub cache_activity: u64,
    pub git_activity: u64,
    pub permission_denied: u64,
    pub network_timeouts: u64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            slow_syscalls: 10,
            disk_io_heavy: 50,
            network_heavy: 20,
            database_activity: 100,
            cache_activity: 50,
            git_activity: 30,
            permission_denied: 5,
            network_timeouts: 3,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// ```no_run
    /// use gitlab_strace_analyzer::config::Config;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::from_file("analyzer.toml")?;
    /// println!("slow syscall: > {}s", config.detectors.slow_syscall_seconds);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }
}
