//! GitLab Strace Analyzer - categorized diagnostics from captured strace output
//!
//! This library scans strace output one line at a time, applies an ordered
//! set of detectors (file and network operations, error conditions, GitLab
//! component patterns, performance bottlenecks), and assembles a report with
//! counts, per-line issues, and threshold-based recommendations.
//!
//! # Example
//!
//! ```
//! use gitlab_strace_analyzer::{analyzer::analyze, source::numbered};
//!
//! # fn main() -> anyhow::Result<()> {
//! let report = analyze(numbered([
//!     "open(\"/etc/passwd\", O_RDONLY) = 3",
//!     "open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)",
//! ]))?;
//!
//! assert_eq!(report.summary.file_operations, 2);
//! assert_eq!(report.summary.permission_denied, 1);
//! assert_eq!(report.issues.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod catalog;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod recommendations;
pub mod report;
pub mod source;

pub use error::{AnalyzerError, Result};
