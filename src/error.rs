//! Error types for trace analysis
//!
//! Classification is total over arbitrary text, so the only failures are at
//! the edges: reading the trace and writing the report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by an analysis run or a report write
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The trace could not be opened or read. Aborts the run; any partial
    /// aggregate is discarded.
    #[error("Failed to open trace file {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report could not be written. The in-memory report stays valid.
    #[error("Failed to write report to {}: {source}", path.display())]
    SinkFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalyzerError {
    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sink_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkFailure {
            path: path.into(),
            source,
        }
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
