//! Final analysis report and its renderings
//!
//! A [`Report`] is assembled once from a finished aggregate and never
//! changes afterwards. It renders two ways carrying the same information:
//! structured JSON (field names are a compatibility surface) and a plain
//! section-headed narrative.

use crate::aggregator::{Issue, Snapshot, Stats};
use crate::catalog::DomainPattern;
use crate::config::RecommendationThresholds;
use crate::error::{AnalyzerError, Result};
use crate::recommendations::recommend_with;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const RULE_WIDE: usize = 50;
const RULE_NARROW: usize = 30;

/// Report rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

impl OutputFormat {
    /// File extension used when saving a report
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Immutable result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Stats,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
    pub analysis_timestamp: DateTime<Utc>,
}

impl Report {
    /// Assemble a report stamped with the current time
    pub fn assemble(snapshot: Snapshot, thresholds: &RecommendationThresholds) -> Self {
        Self::assemble_at(snapshot, thresholds, Utc::now())
    }

    /// Assemble a report with an explicit timestamp
    pub fn assemble_at(
        snapshot: Snapshot,
        thresholds: &RecommendationThresholds,
        analysis_timestamp: DateTime<Utc>,
    ) -> Self {
        let recommendations = recommend_with(&snapshot.stats, thresholds);
        Self {
            summary: snapshot.stats,
            issues: snapshot.issues,
            recommendations,
            analysis_timestamp,
        }
    }

    /// Components with at least one occurrence, in catalog order
    pub fn active_components(&self) -> impl Iterator<Item = (DomainPattern, u64)> + '_ {
        self.summary
            .gitlab_patterns
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(pattern, count)| (*pattern, *count))
    }

    /// Structured rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a structured rendering back into a report
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Narrative rendering
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let stats = &self.summary;
        let perf = &stats.performance_metrics;

        out.push_str("GitLab Strace Analysis Report\n");
        out.push_str(&"=".repeat(RULE_WIDE));
        out.push('\n');
        out.push_str(&format!(
            "Generated: {}\n",
            self.analysis_timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        ));

        section(&mut out, "Analysis Summary:");
        out.push_str(&format!("Total lines processed: {}\n", stats.total_lines));
        out.push_str(&format!("File operations: {}\n", stats.file_operations));
        out.push_str(&format!("Network operations: {}\n", stats.network_operations));
        out.push_str(&format!(
            "Permission denied errors: {}\n",
            stats.permission_denied
        ));
        out.push_str(&format!("Network timeouts: {}\n", stats.network_timeouts));

        section(&mut out, "GitLab Components Activity:");
        let mut any_component = false;
        for (pattern, count) in self.active_components() {
            any_component = true;
            out.push_str(&format!("{} ({}): {}\n", pattern.label(), pattern, count));
        }
        if !any_component {
            out.push_str("No GitLab component activity detected\n");
        }

        section(&mut out, "Performance Metrics:");
        out.push_str(&format!("Slow syscalls: {}\n", perf.slow_syscalls));
        let high_cpu = if perf.high_cpu_processes.is_empty() {
            "none".to_string()
        } else {
            perf.high_cpu_processes.join(", ")
        };
        out.push_str(&format!("High CPU processes: {}\n", high_cpu));
        out.push_str(&format!("Memory issues: {}\n", perf.memory_issues));
        out.push_str(&format!(
            "Heavy disk I/O operations: {}\n",
            perf.disk_io_heavy
        ));
        out.push_str(&format!(
            "Heavy network I/O operations: {}\n",
            perf.network_heavy
        ));

        section(&mut out, &format!("Issues Found: ({})", self.issues.len()));
        if self.issues.is_empty() {
            out.push_str("No issues found\n");
        }
        for issue in &self.issues {
            out.push_str(&format!(
                "Line {} [{}]: {}\n",
                issue.line_number, issue.kind, issue.description
            ));
            out.push_str(&format!("  {}\n", issue.line));
        }

        section(&mut out, "Recommendations:");
        for (i, rec) in self.recommendations.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, rec));
        }

        out
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => self.to_json(),
        }
    }

    /// Write the report next to `base`, appending the format's extension
    /// unless `base` already carries it. Returns the path written.
    pub fn save(&self, format: OutputFormat, base: &Path) -> Result<PathBuf> {
        let path = report_path(base, format);
        let content = self
            .render(format)
            .map_err(|e| AnalyzerError::sink_failure(&path, e.into()))?;

        fs::write(&path, content).map_err(|e| AnalyzerError::sink_failure(&path, e))?;
        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(RULE_NARROW));
    out.push('\n');
}

/// Destination path for a saved report
pub fn report_path(base: &Path, format: OutputFormat) -> PathBuf {
    let extension = format.extension();
    if base.extension().is_some_and(|ext| ext == extension) {
        return base.to_path_buf();
    }
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
