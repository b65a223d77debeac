//! Analysis driver
//!
//! Pulls lines from a source one at a time, classifies each, folds the result
//! into a fresh [`Aggregator`], and assembles the [`Report`] once the source
//! is exhausted. A read error aborts the run and discards the partial state.

use crate::aggregator::Aggregator;
use crate::classifier::{Classification, Classifier};
use crate::config::Config;
use crate::error::Result;
use crate::report::Report;
use crate::source::{TraceLine, TraceSource};
use std::path::Path;
use tracing::{debug, trace};

/// Runs analyses with a fixed configuration
///
/// Holds no per-run state, so one analyzer can serve any number of runs.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    classifier: Classifier,
    config: Config,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        Self {
            classifier: Classifier::new(config.detectors.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze a sequence of lines
    pub fn analyze<I>(&self, lines: I) -> Result<Report>
    where
        I: IntoIterator<Item = Result<TraceLine>>,
    {
        self.analyze_with(lines, |_, _| {})
    }

    /// Analyze a sequence of lines, calling `observe` for each classified line
    /// before it is folded into the aggregate
    pub fn analyze_with<I, F>(&self, lines: I, mut observe: F) -> Result<Report>
    where
        I: IntoIterator<Item = Result<TraceLine>>,
        F: FnMut(&TraceLine, &Classification),
    {
        let mut aggregator = Aggregator::new();

        for line in lines {
            let line = line?;
            let classification = self.classifier.classify(&line.text);
            if !classification.findings.is_empty() {
                trace!(
                    line = line.number,
                    findings = classification.findings.len(),
                    "classified"
                );
            }
            observe(&line, &classification);
            aggregator.record(&line, classification);
        }

        let snapshot = aggregator.finish();
        debug!(
            total_lines = snapshot.stats.total_lines,
            issues = snapshot.issues.len(),
            "analysis complete"
        );

        Ok(Report::assemble(snapshot, &self.config.recommendations))
    }

    /// Open and analyze a trace file
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<Report> {
        self.analyze_file_with(path, |_, _| {})
    }

    /// Open and analyze a trace file with a per-line observer
    pub fn analyze_file_with<P, F>(&self, path: P, observe: F) -> Result<Report>
    where
        P: AsRef<Path>,
        F: FnMut(&TraceLine, &Classification),
    {
        let source = TraceSource::open(path.as_ref())?;
        debug!("Analyzing {}", source.path().display());
        self.analyze_with(source, observe)
    }
}

/// Analyze a sequence of lines with the default configuration
pub fn analyze<I>(lines: I) -> Result<Report>
where
    I: IntoIterator<Item = Result<TraceLine>>,
{
    Analyzer::default().analyze(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::IssueKind;
    use crate::config::DetectorThresholds;
    use crate::error::AnalyzerError;
    use crate::recommendations::FALLBACK_RECOMMENDATION;
    use crate::source::numbered;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_scenario_plain_open() {
        let report = analyze(numbered(["open(\"/etc/passwd\", O_RDONLY) = 3"])).unwrap();
        assert_eq!(report.summary.file_operations, 1);
        assert!(report.issues.is_empty());
        assert_eq!(report.recommendations, vec![FALLBACK_RECOMMENDATION]);
    }

    #[test]
    fn test_scenario_permission_denied() {
        let report = analyze(numbered([
            "open(\"/root/secret\", O_RDONLY) = -1 EACCES (Permission denied)",
        ]))
        .unwrap();
        assert_eq!(report.summary.permission_denied, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::PermissionDenied);
        assert_eq!(report.issues[0].line_number, 1);
    }

    #[test]
    fn test_scenario_eagain_timeout() {
        let report = analyze(numbered([
            "recv(3, \"\", 1024, 0) = -1 EAGAIN (Resource temporarily unavailable)",
        ]))
        .unwrap();
        assert_eq!(report.summary.network_timeouts, 1);
        assert_eq!(report.summary.network_operations, 1);
    }

    #[test]
    fn test_scenario_heavy_disk_io() {
        let report =
            analyze(numbered(["read(3, \"large_data_chunk\", 2097152) = 2097152"])).unwrap();
        assert_eq!(report.summary.performance_metrics.disk_io_heavy, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::HeavyDiskIo);
        assert!(report.issues[0].description.contains("2097152"));
    }

    #[test]
    fn test_scenario_skipped_lines() {
        let report = analyze(numbered([
            "",
            "# This is a comment",
            "",
            "   # another",
            "open(\"/etc/passwd\", O_RDONLY) = 3",
        ]))
        .unwrap();
        assert_eq!(report.summary.total_lines, 5);
        assert_eq!(report.summary.file_operations, 1);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let lines = [
            "open(\"/var/opt/gitlab/postgresql/x\", O_RDONLY) = -1 ENOENT (No such file)",
            "[sidekiq] CPU 95%",
            "read(3, \"\", 2097152) = 2097152 <1.5>",
        ];
        let first = analyze(numbered(lines)).unwrap();
        let second = analyze(numbered(lines)).unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.issues, second.issues);
        assert_eq!(first.recommendations, second.recommendations);
    }

    #[test]
    fn test_observer_sees_every_line_in_order() {
        let mut seen = Vec::new();
        Analyzer::default()
            .analyze_with(numbered(["a", "", "close(3) = 0"]), |line, c| {
                seen.push((line.number, c.skipped))
            })
            .unwrap();
        assert_eq!(seen, vec![(1, false), (2, true), (3, false)]);
    }

    #[test]
    fn test_read_error_aborts_run() {
        let lines = vec![
            Ok(TraceLine::new(1, "open(\"/etc/passwd\", O_RDONLY) = 3")),
            Err(AnalyzerError::SourceUnavailable {
                path: "trace".into(),
                source: io::Error::new(io::ErrorKind::Other, "truncated"),
            }),
        ];
        let result = analyze(lines);
        assert!(matches!(result, Err(AnalyzerError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_config_thresholds_flow_through() {
        let mut config = Config::default();
        config.detectors = DetectorThresholds {
            heavy_io_bytes: 100,
            ..DetectorThresholds::default()
        };
        config.recommendations.disk_io_heavy = 0;

        let report = Analyzer::new(config)
            .analyze(numbered(["read(3, \"\", 4096) = 4096"]))
            .unwrap();
        assert_eq!(report.summary.performance_metrics.disk_io_heavy, 1);
        assert!(report.recommendations[0].contains("Heavy disk I/O detected (1 operations)"));
    }

    #[test]
    fn test_analyze_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "\n# This is a comment\n\nopen(\"/etc/passwd\", O_RDONLY) = 3\n"
        )
        .unwrap();

        let report = Analyzer::default().analyze_file(file.path()).unwrap();
        assert_eq!(report.summary.total_lines, 4);
        assert_eq!(report.summary.file_operations, 1);
    }

    #[test]
    fn test_analyze_missing_file() {
        let err = Analyzer::default()
            .analyze_file("/nonexistent/strace.txt")
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::SourceUnavailable { .. }));
    }
}
