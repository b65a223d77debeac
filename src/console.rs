//! Colored terminal presentation
//!
//! Mirrors the narrative report, with counts and issues colored by category.
//! Components and issues are only printed when present; recommendations only
//! on request.

use crate::classifier::{Classification, IssueKind};
use crate::report::Report;
use crate::source::TraceLine;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::path::Path;

/// Banner printed before analysis starts
pub fn write_header<W: Write>(out: &mut W, path: &Path) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("Analyzing strace file: {}", path.display())
            .blue()
            .bold()
    )?;
    writeln!(out, "{}", "=".repeat(50))
}

/// Echo a classified line
///
/// Permission-denied and timeout lines are always echoed; file and network
/// operations only in verbose mode.
pub fn write_line_echo<W: Write>(
    out: &mut W,
    line: &TraceLine,
    classification: &Classification,
    verbose: bool,
) -> io::Result<()> {
    if classification.skipped {
        return Ok(());
    }
    let text = format!("{:>6}: {}", line.number, line.text.trim());

    if verbose && classification.file_operation.is_some() {
        writeln!(out, "{}", text.green())?;
    }
    if classification.permission_denied {
        writeln!(out, "{}", text.red())?;
    }
    if classification.network_timeout {
        writeln!(out, "{}", text.yellow())?;
    }
    if verbose && classification.network_operation.is_some() {
        writeln!(out, "{}", text.cyan())?;
    }
    Ok(())
}

/// Summary, components, performance, issues and (optionally) recommendations
pub fn write_report<W: Write>(
    out: &mut W,
    report: &Report,
    show_recommendations: bool,
) -> io::Result<()> {
    let stats = &report.summary;
    let perf = &stats.performance_metrics;

    heading(out, "Analysis Summary:")?;
    writeln!(out, "Total lines processed: {}", stats.total_lines)?;
    writeln!(out, "File operations: {}", stats.file_operations.green())?;
    writeln!(out, "Network operations: {}", stats.network_operations.cyan())?;
    writeln!(
        out,
        "Permission denied errors: {}",
        stats.permission_denied.red()
    )?;
    writeln!(out, "Network timeouts: {}", stats.network_timeouts.yellow())?;

    let components: Vec<_> = report.active_components().collect();
    if !components.is_empty() {
        heading(out, "GitLab Components Activity:")?;
        for (pattern, count) in components {
            writeln!(out, "{}: {}", pattern.label(), count.magenta())?;
        }
    }

    heading(out, "Performance Metrics:")?;
    writeln!(out, "Slow syscalls: {}", perf.slow_syscalls.yellow())?;
    if !perf.high_cpu_processes.is_empty() {
        writeln!(
            out,
            "High CPU processes: {}",
            perf.high_cpu_processes.join(", ").red()
        )?;
    }
    writeln!(out, "Memory issues: {}", perf.memory_issues.red())?;
    writeln!(out, "Heavy disk I/O operations: {}", perf.disk_io_heavy.yellow())?;
    writeln!(
        out,
        "Heavy network I/O operations: {}",
        perf.network_heavy.yellow()
    )?;

    if !report.issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Issues Found:".red().bold())?;
        writeln!(out, "{}", "-".repeat(30))?;
        for issue in &report.issues {
            let headline = format!("Line {}: {}", issue.line_number, issue.description);
            writeln!(out, "{}", colorize_issue(issue.kind, &headline))?;
            writeln!(out, "  {}", issue.line)?;
            writeln!(out)?;
        }
    }

    if show_recommendations {
        heading(out, "Recommendations:")?;
        for rec in &report.recommendations {
            writeln!(out, "  * {}", rec)?;
        }
    }

    Ok(())
}

fn heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title.blue().bold())?;
    writeln!(out, "{}", "-".repeat(30))
}

fn colorize_issue(kind: IssueKind, text: &str) -> String {
    match kind {
        IssueKind::PermissionDenied | IssueKind::MemoryIssue => text.red().to_string(),
        IssueKind::NetworkTimeout | IssueKind::FrequentFailures => text.yellow().to_string(),
        IssueKind::FileNotFound => text.magenta().to_string(),
        IssueKind::SlowSyscall
        | IssueKind::SlowDatabaseQuery
        | IssueKind::GitPerformance
        | IssueKind::HeavyDiskIo
        | IssueKind::HeavyNetworkIo => text.bright_yellow().to_string(),
        IssueKind::ProcessIssue | IssueKind::HighCpuUsage => text.bright_red().to_string(),
    }
}
