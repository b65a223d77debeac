//! Recommendations derived from final aggregate counts
//!
//! Rules are evaluated independently, in a fixed order; every rule that fires
//! contributes one line. When none fire, a single fallback suggests
//! re-capturing the trace with timing enabled.

use crate::aggregator::Stats;
use crate::catalog::PatternGroup;
use crate::config::RecommendationThresholds;

/// Suggestion emitted when no threshold rule fires
pub const FALLBACK_RECOMMENDATION: &str =
    "No significant issues detected. Re-capture the trace with timing enabled (strace -f -tt -T) for deeper performance analysis.";

/// Derive recommendations with the default thresholds
pub fn recommend(stats: &Stats) -> Vec<String> {
    recommend_with(stats, &RecommendationThresholds::default())
}

/// Derive recommendations from finished stats
pub fn recommend_with(stats: &Stats, thresholds: &RecommendationThresholds) -> Vec<String> {
    let perf = &stats.performance_metrics;
    let mut recommendations = Vec::new();

    if perf.slow_syscalls > thresholds.slow_syscalls {
        recommendations.push(format!(
            "High number of slow syscalls ({}). Investigate I/O bottlenecks and lock contention in the slowest calls.",
            perf.slow_syscalls
        ));
    }

    if perf.memory_issues > 0 {
        recommendations.push(format!(
            "Memory allocation failures detected ({}). Check available memory, swap usage, and process memory limits.",
            perf.memory_issues
        ));
    }

    if perf.disk_io_heavy > thresholds.disk_io_heavy {
        recommendations.push(format!(
            "Heavy disk I/O detected ({} operations). Consider optimizing file access patterns or moving to faster storage.",
            perf.disk_io_heavy
        ));
    }

    if perf.network_heavy > thresholds.network_heavy {
        recommendations.push(format!(
            "Heavy network I/O detected ({} operations). Consider network optimization or caching.",
            perf.network_heavy
        ));
    }

    let database = stats.group_count(PatternGroup::Database);
    if database > thresholds.database_activity {
        recommendations.push(format!(
            "High PostgreSQL activity ({} operations). Review slow queries and index usage.",
            database
        ));
    }

    let cache = stats.group_count(PatternGroup::Cache);
    if cache > thresholds.cache_activity {
        recommendations.push(format!(
            "High Redis activity ({} operations). Monitor Redis memory usage and eviction.",
            cache
        ));
    }

    let git = stats.group_count(PatternGroup::VersionControl);
    if git > thresholds.git_activity {
        recommendations.push(format!(
            "High Git repository activity ({} operations). Consider running repository housekeeping (git gc).",
            git
        ));
    }

    if stats.permission_denied > thresholds.permission_denied {
        recommendations.push(format!(
            "Multiple permission denied errors ({}). Review file ownership and permissions for GitLab directories.",
            stats.permission_denied
        ));
    }

    if stats.network_timeouts > thresholds.network_timeouts {
        recommendations.push(format!(
            "Multiple network timeouts ({}). Check network connectivity and firewall rules.",
            stats.network_timeouts
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(FALLBACK_RECOMMENDATION.to_string());
    }

    recommendations
}
