//! Pattern catalog: the closed set of detectors the classifier applies
//!
//! Three detector groups live here:
//! - File-operation verbs (`open(`, `read(`, ...)
//! - Network-operation verbs (`socket(`, `connect(`, ...)
//! - GitLab domain patterns (component paths and process/operation keywords)
//!
//! Within each group the first match in declaration order wins. The
//! declaration order of every `ALL` array is part of the output contract.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Whole-word `verb(` call token
///
/// `open(` matches `open("/etc/passwd")`, `3 open(` and `→open(` but not
/// `reopen(` or `openat(`. Word boundaries are Unicode-aware.
pub fn call_pattern(verb: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\(", regex::escape(verb))).ok()
}

static FILE_CALLS: LazyLock<Vec<(FileOperation, Option<Regex>)>> = LazyLock::new(|| {
    FileOperation::ALL
        .into_iter()
        .map(|op| (op, call_pattern(op.as_str())))
        .collect()
});

static NETWORK_CALLS: LazyLock<Vec<(NetworkOperation, Option<Regex>)>> = LazyLock::new(|| {
    NetworkOperation::ALL
        .into_iter()
        .map(|op| (op, call_pattern(op.as_str())))
        .collect()
});

fn first_call<T: Copy>(calls: &[(T, Option<Regex>)], line: &str) -> Option<T> {
    calls
        .iter()
        .find(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(line)))
        .map(|(op, _)| *op)
}

/// File-operation syscall verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    Open,
    Openat,
    Read,
    Write,
    Readv,
    Writev,
    Close,
    Stat,
    Fstat,
    Lstat,
    Access,
    Chmod,
    Chown,
    Mkdir,
    Rmdir,
    Unlink,
    Rename,
}

impl FileOperation {
    /// All verbs in precedence order
    pub const ALL: [FileOperation; 17] = [
        Self::Open,
        Self::Openat,
        Self::Read,
        Self::Write,
        Self::Readv,
        Self::Writev,
        Self::Close,
        Self::Stat,
        Self::Fstat,
        Self::Lstat,
        Self::Access,
        Self::Chmod,
        Self::Chown,
        Self::Mkdir,
        Self::Rmdir,
        Self::Unlink,
        Self::Rename,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Openat => "openat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Readv => "readv",
            Self::Writev => "writev",
            Self::Close => "close",
            Self::Stat => "stat",
            Self::Fstat => "fstat",
            Self::Lstat => "lstat",
            Self::Access => "access",
            Self::Chmod => "chmod",
            Self::Chown => "chown",
            Self::Mkdir => "mkdir",
            Self::Rmdir => "rmdir",
            Self::Unlink => "unlink",
            Self::Rename => "rename",
        }
    }

    /// First verb (catalog order) with a whole-word call token in `line`
    pub fn detect(line: &str) -> Option<Self> {
        first_call(&FILE_CALLS, line)
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network-operation syscall verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkOperation {
    Socket,
    Connect,
    Accept,
    Bind,
    Listen,
    Send,
    Sendto,
    Recv,
    Recvfrom,
}

impl NetworkOperation {
    /// All verbs in precedence order
    pub const ALL: [NetworkOperation; 9] = [
        Self::Socket,
        Self::Connect,
        Self::Accept,
        Self::Bind,
        Self::Listen,
        Self::Send,
        Self::Sendto,
        Self::Recv,
        Self::Recvfrom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socket => "socket",
            Self::Connect => "connect",
            Self::Accept => "accept",
            Self::Bind => "bind",
            Self::Listen => "listen",
            Self::Send => "send",
            Self::Sendto => "sendto",
            Self::Recv => "recv",
            Self::Recvfrom => "recvfrom",
        }
    }

    /// First verb (catalog order) with a whole-word call token in `line`
    pub fn detect(line: &str) -> Option<Self> {
        first_call(&NETWORK_CALLS, line)
    }
}

impl fmt::Display for NetworkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment subsystem a domain pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternGroup {
    Database,
    Cache,
    VersionControl,
    Storage,
    Logs,
    Config,
    ReverseProxy,
    WorkerProcess,
}

static DATABASE_QUERY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(select|insert\s+into|update|delete\s+from)\s").ok());

static GIT_OPERATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bgit\b.*?\b(clone|fetch|push|pull|merge|rebase)\b").ok());

static UNICORN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bunicorn\b").ok());

static SIDEKIQ: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bsidekiq\b").ok());

static GITALY: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bgitaly\b").ok());

fn keyword_match(regex: &LazyLock<Option<Regex>>, line: &str) -> bool {
    regex.as_ref().is_some_and(|re| re.is_match(line))
}

fn path_match(line: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| line.contains(needle))
}

/// GitLab component patterns
///
/// Declaration order is precedence order: a line counts toward at most one
/// pattern, the first that matches. Deriving `Ord` keeps report maps in the
/// same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPattern {
    Postgresql,
    Redis,
    GitRepositories,
    GitlabLogs,
    Uploads,
    Shared,
    Tmp,
    Config,
    Nginx,
    Unicorn,
    Sidekiq,
    Gitaly,
    DatabaseQuery,
    GitOperation,
}

impl DomainPattern {
    /// All patterns in precedence order
    pub const ALL: [DomainPattern; 14] = [
        Self::Postgresql,
        Self::Redis,
        Self::GitRepositories,
        Self::GitlabLogs,
        Self::Uploads,
        Self::Shared,
        Self::Tmp,
        Self::Config,
        Self::Nginx,
        Self::Unicorn,
        Self::Sidekiq,
        Self::Gitaly,
        Self::DatabaseQuery,
        Self::GitOperation,
    ];

    /// Key used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Redis => "redis",
            Self::GitRepositories => "git_repositories",
            Self::GitlabLogs => "gitlab_logs",
            Self::Uploads => "uploads",
            Self::Shared => "shared",
            Self::Tmp => "tmp",
            Self::Config => "config",
            Self::Nginx => "nginx",
            Self::Unicorn => "unicorn",
            Self::Sidekiq => "sidekiq",
            Self::Gitaly => "gitaly",
            Self::DatabaseQuery => "database_query",
            Self::GitOperation => "git_operation",
        }
    }

    /// Human-readable component name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Postgresql => "PostgreSQL",
            Self::Redis => "Redis",
            Self::GitRepositories => "Git repositories",
            Self::GitlabLogs => "GitLab logs",
            Self::Uploads => "Uploads",
            Self::Shared => "Shared storage",
            Self::Tmp => "Temporary files",
            Self::Config => "Configuration",
            Self::Nginx => "NGINX",
            Self::Unicorn => "Unicorn",
            Self::Sidekiq => "Sidekiq",
            Self::Gitaly => "Gitaly",
            Self::DatabaseQuery => "Database queries",
            Self::GitOperation => "Git operations",
        }
    }

    pub fn group(&self) -> PatternGroup {
        match self {
            Self::Postgresql | Self::DatabaseQuery => PatternGroup::Database,
            Self::Redis => PatternGroup::Cache,
            Self::GitRepositories | Self::GitOperation => PatternGroup::VersionControl,
            Self::Uploads | Self::Shared | Self::Tmp => PatternGroup::Storage,
            Self::GitlabLogs => PatternGroup::Logs,
            Self::Config => PatternGroup::Config,
            Self::Nginx => PatternGroup::ReverseProxy,
            Self::Unicorn | Self::Sidekiq | Self::Gitaly => PatternGroup::WorkerProcess,
        }
    }

    /// Whether this single pattern's rule matches `line`
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::Postgresql => path_match(line, &["/postgresql/", ".s.PGSQL"]),
            Self::Redis => path_match(line, &["/redis/", "redis.socket"]),
            Self::GitRepositories => path_match(line, &["/git-data/repositories/"]),
            Self::GitlabLogs => path_match(line, &["/var/log/gitlab/"]),
            Self::Uploads => path_match(line, &["/uploads/"]),
            Self::Shared => path_match(line, &["/shared/"]),
            Self::Tmp => path_match(line, &["/tmp/"]),
            Self::Config => path_match(line, &["/etc/gitlab/", "gitlab.rb", "gitlab.yml"]),
            Self::Nginx => path_match(line, &["/nginx/", "nginx.conf"]),
            Self::Unicorn => keyword_match(&UNICORN, line),
            Self::Sidekiq => keyword_match(&SIDEKIQ, line),
            Self::Gitaly => keyword_match(&GITALY, line),
            Self::DatabaseQuery => keyword_match(&DATABASE_QUERY, line),
            Self::GitOperation => keyword_match(&GIT_OPERATION, line),
        }
    }

    /// First pattern (catalog order) whose rule matches `line`
    pub fn detect(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pattern| pattern.matches(line))
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
