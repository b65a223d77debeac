//! CLI argument parsing for gitlab-strace-analyzer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "gitlab-strace-analyzer")]
#[command(version)]
#[command(about = "Analyze strace output captured from GitLab deployments", long_about = None)]
pub struct Cli {
    /// Echo every file and network operation line as it is classified
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print recommendations after the summary
    #[arg(short, long, global = true)]
    pub recommendations: bool,

    /// Console output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Also save the report to BASE (extension added from --save-format)
    #[arg(short, long = "output", value_name = "BASE", global = true)]
    pub output: Option<PathBuf>,

    /// Format of the saved report (defaults to --format)
    #[arg(long = "save-format", value_enum, global = true)]
    pub save_format: Option<OutputFormat>,

    /// TOML file with detector and recommendation thresholds
    #[arg(short, long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a captured strace file
    Analyze {
        /// Path to the strace output
        #[arg(value_name = "STRACE_FILE")]
        file: PathBuf,
    },
}

impl Cli {
    /// Format used when saving with --output
    pub fn effective_save_format(&self) -> OutputFormat {
        self.save_format.unwrap_or(self.format)
    }
}
