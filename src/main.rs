use anyhow::{Context, Result};
use clap::Parser;
use gitlab_strace_analyzer::{
    analyzer::Analyzer,
    cli::{Cli, Command, OutputFormat},
    config::Config,
    console,
};
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load thresholds from --config, or use the defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn run_analyze(args: &Cli, file: &Path, config: Config) -> Result<()> {
    let analyzer = Analyzer::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let report = match args.format {
        OutputFormat::Text => {
            console::write_header(&mut out, file)?;
            let mut echo_error = None;
            let report = analyzer.analyze_file_with(file, |line, classification| {
                if echo_error.is_none() {
                    if let Err(e) =
                        console::write_line_echo(&mut out, line, classification, args.verbose)
                    {
                        echo_error = Some(e);
                    }
                }
            })?;
            if let Some(e) = echo_error {
                return Err(e).context("Failed to write to stdout");
            }
            console::write_report(&mut out, &report, args.recommendations)?;
            report
        }
        OutputFormat::Json => {
            let report = analyzer.analyze_file(file)?;
            writeln!(out, "{}", report.to_json()?)?;
            report
        }
    };

    if let Some(base) = &args.output {
        let path = report.save(args.effective_save_format(), base)?;
        if args.format == OutputFormat::Text {
            writeln!(out, "\nReport saved to {}", path.display())?;
        }
    }

    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    match &args.command {
        Command::Analyze { file } => run_analyze(&args, file, config)?,
    }

    Ok(())
}
