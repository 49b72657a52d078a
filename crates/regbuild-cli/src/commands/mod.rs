//! CLI command definitions and dispatch.

pub mod build;
pub mod plan;
pub mod scan;

use clap::{Parser, Subcommand, ValueEnum};

/// regbuild: container image build orchestrator.
#[derive(Parser, Debug)]
#[command(name = regbuild_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Format of log lines written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "REGBUILD_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log line encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Obtain the source, scan and build every target, optionally push.
    Build(build::BuildArgs),
    /// Print the ordered steps a build would run, without running them.
    Plan(plan::PlanArgs),
    /// Resolve base images of a local recipe or manifest.
    Scan(scan::ScanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => build::execute(&args),
        Command::Plan(args) => plan::execute(&args),
        Command::Scan(args) => scan::execute(&args),
    }
}
