//! `regbuild plan`: print the ordered steps of a build without running it.

use anyhow::Context as _;
use clap::Args;

use super::build::{RequestArgs, prepare};
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// The build request.
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the steps as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if the request is invalid or fails to compile.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let prepared = prepare(&args.request).context("invalid build request")?;
    let workflow = prepared.compile().context("failed to compile workflow")?;
    tracing::info!(build_number = %prepared.build_number, steps = workflow.len(), "planned build");

    if args.json {
        output::print_json(&workflow.steps())
    } else {
        output::print_text(&output::format_steps(&workflow.steps()))
    }
}
