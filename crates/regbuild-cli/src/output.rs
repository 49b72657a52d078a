//! Formatted output helpers for CLI commands.
//!
//! Machine-readable results go to stdout; logs go to stderr through
//! `tracing`, so the two never interleave.

use std::io::Write;

use regbuild_runtime::workflow::Step;
use serde::Serialize;

/// Writes `value` to stdout as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Renders steps as an aligned table.
#[must_use]
pub fn format_steps(steps: &[Step]) -> String {
    let width = steps.len().to_string().len();
    let mut out = String::new();
    for step in steps {
        out.push_str(&format!(
            "{:>width$}  {:<8} {}\n",
            step.index + 1,
            step.state.to_string(),
            step.description
        ));
    }
    out
}

/// Writes `text` to stdout.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_text(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    Ok(())
}
