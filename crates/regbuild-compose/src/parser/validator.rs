//! Static checks on a parsed recipe.

use std::collections::HashSet;

use regbuild_common::error::{BuildError, Result};

use super::ast::Recipe;

/// Validates a parsed recipe for semantic correctness.
///
/// # Checks performed
///
/// 1. At least one `FROM` directive.
/// 2. No stage alias is declared twice (aliases compare case-insensitively).
///
/// # Errors
///
/// Returns a parse error if any check fails.
pub fn validate(recipe: &Recipe) -> Result<()> {
    check_has_stage(recipe)?;
    check_duplicate_aliases(recipe)?;
    Ok(())
}

fn check_has_stage(recipe: &Recipe) -> Result<()> {
    if recipe.stages.is_empty() {
        return Err(BuildError::parse(
            "",
            "recipe must contain at least one FROM directive",
        ));
    }
    Ok(())
}

fn check_duplicate_aliases(recipe: &Recipe) -> Result<()> {
    let mut seen = HashSet::new();
    for stage in &recipe.stages {
        let Some(alias) = &stage.alias else {
            continue;
        };
        if !seen.insert(alias.to_ascii_lowercase()) {
            return Err(BuildError::parse(
                stage.line.clone(),
                format!("duplicate stage name `{alias}`"),
            ));
        }
    }
    Ok(())
}
