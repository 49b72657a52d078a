//! Execution-time fallback to host environment variables.
//!
//! A [`Context`](crate::context::Context) leaves references it does not know
//! untouched. Whoever issues the process call resolves what remains against
//! the host environment, right before use.

use crate::reduce::expand_with;

/// Replaces `${NAME}` markers with host environment values.
///
/// Names missing from the environment stay literal.
pub fn expand_host_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_host_variable_stays_literal() {
        let out = expand_host_env("${REGBUILD_TEST_SURELY_UNSET_VARIABLE}/x");
        assert_eq!(out, "${REGBUILD_TEST_SURELY_UNSET_VARIABLE}/x");
    }

    #[test]
    fn path_is_taken_from_host() {
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        assert_eq!(expand_host_env("${PATH}"), path);
    }
}
