//! Access-token login.

use regbuild_common::error::Result;
use regbuild_core::runner::{Runner, mask_secrets};
use regbuild_core::task::Credential;

use super::{DOCKER, login_args};

/// Username registries expect alongside a bearer access token.
const TOKEN_USERNAME: &str = "oauth2accesstoken";

/// Logs in with an access token.
#[derive(Clone)]
pub struct TokenCredential {
    registry: String,
    token: String,
}

impl TokenCredential {
    /// Creates a credential for `registry`.
    #[must_use]
    pub fn new(registry: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for TokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCredential")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Credential for TokenCredential {
    fn authenticate(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(registry = %self.registry, "logging in with token");
        let mask = mask_secrets(vec![self.token.clone()]);
        runner.execute_verbatim(
            DOCKER,
            &login_args(&self.registry, TOKEN_USERNAME, &self.token),
            Some(&mask),
        )
    }

    fn is_complete(&self) -> bool {
        !self.registry.is_empty() && !self.token.is_empty()
    }

    fn describe(&self) -> String {
        format!("token@{}", self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn debug_hides_token() {
        let cred = TokenCredential::new("reg.io", "abc.def");
        assert!(!format!("{cred:?}").contains("abc.def"));
        assert_eq!(cred.describe(), "token@reg.io");
        assert!(cred.is_complete());
        assert!(!TokenCredential::new("reg.io", "").is_complete());
    }

    #[test]
    fn token_reaches_login_unexpanded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = RecordingRunner::in_dir(dir.path());
        TokenCredential::new("reg.io", "a$${b}${PATH}")
            .authenticate(&mut runner)
            .expect("login");
        assert_eq!(
            runner.commands[0],
            vec!["login", "--username", TOKEN_USERNAME, "--password", "a$${b}${PATH}", "reg.io"]
        );
        assert!(!runner.displayed[0].contains("${PATH}"));
    }
}
