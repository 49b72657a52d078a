//! Username and password login.

use regbuild_common::error::Result;
use regbuild_core::runner::{Runner, mask_secrets};
use regbuild_core::task::Credential;

use super::{DOCKER, login_args};

/// Logs in with a username and password.
#[derive(Clone)]
pub struct PasswordCredential {
    registry: String,
    username: String,
    password: String,
}

impl PasswordCredential {
    /// Creates a credential for `registry`.
    #[must_use]
    pub fn new(
        registry: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("registry", &self.registry)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credential for PasswordCredential {
    fn authenticate(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(registry = %self.registry, username = %self.username, "logging in");
        let mask = mask_secrets(vec![self.password.clone()]);
        runner.execute_verbatim(
            DOCKER,
            &login_args(&self.registry, &self.username, &self.password),
            Some(&mask),
        )
    }

    fn is_complete(&self) -> bool {
        !self.registry.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.username, self.registry)
    }
}
