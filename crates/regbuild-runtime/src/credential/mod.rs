//! Registry logins, one module per credential kind.

pub mod password;
pub mod token;

pub use password::PasswordCredential;
pub use token::TokenCredential;

const DOCKER: &str = "docker";
const LOGIN: &str = "login";
const USERNAME_FLAG: &str = "--username";
const PASSWORD_FLAG: &str = "--password";

/// `docker login` arguments for a username/secret pair.
fn login_args(registry: &str, username: &str, secret: &str) -> Vec<String> {
    vec![
        LOGIN.to_string(),
        USERNAME_FLAG.to_string(),
        username.to_string(),
        PASSWORD_FLAG.to_string(),
        secret.to_string(),
        registry.to_string(),
    ]
}
