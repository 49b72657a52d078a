//! # regbuild-runtime
//!
//! Everything that drives external tools during a build:
//! - **Workflow**: compiles a [`request::BuildRequest`] into ordered steps
//!   and runs them.
//! - **Process**: the host [`regbuild_core::runner::Runner`].
//! - **Build**: `docker build` and `docker-compose` targets.
//! - **Credential**: registry logins.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod build;
pub mod credential;
pub mod process;
pub mod request;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
