//! # regbuild-core
//!
//! The variable machinery and capability surface every build step runs on.
//!
//! This crate provides:
//! - **Reduction**: fixed-point, cycle-detecting `${name}` substitution.
//! - **Context**: immutable, layered variable scopes with copy-on-append.
//! - **Host**: execution-time fallback to the host environment.
//! - **Runner**: the execution capability tasks drive external tools through.
//! - **Task**: the source, build target, and credential capabilities the
//!   scheduler compiles into a workflow.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod context;
pub mod host;
pub mod reduce;
pub mod runner;
pub mod task;
