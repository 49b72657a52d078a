//! # regbuild-source
//!
//! Source acquisition for the build workflow.
//!
//! Each variant implements [`regbuild_core::task::Source`]:
//! - **Local**: an existing directory on the build host.
//! - **Git**: a repository cloned or refreshed into a working directory.
//! - **Archive**: a remote tarball, optionally SHA-256 verified.
//! - **Stdin**: a tarball streamed into the build.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
pub mod git;
pub mod hash;
pub mod local;
pub mod stdin;
pub mod unpack;

mod workdir;

#[cfg(test)]
pub(crate) mod testing;
