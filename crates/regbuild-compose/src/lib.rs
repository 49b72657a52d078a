//! # regbuild-compose
//!
//! Reconstructs image lineage from build recipes and multi-service manifests.
//!
//! Handles:
//! - **Parser**: Lexing, directive extraction, and validation of recipes.
//! - **Recipe**: Runtime and build-time base images of a single recipe.
//! - **Manifest**: Per-service lineage across a multi-service manifest.
//! - **Graph**: Build ordering between images produced by the same request.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod graph;
pub mod manifest;
pub mod parser;
pub mod recipe;
