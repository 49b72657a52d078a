//! Build strategies, one module per tool.

pub mod compose;
pub mod docker;

pub use compose::ComposeBuildTarget;
pub use docker::DockerBuildTarget;

use std::path::{Path, PathBuf};

use regbuild_common::error::Result;
use regbuild_core::host::expand_host_env;
use regbuild_core::runner::Runner;

/// Expands `path` through the runner's context and the host environment,
/// anchoring relative results at the runner's working directory.
fn locate(runner: &dyn Runner, path: &Path) -> Result<PathBuf> {
    let expanded = expand_host_env(&runner.context().expand(&path.to_string_lossy()));
    Ok(runner.working_dir()?.join(expanded))
}
