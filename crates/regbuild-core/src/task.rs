//! Capabilities the scheduler compiles into a workflow.
//!
//! The scheduler only ever sees these traits; each concrete variant (git,
//! local directory, archive, single recipe, manifest, password, token...)
//! lives in its own module elsewhere in the workspace.

use regbuild_common::error::Result;
use regbuild_common::types::{ImageDependencies, Variable};

use crate::runner::Runner;

/// Where the code being built comes from.
pub trait Source {
    /// Acquires the source and makes it the runner's working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if acquisition fails.
    fn obtain(&self, runner: &mut dyn Runner) -> Result<()>;

    /// Cleans up after every build of this source has run.
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails.
    fn return_source(&self, runner: &mut dyn Runner) -> Result<()>;

    /// Variables this source contributes to its builds' contexts.
    fn export(&self) -> Vec<Variable>;

    /// Short human-readable description for plans and logs.
    fn describe(&self) -> String;
}

/// One image (or set of images) built from a source.
pub trait BuildTarget {
    /// Builds the image(s).
    ///
    /// # Errors
    ///
    /// Returns an error if the build tool fails.
    fn build(&self, runner: &mut dyn Runner) -> Result<()>;

    /// Pushes the built image(s) to the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the push tool fails.
    fn push(&self, runner: &mut dyn Runner) -> Result<()>;

    /// Reads the recipe(s) and reports the base images of each output.
    ///
    /// # Errors
    ///
    /// Returns parse, resolution, or I/O errors from the dependency resolver.
    fn scan_for_dependencies(&self, runner: &mut dyn Runner) -> Result<Vec<ImageDependencies>>;

    /// Variables this build contributes to its own context.
    fn export(&self) -> Vec<Variable>;

    /// Short human-readable description for plans and logs.
    fn describe(&self) -> String;
}

/// Registry login performed before any source is obtained.
pub trait Credential {
    /// Logs in to the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the login tool fails.
    fn authenticate(&self, runner: &mut dyn Runner) -> Result<()>;

    /// Short description that never includes the secret.
    fn describe(&self) -> String;

    /// Whether every field needed to log in is present.
    fn is_complete(&self) -> bool {
        true
    }
}
