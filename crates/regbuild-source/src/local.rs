//! A directory that already exists on the build host.

use std::path::PathBuf;

use regbuild_common::constants::EXPORT_WORKING_DIR;
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::Variable;
use regbuild_core::runner::Runner;
use regbuild_core::task::Source;

use crate::workdir::ReturnPoint;

/// Builds from an existing directory.
#[derive(Debug)]
pub struct LocalSource {
    dir: PathBuf,
    return_point: ReturnPoint,
}

impl LocalSource {
    /// Creates a source for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            return_point: ReturnPoint::default(),
        }
    }
}

impl Source for LocalSource {
    fn obtain(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(dir = %self.dir.display(), "using local source");
        if !runner.dir_exists(&self.dir) {
            return Err(BuildError::Io {
                path: self.dir.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "source directory does not exist"),
            });
        }
        self.return_point.enter(runner, &self.dir)
    }

    fn return_source(&self, runner: &mut dyn Runner) -> Result<()> {
        self.return_point.leave(runner)
    }

    fn export(&self) -> Vec<Variable> {
        vec![Variable::new(EXPORT_WORKING_DIR, self.dir.display().to_string())]
    }

    fn describe(&self) -> String {
        format!("local({})", self.dir.display())
    }
}
