//! A tarball streamed into the build on standard input.

use std::io::Read;
use std::path::PathBuf;

use regbuild_common::constants::EXPORT_WORKING_DIR;
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::Variable;
use regbuild_core::runner::Runner;
use regbuild_core::task::Source;

use crate::unpack::unpack_tarball;
use crate::workdir::ReturnPoint;

/// Builds from a `.tar` or `.tar.gz` piped into the process.
#[derive(Debug)]
pub struct StdinSource {
    target_dir: PathBuf,
    return_point: ReturnPoint,
}

impl StdinSource {
    /// Creates a source unpacking stdin into `target_dir`.
    #[must_use]
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            return_point: ReturnPoint::default(),
        }
    }
}

impl Source for StdinSource {
    fn obtain(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(target = %self.target_dir.display(), "reading source tarball from stdin");
        if runner.dry_run() {
            tracing::info!("dry run, leaving stdin unread");
            return self.return_point.enter(runner, &self.target_dir);
        }
        let mut bytes = Vec::new();
        let _ = runner
            .stdin()
            .read_to_end(&mut bytes)
            .map_err(|e| BuildError::Io {
                path: PathBuf::from("<stdin>"),
                source: e,
            })?;
        let target = runner.working_dir()?.join(&self.target_dir);
        unpack_tarball(&bytes, &target)?;
        self.return_point.enter(runner, &self.target_dir)
    }

    fn return_source(&self, runner: &mut dyn Runner) -> Result<()> {
        self.return_point.leave(runner)
    }

    fn export(&self) -> Vec<Variable> {
        vec![Variable::new(EXPORT_WORKING_DIR, self.target_dir.display().to_string())]
    }

    fn describe(&self) -> String {
        "stdin".to_string()
    }
}
