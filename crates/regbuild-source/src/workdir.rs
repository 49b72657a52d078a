//! Remembers where the runner was before a source changed into its tree.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use regbuild_common::error::Result;
use regbuild_core::runner::Runner;

#[derive(Debug, Default)]
pub(crate) struct ReturnPoint(RefCell<Option<PathBuf>>);

impl ReturnPoint {
    /// Changes into `dir`, remembering the current directory.
    pub(crate) fn enter(&self, runner: &mut dyn Runner, dir: &Path) -> Result<()> {
        let previous = runner.working_dir()?;
        runner.change_dir(dir)?;
        tracing::debug!(from = %previous.display(), to = %dir.display(), "entered source directory");
        *self.0.borrow_mut() = Some(previous);
        Ok(())
    }

    /// Restores the directory remembered by [`ReturnPoint::enter`], if any.
    pub(crate) fn leave(&self, runner: &mut dyn Runner) -> Result<()> {
        let previous = self.0.borrow_mut().take();
        if let Some(previous) = previous {
            runner.change_dir(&previous)?;
            tracing::debug!(to = %previous.display(), "returned from source directory");
        }
        Ok(())
    }
}
