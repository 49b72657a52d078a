//! Dry-run runner that remembers what it would have executed.

use std::io::Read;
use std::path::{Path, PathBuf};

use regbuild_common::config::RunnerConfig;
use regbuild_common::error::Result;
use regbuild_core::context::Context;
use regbuild_core::runner::{Obfuscator, Runner};

use crate::process::ProcessRunner;

/// Wraps a dry-run [`ProcessRunner`], recording each command it is given.
#[derive(Debug)]
pub(crate) struct RecordingRunner {
    inner: ProcessRunner,
    /// Arguments each command would have run with.
    pub commands: Vec<Vec<String>>,
    /// Command lines as they would be logged.
    pub displayed: Vec<String>,
}

impl RecordingRunner {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            inner: ProcessRunner::in_dir(dir, RunnerConfig { dry_run: true }),
            commands: Vec::new(),
            displayed: Vec::new(),
        }
    }

    fn record(&mut self, program: &str, args: Vec<String>, obfuscate: Option<Obfuscator<'_>>) {
        self.displayed.push(self.inner.display(program, &args, obfuscate));
        self.commands.push(args);
    }
}

impl Runner for RecordingRunner {
    fn context(&self) -> &Context {
        self.inner.context()
    }

    fn set_context(&mut self, context: Context) {
        self.inner.set_context(context);
    }

    fn execute_with_obfuscation(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()> {
        let expanded = self.inner.expand_args(args);
        self.record(program, expanded, obfuscate);
        self.inner.execute_with_obfuscation(program, args, obfuscate)
    }

    fn execute_verbatim(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()> {
        self.record(program, args.to_vec(), obfuscate);
        self.inner.execute_verbatim(program, args, obfuscate)
    }

    fn query(&mut self, program: &str, args: &[String]) -> Result<String> {
        let expanded = self.inner.expand_args(args);
        self.record(program, expanded, None);
        self.inner.query(program, args)
    }

    fn dry_run(&self) -> bool {
        self.inner.dry_run()
    }

    fn working_dir(&self) -> Result<PathBuf> {
        self.inner.working_dir()
    }

    fn change_dir(&mut self, path: &Path) -> Result<()> {
        self.inner.change_dir(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.inner.dir_exists(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }

    fn is_dir_empty(&self, path: &Path) -> Result<bool> {
        self.inner.is_dir_empty(path)
    }

    fn stdin(&mut self) -> Box<dyn Read + '_> {
        self.inner.stdin()
    }
}
