//! In-memory runner for source tests.

use std::collections::VecDeque;
use std::io::Read;
use std::path::{Path, PathBuf};

use regbuild_common::error::{BuildError, Result};
use regbuild_core::context::Context;
use regbuild_core::host::expand_host_env;
use regbuild_core::runner::{Obfuscator, Runner};

/// Records commands and tracks the directory without touching processes.
#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    pub context: Context,
    pub cwd: PathBuf,
    /// Commands as run, `program arg...`, after expansion.
    pub commands: Vec<String>,
    /// Commands as they would be logged.
    pub displayed: Vec<String>,
    /// Canned stdout for successive `query` calls.
    pub answers: VecDeque<String>,
    pub stdin: Vec<u8>,
    /// Program name whose invocations fail.
    pub fail_on: Option<String>,
    pub dry_run: bool,
}

impl FakeRunner {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            cwd: dir.to_path_buf(),
            ..Self::default()
        }
    }

    fn record(&mut self, program: &str, args: &[String], obfuscate: Option<Obfuscator<'_>>) -> Result<()> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let shown = obfuscate.map_or_else(|| args.to_vec(), |f| f(args));
        self.displayed.push(format!("{program} {}", shown.join(" ")));
        self.commands.push(line.clone());
        if self.fail_on.as_deref() == Some(program) {
            return Err(BuildError::ExternalTool {
                command: line,
                message: "exit status: 1".into(),
            });
        }
        Ok(())
    }
}

impl Runner for FakeRunner {
    fn context(&self) -> &Context {
        &self.context
    }

    fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    fn execute_with_obfuscation(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()> {
        let expanded: Vec<String> = args
            .iter()
            .map(|arg| expand_host_env(&self.context.expand(arg)))
            .collect();
        self.record(program, &expanded, obfuscate)
    }

    fn execute_verbatim(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()> {
        self.record(program, args, obfuscate)
    }

    fn query(&mut self, program: &str, args: &[String]) -> Result<String> {
        self.record(program, args, None)?;
        Ok(self.answers.pop_front().unwrap_or_default())
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn working_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn change_dir(&mut self, path: &Path) -> Result<()> {
        self.cwd = self.cwd.join(path);
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.cwd.join(path).is_dir()
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.cwd.join(path).is_file()
    }

    fn is_dir_empty(&self, path: &Path) -> Result<bool> {
        let dir = self.cwd.join(path);
        let mut entries = std::fs::read_dir(&dir).map_err(|e| BuildError::Io { path: dir, source: e })?;
        Ok(entries.next().is_none())
    }

    fn stdin(&mut self) -> Box<dyn Read + '_> {
        Box::new(self.stdin.as_slice())
    }
}
