//! Host process execution for workflow tasks.
//!
//! Every argument is expanded through the task's [`Context`] and then the
//! host environment right before the child is spawned, unless the caller
//! asks for verbatim execution. The context's
//! resolved variables are injected into the child's environment. The
//! working directory is tracked here and handed to each child; the
//! process-wide current directory is never changed.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use regbuild_common::config::RunnerConfig;
use regbuild_common::error::{BuildError, Result};
use regbuild_core::context::Context;
use regbuild_core::host::expand_host_env;
use regbuild_core::runner::{Obfuscator, Runner};

/// Runs external tools as child processes of the build.
#[derive(Debug)]
pub struct ProcessRunner {
    context: Context,
    cwd: PathBuf,
    config: RunnerConfig,
}

impl ProcessRunner {
    /// Creates a runner starting in the process's current directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the current directory cannot be determined.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| BuildError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        Ok(Self::in_dir(cwd, config))
    }

    /// Creates a runner starting in `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        Self {
            context: Context::default(),
            cwd: dir.into(),
            config,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }

    pub(crate) fn expand_args(&self, args: &[String]) -> Vec<String> {
        args.iter()
            .map(|arg| expand_host_env(&self.context.expand(arg)))
            .collect()
    }

    /// The command line as it may appear in logs and errors.
    pub(crate) fn display(&self, program: &str, args: &[String], obfuscate: Option<Obfuscator<'_>>) -> String {
        let shown = obfuscate.map_or_else(|| args.to_vec(), |f| f(args));
        let line = std::iter::once(program.to_string())
            .chain(shown)
            .collect::<Vec<_>>()
            .join(" ");
        self.context.redact(&line)
    }

    fn command(&self, program: &str, args: &[String], shown: &str) -> Result<Command> {
        let binary = which::which(program).map_err(|e| BuildError::ExternalTool {
            command: shown.to_string(),
            message: format!("{program} not found: {e}"),
        })?;
        let mut cmd = Command::new(binary);
        let _ = cmd
            .args(args)
            .current_dir(&self.cwd)
            .envs(self.context.resolved());
        Ok(cmd)
    }

    fn run(&self, program: &str, args: &[String], obfuscate: Option<Obfuscator<'_>>) -> Result<()> {
        let shown = self.display(program, args, obfuscate);
        if self.config.dry_run {
            tracing::info!(command = %shown, cwd = %self.cwd.display(), "dry run, not executing");
            return Ok(());
        }
        tracing::info!(command = %shown, cwd = %self.cwd.display(), "executing");

        let status = self
            .command(program, args, &shown)?
            .status()
            .map_err(|e| BuildError::ExternalTool {
                command: shown.clone(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(BuildError::ExternalTool {
                command: shown,
                message: status.to_string(),
            });
        }
        Ok(())
    }
}

impl Runner for ProcessRunner {
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
        let args = self.expand_args(args);
        self.run(program, &args, obfuscate)
    }

    fn execute_verbatim(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()> {
        self.run(program, args, obfuscate)
    }

    fn query(&mut self, program: &str, args: &[String]) -> Result<String> {
        let args = self.expand_args(args);
        let shown = self.display(program, &args, None);
        if self.config.dry_run {
            tracing::info!(command = %shown, "dry run, not querying");
            return Ok(String::new());
        }
        tracing::debug!(command = %shown, cwd = %self.cwd.display(), "querying");

        let output = self
            .command(program, &args, &shown)?
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| BuildError::ExternalTool {
                command: shown.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(BuildError::ExternalTool {
                command: shown,
                message: output.status.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    fn working_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn change_dir(&mut self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        if self.config.dry_run && !target.exists() {
            // Nothing was cloned or unpacked, so the directory is never created.
            tracing::info!(dir = %target.display(), "dry run, entering directory that does not exist");
            self.cwd = target;
            return Ok(());
        }
        let canonical = std::fs::canonicalize(&target).map_err(|e| BuildError::Io {
            path: target.clone(),
            source: e,
        })?;
        if !canonical.is_dir() {
            return Err(BuildError::Io {
                path: target,
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        tracing::debug!(dir = %canonical.display(), "changed working directory");
        self.cwd = canonical;
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn is_dir_empty(&self, path: &Path) -> Result<bool> {
        let dir = self.resolve(path);
        let mut entries = std::fs::read_dir(&dir).map_err(|e| BuildError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(entries.next().is_none())
    }

    fn stdin(&mut self) -> Box<dyn Read + '_> {
        Box::new(std::io::stdin().lock())
    }
}

#[cfg(test)]
mod tests {
    use regbuild_common::types::Variable;
    use regbuild_core::runner::mask_secrets;

    use super::*;

    fn runner_in(dir: &Path) -> ProcessRunner {
        ProcessRunner::in_dir(dir, RunnerConfig::default())
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn successful_command_returns_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        runner_in(dir.path()).execute("true", &[]).expect("true should succeed");
    }

    #[test]
    fn nonzero_exit_is_external_tool_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = runner_in(dir.path()).execute("false", &[]).expect_err("should fail");
        assert!(matches!(err, BuildError::ExternalTool { ref command, .. } if command == "false"));
    }

    #[test]
    fn missing_program_is_external_tool_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = runner_in(dir.path())
            .execute("regbuild-no-such-tool", &[])
            .expect_err("should fail");
        assert!(matches!(err, BuildError::ExternalTool { .. }));
    }

    #[test]
    fn arguments_expand_through_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = runner_in(dir.path());
        runner.set_context(
            Context::new(vec![Variable::new("GREETING", "hello")], Vec::new()).expect("context"),
        );
        let out = runner.query("echo", &args(&["${GREETING}-world"])).expect("echo");
        assert_eq!(out, "hello-world");
    }

    #[test]
    fn context_is_injected_into_child_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = runner_in(dir.path());
        runner.set_context(
            Context::new(Vec::new(), vec![Variable::new("REGBUILD_PROBE", "42")]).expect("context"),
        );
        let out = runner
            .query("sh", &args(&["-c", "printf %s \"$REGBUILD_PROBE\""]))
            .expect("sh");
        assert_eq!(out, "42");
    }

    #[test]
    fn children_run_in_tracked_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let mut runner = runner_in(dir.path());
        runner.change_dir(Path::new("sub")).expect("cd");
        let out = runner.query("pwd", &[]).expect("pwd");
        let expected = std::fs::canonicalize(dir.path().join("sub")).expect("canonicalize");
        assert_eq!(PathBuf::from(out), expected);
    }

    #[test]
    fn change_dir_to_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = runner_in(dir.path());
        assert!(matches!(
            runner.change_dir(Path::new("missing")),
            Err(BuildError::Io { .. })
        ));
        assert_eq!(runner.working_dir().expect("cwd"), dir.path());
    }

    #[test]
    fn filesystem_probes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").expect("write");
        std::fs::create_dir(dir.path().join("empty")).expect("mkdir");
        let runner = runner_in(dir.path());
        assert!(runner.file_exists(Path::new("Dockerfile")));
        assert!(!runner.dir_exists(Path::new("Dockerfile")));
        assert!(runner.is_dir_empty(Path::new("empty")).expect("read_dir"));
        assert!(!runner.is_dir_empty(Path::new(".")).expect("read_dir"));
    }

    #[test]
    fn dry_run_does_not_execute() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = ProcessRunner::in_dir(dir.path(), RunnerConfig { dry_run: true });
        runner.execute("false", &[]).expect("dry run never fails");
        assert_eq!(runner.query("echo", &args(&["hi"])).expect("query"), "");
    }

    #[test]
    fn dry_run_enters_directories_that_were_never_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = ProcessRunner::in_dir(dir.path(), RunnerConfig { dry_run: true });
        assert!(runner.dry_run());
        runner.change_dir(Path::new("clone")).expect("dry run cd");
        assert_eq!(runner.working_dir().expect("cwd"), dir.path().join("clone"));
        assert!(!dir.path().join("clone").exists());
    }

    #[test]
    fn dry_run_still_rejects_files_as_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").expect("write");
        let mut runner = ProcessRunner::in_dir(dir.path(), RunnerConfig { dry_run: true });
        assert!(matches!(
            runner.change_dir(Path::new("Dockerfile")),
            Err(BuildError::Io { .. })
        ));
    }

    #[test]
    fn verbatim_arguments_are_not_expanded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let mut runner = runner_in(dir.path());
        runner.set_context(
            Context::new(vec![Variable::new("HOME", "/from/context")], Vec::new()).expect("context"),
        );
        let script = format!("printf %s \"$1\" > '{}'", out.display());
        runner
            .execute_verbatim("sh", &args(&["-c", script.as_str(), "sh", "pa${HOME}ss"]), None)
            .expect("sh");
        assert_eq!(std::fs::read_to_string(&out).expect("read"), "pa${HOME}ss");

        runner
            .execute("sh", &args(&["-c", script.as_str(), "sh", "pa${HOME}ss"]))
            .expect("sh");
        assert_eq!(std::fs::read_to_string(&out).expect("read"), "pa/from/contextss");
    }

    #[test]
    fn displayed_command_is_obfuscated_and_redacted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut runner = runner_in(dir.path());
        runner.set_context(
            Context::new(vec![Variable::sensitive("TOKEN", "t0k3n")], Vec::new()).expect("context"),
        );
        let mask = mask_secrets(vec!["pa55".into()]);
        let shown = runner.display(
            "docker",
            &args(&["login", "-p", "pa55", "--note", "t0k3n"]),
            Some(&mask),
        );
        assert_eq!(shown, "docker login -p ***** --note *****");
    }
}
