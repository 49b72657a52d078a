//! The execution capability every task runs through.
//!
//! The scheduler repoints the runner at each task's [`Context`] before
//! invoking it, so arguments and environments always come from the scope the
//! task was compiled against.

use std::io::Read;
use std::path::{Path, PathBuf};

use regbuild_common::error::Result;

use crate::context::Context;

/// Maps the real arguments of a command to the ones shown in logs.
///
/// Only the displayed form is affected; the command still runs with the
/// original arguments.
pub type Obfuscator<'a> = &'a dyn Fn(&[String]) -> Vec<String>;

/// Process, filesystem, and stdin access for tasks.
pub trait Runner {
    /// The context of the task currently running.
    fn context(&self) -> &Context;

    /// Repoints the runner at another context.
    fn set_context(&mut self, context: Context);

    /// Runs an external command, logging arguments through `obfuscate`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ExternalTool`](regbuild_common::error::BuildError::ExternalTool)
    /// if the command cannot be spawned or exits unsuccessfully.
    fn execute_with_obfuscation(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()>;

    /// Runs an external command with `args` passed exactly as given.
    ///
    /// Neither the context nor the host environment is expanded, so literal
    /// secrets reach the tool unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`Runner::execute_with_obfuscation`].
    fn execute_verbatim(
        &mut self,
        program: &str,
        args: &[String],
        obfuscate: Option<Obfuscator<'_>>,
    ) -> Result<()>;

    /// Runs an external command.
    ///
    /// # Errors
    ///
    /// Same as [`Runner::execute_with_obfuscation`].
    fn execute(&mut self, program: &str, args: &[String]) -> Result<()> {
        self.execute_with_obfuscation(program, args, None)
    }

    /// Runs an external command and returns its trimmed stdout.
    ///
    /// # Errors
    ///
    /// Same as [`Runner::execute_with_obfuscation`].
    fn query(&mut self, program: &str, args: &[String]) -> Result<String>;

    /// Whether commands are only logged instead of executed.
    ///
    /// Sources consult this to skip downloads and extraction.
    fn dry_run(&self) -> bool {
        false
    }

    /// Directory commands currently run in.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be determined.
    fn working_dir(&self) -> Result<PathBuf>;

    /// Changes the directory commands run in.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `path` is not an existing directory. In a
    /// dry run a directory that was never created is accepted.
    fn change_dir(&mut self, path: &Path) -> Result<()>;

    /// Whether `path` is an existing directory.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Whether `path` is an existing regular file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Whether the directory at `path` has no entries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be read.
    fn is_dir_empty(&self, path: &Path) -> Result<bool>;

    /// The stream piped into the build, for pass-through sources.
    fn stdin(&mut self) -> Box<dyn Read + '_>;
}

/// Builds an obfuscator that masks every occurrence of `secrets`.
pub fn mask_secrets(secrets: Vec<String>) -> impl Fn(&[String]) -> Vec<String> {
    move |args: &[String]| {
        args.iter()
            .map(|arg| {
                secrets
                    .iter()
                    .filter(|s| !s.is_empty())
                    .fold(arg.clone(), |acc, secret| {
                        acc.replace(secret.as_str(), regbuild_common::constants::REDACTED)
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secrets_only_touches_matching_arguments() {
        let mask = mask_secrets(vec!["hunter2".into(), String::new()]);
        let shown = mask(&["-u".into(), "bob".into(), "--password=hunter2".into()]);
        assert_eq!(shown, vec!["-u", "bob", "--password=*****"]);
    }
}
