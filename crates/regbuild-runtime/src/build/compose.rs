//! Multi-service builds with `docker-compose`.

use std::path::PathBuf;

use regbuild_common::constants::{
    DEFAULT_MANIFEST_FILE, EXPORT_DOCKER_COMPOSE_FILE, EXPORT_DOCKER_COMPOSE_PROJECT_DIR,
};
use regbuild_common::error::Result;
use regbuild_common::types::{ImageDependencies, Variable};
use regbuild_compose::manifest::resolve_manifest_file;
use regbuild_core::runner::Runner;
use regbuild_core::task::BuildTarget;

const COMPOSE: &str = "docker-compose";
const FILE_FLAG: &str = "--file";
const PROJECT_DIR_FLAG: &str = "--project-directory";
const BUILD: &str = "build";
const PUSH: &str = "push";

/// Builds every service of a compose manifest.
#[derive(Debug, Clone)]
pub struct ComposeBuildTarget {
    manifest: PathBuf,
    project_dir: Option<PathBuf>,
}

impl ComposeBuildTarget {
    /// Builds the manifest at `manifest`, relative to the source directory.
    #[must_use]
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            project_dir: None,
        }
    }

    /// Resolves service paths against `dir` instead of the manifest's directory.
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    fn command(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec![FILE_FLAG.to_string(), self.manifest.display().to_string()];
        if let Some(dir) = &self.project_dir {
            args.extend([PROJECT_DIR_FLAG.to_string(), dir.display().to_string()]);
        }
        args.push(subcommand.to_string());
        args
    }
}

impl Default for ComposeBuildTarget {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_FILE)
    }
}

impl BuildTarget for ComposeBuildTarget {
    fn build(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(manifest = %self.manifest.display(), "building services");
        runner.execute(COMPOSE, &self.command(BUILD))
    }

    fn push(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(manifest = %self.manifest.display(), "pushing services");
        runner.execute(COMPOSE, &self.command(PUSH))
    }

    fn scan_for_dependencies(&self, runner: &mut dyn Runner) -> Result<Vec<ImageDependencies>> {
        let manifest = super::locate(runner, &self.manifest)?;
        let project_dir = match &self.project_dir {
            Some(dir) => Some(super::locate(runner, dir)?),
            None => None,
        };
        resolve_manifest_file(&manifest, project_dir.as_deref(), runner.context())
    }

    fn export(&self) -> Vec<Variable> {
        let project_dir = self.project_dir.clone().unwrap_or_else(|| {
            self.manifest
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
        });
        vec![
            Variable::new(EXPORT_DOCKER_COMPOSE_FILE, self.manifest.display().to_string()),
            Variable::new(
                EXPORT_DOCKER_COMPOSE_PROJECT_DIR,
                project_dir.display().to_string(),
            ),
        ]
    }

    fn describe(&self) -> String {
        format!("compose({})", self.manifest.display())
    }
}

#[cfg(test)]
mod tests {
    use regbuild_common::config::RunnerConfig;
    use regbuild_core::context::Context;

    use super::*;
    use crate::process::ProcessRunner;

    #[test]
    fn commands_include_project_directory() {
        let target = ComposeBuildTarget::new("deploy/compose.yml").with_project_dir(".");
        assert_eq!(
            target.command(BUILD),
            vec!["--file", "deploy/compose.yml", "--project-directory", ".", "build"]
        );
        assert_eq!(ComposeBuildTarget::default().command(PUSH), vec!["--file", "docker-compose.yml", "push"]);
    }

    #[test]
    fn scan_resolves_every_service() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("web")).expect("mkdir");
        std::fs::write(dir.path().join("web/Dockerfile"), "FROM node AS b\nFROM nginx\n")
            .expect("write recipe");
        std::fs::write(
            dir.path().join("docker-compose.yml"),
            "services:\n  web:\n    image: ${REGISTRY}/web\n    build: web\n",
        )
        .expect("write manifest");
        let mut runner = ProcessRunner::in_dir(dir.path(), RunnerConfig::default());
        runner.set_context(
            Context::new(Vec::new(), vec![Variable::new("REGISTRY", "reg.io")]).expect("context"),
        );

        let deps = ComposeBuildTarget::default()
            .scan_for_dependencies(&mut runner)
            .expect("scan");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].image, "reg.io/web");
        assert_eq!(deps[0].runtime, "nginx");
    }

    #[test]
    fn export_defaults_project_dir_to_manifest_parent() {
        let vars = ComposeBuildTarget::new("deploy/compose.yml").export();
        assert_eq!(vars[1], Variable::new(EXPORT_DOCKER_COMPOSE_PROJECT_DIR, "deploy"));
    }
}
