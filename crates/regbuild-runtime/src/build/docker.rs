//! Single-recipe builds with `docker build`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regbuild_common::constants::{
    DEFAULT_RECIPE_FILE, EXPORT_DOCKER_BUILD_CONTEXT, EXPORT_DOCKERFILE_PATH,
};
use regbuild_common::error::Result;
use regbuild_common::types::{ImageDependencies, Variable};
use regbuild_compose::recipe;
use regbuild_core::host::expand_host_env;
use regbuild_core::runner::{Runner, mask_secrets};
use regbuild_core::task::BuildTarget;

const DOCKER: &str = "docker";
const BUILD: &str = "build";
const PUSH: &str = "push";
const FILE_FLAG: &str = "--file";
const TAG_FLAG: &str = "--tag";
const BUILD_ARG_FLAG: &str = "--build-arg";
const PULL_FLAG: &str = "--pull";
const NO_CACHE_FLAG: &str = "--no-cache";

/// Builds one recipe into one or more tagged images.
#[derive(Debug, Clone)]
pub struct DockerBuildTarget {
    recipe: PathBuf,
    context_dir: PathBuf,
    images: Vec<String>,
    build_args: Vec<Variable>,
    pull: bool,
    no_cache: bool,
}

impl DockerBuildTarget {
    /// Builds `Dockerfile` in the current directory, tagged as `images`.
    #[must_use]
    pub fn new(images: Vec<String>) -> Self {
        Self {
            recipe: PathBuf::from(DEFAULT_RECIPE_FILE),
            context_dir: PathBuf::from("."),
            images,
            build_args: Vec::new(),
            pull: false,
            no_cache: false,
        }
    }

    /// Uses another recipe file, relative to the source directory.
    #[must_use]
    pub fn with_recipe(mut self, recipe: impl Into<PathBuf>) -> Self {
        self.recipe = recipe.into();
        self
    }

    /// Uses another build context directory.
    #[must_use]
    pub fn with_context_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context_dir = dir.into();
        self
    }

    /// Passes build arguments; sensitive ones are masked in logs.
    #[must_use]
    pub fn with_build_args(mut self, args: Vec<Variable>) -> Self {
        self.build_args = args;
        self
    }

    /// Always pulls newer base images.
    #[must_use]
    pub const fn with_pull(mut self, pull: bool) -> Self {
        self.pull = pull;
        self
    }

    /// Disables the layer cache.
    #[must_use]
    pub const fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    fn build_args_in(&self, runner: &dyn Runner) -> BTreeMap<String, String> {
        self.build_args
            .iter()
            .map(|arg| (arg.name.clone(), expand_arg(runner, arg)))
            .collect()
    }

    /// Values of sensitive build arguments as the tool will receive them.
    fn secrets_in(&self, runner: &dyn Runner) -> Vec<String> {
        self.build_args
            .iter()
            .filter(|arg| arg.sensitive)
            .map(|arg| expand_arg(runner, arg))
            .collect()
    }

    fn build_command(&self) -> Vec<String> {
        let mut args = vec![
            BUILD.to_string(),
            FILE_FLAG.to_string(),
            path_arg(&self.recipe),
        ];
        for image in &self.images {
            args.extend([TAG_FLAG.to_string(), image.clone()]);
        }
        for arg in &self.build_args {
            args.extend([BUILD_ARG_FLAG.to_string(), format!("{}={}", arg.name, arg.value)]);
        }
        if self.pull {
            args.push(PULL_FLAG.to_string());
        }
        if self.no_cache {
            args.push(NO_CACHE_FLAG.to_string());
        }
        args.push(path_arg(&self.context_dir));
        args
    }
}

impl BuildTarget for DockerBuildTarget {
    fn build(&self, runner: &mut dyn Runner) -> Result<()> {
        tracing::info!(images = ?self.images, recipe = %self.recipe.display(), "building image");
        let mask = mask_secrets(self.secrets_in(runner));
        runner.execute_with_obfuscation(DOCKER, &self.build_command(), Some(&mask))
    }

    fn push(&self, runner: &mut dyn Runner) -> Result<()> {
        for image in &self.images {
            tracing::info!(image = %image, "pushing image");
            runner.execute(DOCKER, &[PUSH.to_string(), image.clone()])?;
        }
        Ok(())
    }

    fn scan_for_dependencies(&self, runner: &mut dyn Runner) -> Result<Vec<ImageDependencies>> {
        let path = super::locate(runner, &self.recipe)?;
        let deps = recipe::resolve_file(&path, &self.build_args_in(runner))?;
        tracing::debug!(recipe = %path.display(), runtime = %deps.runtime, "scanned recipe");
        Ok(self
            .images
            .iter()
            .map(|image| deps.for_image(runner.context().expand(image)))
            .collect())
    }

    fn export(&self) -> Vec<Variable> {
        vec![
            Variable::new(EXPORT_DOCKERFILE_PATH, path_arg(&self.recipe)),
            Variable::new(EXPORT_DOCKER_BUILD_CONTEXT, path_arg(&self.context_dir)),
        ]
    }

    fn describe(&self) -> String {
        self.images.join(", ")
    }
}

fn expand_arg(runner: &dyn Runner, arg: &Variable) -> String {
    expand_host_env(&runner.context().expand(&arg.value))
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
