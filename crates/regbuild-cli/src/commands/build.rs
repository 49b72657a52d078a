//! `regbuild build`: compile a workflow from flags and run it.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::Args;
use regbuild_common::config::{RunnerConfig, ScanFailurePolicy, WorkflowConfig};
use regbuild_common::constants::{DEFAULT_RECIPE_FILE, DEFAULT_REGISTRY};
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::{BuildNumber, ImageReference, Variable};
use regbuild_core::task::{BuildTarget, Credential, Source};
use regbuild_runtime::build::{ComposeBuildTarget, DockerBuildTarget};
use regbuild_runtime::credential::{PasswordCredential, TokenCredential};
use regbuild_runtime::process::ProcessRunner;
use regbuild_runtime::request::{BuildRequest, SourceTarget};
use regbuild_runtime::workflow::Workflow;
use regbuild_source::archive::ArchiveSource;
use regbuild_source::git::GitSource;
use regbuild_source::local::LocalSource;
use regbuild_source::stdin::StdinSource;

use crate::output;

/// Flags describing one build request, shared by `build` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Clone this git repository.
    #[arg(long, env = "REGBUILD_GIT_URL")]
    pub git_url: Option<String>,

    /// Branch to clone or fetch.
    #[arg(long, env = "REGBUILD_GIT_BRANCH")]
    pub git_branch: Option<String>,

    /// Revision to check out.
    #[arg(long, env = "REGBUILD_GIT_REVISION")]
    pub git_revision: Option<String>,

    /// Build from an existing directory.
    #[arg(long)]
    pub local_dir: Option<PathBuf>,

    /// Download and unpack this tarball.
    #[arg(long)]
    pub archive_url: Option<String>,

    /// Expected SHA-256 of the downloaded tarball.
    #[arg(long)]
    pub archive_sha256: Option<String>,

    /// Read a tarball from standard input.
    #[arg(long)]
    pub stdin: bool,

    /// Directory git, archive, and stdin sources are placed in.
    #[arg(long, default_value = "regbuild-src")]
    pub checkout_dir: PathBuf,

    /// Recipe to build, relative to the source.
    #[arg(long, short = 'f', default_value = DEFAULT_RECIPE_FILE)]
    pub dockerfile: PathBuf,

    /// Build context directory, relative to the source.
    #[arg(long, default_value = ".")]
    pub context_dir: PathBuf,

    /// Image tag to produce; repeatable.
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    /// Build every service of this compose manifest instead of one recipe.
    #[arg(long)]
    pub compose_file: Option<PathBuf>,

    /// Project directory for the compose manifest.
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Build argument `NAME=value`; repeatable.
    #[arg(long = "build-arg")]
    pub build_args: Vec<String>,

    /// Build argument masked in logs; repeatable.
    #[arg(long = "secret-build-arg")]
    pub secret_build_args: Vec<String>,

    /// Always pull newer base images.
    #[arg(long)]
    pub pull: bool,

    /// Build without the layer cache.
    #[arg(long)]
    pub no_cache: bool,

    /// User variable `NAME=value`; repeatable.
    #[arg(long = "var")]
    pub vars: Vec<String>,

    /// User variable masked in logs; repeatable.
    #[arg(long = "secret-var")]
    pub secret_vars: Vec<String>,

    /// Registry images are tagged for and pushed to.
    #[arg(long, env = "REGBUILD_REGISTRY")]
    pub registry: Option<String>,

    /// Registry username.
    #[arg(long, env = "REGBUILD_USERNAME")]
    pub username: Option<String>,

    /// Registry password.
    #[arg(long, env = "REGBUILD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Registry access token.
    #[arg(long, env = "REGBUILD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Push images after every build of a source succeeds.
    #[arg(long, env = "REGBUILD_PUSH")]
    pub push: bool,

    /// Build number; a random UUID when omitted.
    #[arg(long, env = "REGBUILD_BUILD_NUMBER")]
    pub build_number: Option<String>,

    /// What to do when a dependency scan fails: `continue` or `abort`.
    #[arg(long, env = "REGBUILD_SCAN_FAILURE", default_value_t = ScanFailurePolicy::Abort)]
    pub scan_failure: ScanFailurePolicy,
}

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// The build request.
    #[command(flatten)]
    pub request: RequestArgs,

    /// Log commands instead of running them.
    #[arg(long, env = "REGBUILD_DRY_RUN")]
    pub dry_run: bool,
}

/// A request checked and assembled from flags, ready to compile.
pub struct PreparedBuild {
    /// Build number for this run.
    pub build_number: BuildNumber,
    /// Caller-supplied variables.
    pub user_vars: Vec<Variable>,
    /// Sources, builds, and credentials.
    pub request: BuildRequest,
    /// Whether to push.
    pub push: bool,
    /// Scheduler settings.
    pub config: WorkflowConfig,
}

impl PreparedBuild {
    /// Compiles the workflow.
    ///
    /// # Errors
    ///
    /// Returns configuration and resolution errors from compilation.
    pub fn compile(&self) -> Result<Workflow> {
        Workflow::compile(
            &self.build_number,
            self.user_vars.clone(),
            &self.request,
            self.push,
            &self.config,
        )
    }
}

/// Turns flags into a build request.
///
/// # Errors
///
/// Returns [`BuildError::Configuration`] for missing or mutually exclusive
/// flags and malformed `NAME=value` assignments.
pub fn prepare(args: &RequestArgs) -> Result<PreparedBuild> {
    let source = source(args)?;
    let build = build_target(args)?;
    let credentials = credentials(args)?;

    let mut user_vars = parse_assignments(&args.vars, false)?;
    user_vars.extend(parse_assignments(&args.secret_vars, true)?);

    let build_number = args
        .build_number
        .clone()
        .map_or_else(BuildNumber::generate, BuildNumber::new);

    Ok(PreparedBuild {
        build_number,
        user_vars,
        request: BuildRequest {
            registry: args.registry.clone(),
            credentials,
            targets: vec![SourceTarget::new(source, vec![build])],
        },
        push: args.push,
        config: WorkflowConfig {
            scan_failure: args.scan_failure,
        },
    })
}

fn source(args: &RequestArgs) -> Result<Rc<dyn Source>> {
    let selected = [
        args.git_url.is_some(),
        args.local_dir.is_some(),
        args.archive_url.is_some(),
        args.stdin,
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if selected != 1 {
        return Err(BuildError::configuration(
            "source",
            "exactly one of --git-url, --local-dir, --archive-url, --stdin is required",
        ));
    }
    if args.git_url.is_none() && (args.git_branch.is_some() || args.git_revision.is_some()) {
        return Err(BuildError::configuration(
            "git-branch",
            "--git-branch and --git-revision require --git-url",
        ));
    }
    if args.archive_url.is_none() && args.archive_sha256.is_some() {
        return Err(BuildError::configuration(
            "archive-sha256",
            "--archive-sha256 requires --archive-url",
        ));
    }

    if let Some(url) = &args.git_url {
        let mut git = GitSource::new(url.clone(), args.checkout_dir.clone());
        if let Some(branch) = &args.git_branch {
            git = git.with_branch(branch.clone());
        }
        if let Some(revision) = &args.git_revision {
            git = git.with_revision(revision.clone());
        }
        return Ok(Rc::new(git));
    }
    if let Some(dir) = &args.local_dir {
        return Ok(Rc::new(LocalSource::new(dir.clone())));
    }
    if let Some(url) = &args.archive_url {
        let mut archive = ArchiveSource::new(url.clone(), args.checkout_dir.clone());
        if let Some(digest) = &args.archive_sha256 {
            archive = archive.with_sha256(digest.clone());
        }
        return Ok(Rc::new(archive));
    }
    Ok(Rc::new(StdinSource::new(args.checkout_dir.clone())))
}

fn build_target(args: &RequestArgs) -> Result<Rc<dyn BuildTarget>> {
    if let Some(manifest) = &args.compose_file {
        if !args.tags.is_empty() {
            return Err(BuildError::configuration(
                "compose-file",
                "--compose-file cannot be combined with --tag; images come from the manifest",
            ));
        }
        let mut compose = ComposeBuildTarget::new(manifest.clone());
        if let Some(dir) = &args.project_dir {
            compose = compose.with_project_dir(dir.clone());
        }
        return Ok(Rc::new(compose));
    }

    if args.project_dir.is_some() {
        return Err(BuildError::configuration(
            "project-dir",
            "--project-dir requires --compose-file",
        ));
    }
    if args.tags.is_empty() {
        return Err(BuildError::configuration(
            "tag",
            "at least one --tag is required for a Dockerfile build",
        ));
    }
    let registry = args.registry.as_deref().unwrap_or_default();
    let images = args
        .tags
        .iter()
        .map(|tag| ImageReference::qualify(tag, registry))
        .collect();

    let mut build_args = parse_assignments(&args.build_args, false)?;
    build_args.extend(parse_assignments(&args.secret_build_args, true)?);

    Ok(Rc::new(
        DockerBuildTarget::new(images)
            .with_recipe(args.dockerfile.clone())
            .with_context_dir(args.context_dir.clone())
            .with_build_args(build_args)
            .with_pull(args.pull)
            .with_no_cache(args.no_cache),
    ))
}

fn credentials(args: &RequestArgs) -> Result<Vec<Rc<dyn Credential>>> {
    let registry = args
        .registry
        .clone()
        .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
    match (&args.username, &args.password, &args.token) {
        (None, None, None) => Ok(Vec::new()),
        (Some(username), Some(password), None) => {
            let credential: Rc<dyn Credential> = Rc::new(PasswordCredential::new(
                registry,
                username.clone(),
                password.clone(),
            ));
            Ok(vec![credential])
        }
        (None, None, Some(token)) => {
            let credential: Rc<dyn Credential> = Rc::new(TokenCredential::new(registry, token.clone()));
            Ok(vec![credential])
        }
        (_, _, Some(_)) => Err(BuildError::configuration(
            "token",
            "--token cannot be combined with --username or --password",
        )),
        _ => Err(BuildError::configuration(
            "username",
            "--username and --password must be given together",
        )),
    }
}

fn parse_assignments(items: &[String], sensitive: bool) -> Result<Vec<Variable>> {
    items
        .iter()
        .map(|item| Variable::parse_assignment(item, sensitive))
        .collect()
}

/// Executes the `build` command.
///
/// Dependencies found before a failure are still printed.
///
/// # Errors
///
/// Returns an error if the request is invalid or any step fails.
pub fn execute(args: &BuildArgs) -> anyhow::Result<()> {
    let prepared = prepare(&args.request).context("invalid build request")?;
    let mut workflow = prepared.compile().context("failed to compile workflow")?;
    let mut runner = ProcessRunner::new(RunnerConfig {
        dry_run: args.dry_run,
    })?;

    let result = workflow.run(&mut runner);
    output::print_json(&workflow.output().dependencies)?;
    result.with_context(|| format!("build {} failed", prepared.build_number))
}
