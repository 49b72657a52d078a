//! Compiles a [`BuildRequest`] into an ordered task list and runs it.
//!
//! Compilation fixes the order once: logins, then for every source its
//! obtain step, a scan and a build per target, the source's deferred pushes
//! and finally its return step. Each step carries the [`Context`] it was
//! compiled against; the runner is repointed at that context before the
//! step runs. Running stops at the first failure. Dependencies collected by
//! the scans that did run stay available through [`Workflow::output`].

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use regbuild_common::config::{ScanFailurePolicy, WorkflowConfig};
use regbuild_common::constants::{
    EXPORT_BUILD_NUMBER, EXPORT_BUILD_TIMESTAMP, EXPORT_DOCKER_REGISTRY, EXPORT_PUSH_ON_SUCCESS,
};
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::{BuildNumber, ImageDependencies, Variable, format_build_timestamp};
use regbuild_core::context::Context;
use regbuild_core::runner::Runner;
use regbuild_core::task::{BuildTarget, Credential, Source};
use serde::Serialize;

use crate::request::BuildRequest;

/// One unit of work in a compiled workflow.
#[derive(Clone)]
pub enum Task {
    /// Registry login.
    Authenticate(Rc<dyn Credential>),
    /// Source acquisition.
    Obtain(Rc<dyn Source>),
    /// Dependency scan; the only step that writes to the output.
    Scan(Rc<dyn BuildTarget>),
    /// Image build.
    Build(Rc<dyn BuildTarget>),
    /// Image push.
    Push(Rc<dyn BuildTarget>),
    /// Source cleanup.
    Return(Rc<dyn Source>),
}

impl Task {
    /// Short verb naming the kind of step.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::Obtain(_) => "obtain",
            Self::Scan(_) => "scan",
            Self::Build(_) => "build",
            Self::Push(_) => "push",
            Self::Return(_) => "return",
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::Authenticate(credential) => credential.describe(),
            Self::Obtain(source) | Self::Return(source) => source.describe(),
            Self::Scan(build) | Self::Build(build) | Self::Push(build) => build.describe(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.subject())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Lifecycle of a compiled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Not run yet.
    Pending,
    /// Currently running.
    Running,
    /// Finished successfully.
    Done,
    /// Returned an error; nothing after it ran.
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Description of a compiled step, for plans and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Position in the workflow.
    pub index: usize,
    /// `kind(subject)`.
    pub description: String,
    /// Current state.
    pub state: TaskState,
}

/// What the scan steps found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputContext {
    /// One record per produced image, in scan order.
    pub dependencies: Vec<ImageDependencies>,
}

struct Item {
    task: Task,
    context: Context,
    state: TaskState,
}

/// A compiled, ordered build.
pub struct Workflow {
    build_number: BuildNumber,
    root: Context,
    items: Vec<Item>,
    output: OutputContext,
    config: WorkflowConfig,
}

impl Workflow {
    /// Compiles `request` into an ordered workflow.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the request is invalid, and a
    /// resolution error if any scope's variables form a cycle or nest too
    /// deeply. Nothing runs before compilation succeeds.
    pub fn compile(
        build_number: &BuildNumber,
        user_vars: Vec<Variable>,
        request: &BuildRequest,
        push: bool,
        config: &WorkflowConfig,
    ) -> Result<Self> {
        request.validate(push)?;

        let system = vec![
            Variable::new(EXPORT_BUILD_NUMBER, build_number.as_str()),
            Variable::new(EXPORT_BUILD_TIMESTAMP, format_build_timestamp(Utc::now())),
            Variable::new(
                EXPORT_DOCKER_REGISTRY,
                request.registry.clone().unwrap_or_default(),
            ),
            Variable::new(EXPORT_PUSH_ON_SUCCESS, push.to_string()),
        ];
        let root = Context::new(user_vars, system)?;

        let mut items = Vec::new();
        let mut schedule = |task: Task, context: &Context| {
            items.push(Item {
                task,
                context: context.clone(),
                state: TaskState::Pending,
            });
        };

        for credential in &request.credentials {
            schedule(Task::Authenticate(Rc::clone(credential)), &root);
        }

        for target in &request.targets {
            let source_context = root.append(&target.source.export())?;
            schedule(Task::Obtain(Rc::clone(&target.source)), &source_context);

            let mut deferred = Vec::new();
            for build in &target.builds {
                let build_context = source_context.append(&build.export())?;
                schedule(Task::Scan(Rc::clone(build)), &build_context);
                schedule(Task::Build(Rc::clone(build)), &build_context);
                if push {
                    deferred.push((Rc::clone(build), build_context));
                }
            }
            for (build, build_context) in deferred {
                schedule(Task::Push(build), &build_context);
            }

            schedule(Task::Return(Rc::clone(&target.source)), &source_context);
        }

        tracing::info!(
            build_number = %build_number,
            steps = items.len(),
            push,
            "compiled workflow"
        );

        Ok(Self {
            build_number: build_number.clone(),
            root,
            items,
            output: OutputContext::default(),
            config: config.clone(),
        })
    }

    /// Runs every step in order. A workflow runs at most once.
    ///
    /// # Errors
    ///
    /// Returns the first step error unchanged. The failing step is marked
    /// [`TaskState::Failed`] and later steps stay pending. Returns
    /// [`BuildError::Configuration`] if any step already left
    /// [`TaskState::Pending`], without running anything.
    pub fn run(&mut self, runner: &mut dyn Runner) -> Result<()> {
        if self.items.iter().any(|item| item.state != TaskState::Pending) {
            return Err(BuildError::configuration("workflow", "already run"));
        }
        for (index, item) in self.items.iter_mut().enumerate() {
            runner.set_context(item.context.clone());
            item.state = TaskState::Running;
            tracing::info!(build_number = %self.build_number, step = index, task = %item.task, "running step");

            let result = match &item.task {
                Task::Authenticate(credential) => credential.authenticate(runner),
                Task::Obtain(source) => source.obtain(runner),
                Task::Scan(build) => match build.scan_for_dependencies(runner) {
                    Ok(deps) => {
                        self.output.dependencies.extend(deps);
                        Ok(())
                    }
                    Err(e) if self.config.scan_failure == ScanFailurePolicy::Continue => {
                        tracing::warn!(step = index, task = %item.task, error = %e, "scan failed, continuing");
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                Task::Build(build) => build.build(runner),
                Task::Push(build) => build.push(runner),
                Task::Return(source) => source.return_source(runner),
            };

            if let Err(e) = result {
                item.state = TaskState::Failed;
                tracing::error!(build_number = %self.build_number, step = index, task = %item.task, error = %e, "step failed");
                return Err(e);
            }
            item.state = TaskState::Done;
        }

        tracing::info!(build_number = %self.build_number, images = self.output.dependencies.len(), "workflow finished");
        Ok(())
    }

    /// Describes every compiled step with its state.
    pub fn steps(&self) -> Vec<Step> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| Step {
                index,
                description: item.task.to_string(),
                state: item.state,
            })
            .collect()
    }

    /// Dependencies collected so far.
    pub const fn output(&self) -> &OutputContext {
        &self.output
    }

    /// The scope authentication steps run in.
    pub const fn root_context(&self) -> &Context {
        &self.root
    }

    /// The build number this workflow was compiled for.
    pub const fn build_number(&self) -> &BuildNumber {
        &self.build_number
    }

    /// Number of compiled steps.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no steps were compiled.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("build_number", &self.build_number)
            .field("steps", &self.steps())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
