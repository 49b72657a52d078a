//! Lineage across a multi-service manifest.
//!
//! Every service with a `build` section is resolved through its own recipe.
//! Paths are expanded through the caller's [`Context`] first and the host
//! environment second, then taken relative to the project directory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use regbuild_common::constants::DEFAULT_RECIPE_FILE;
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::ImageDependencies;
use regbuild_core::context::Context;
use regbuild_core::host::expand_host_env;
use serde::Deserialize;

use crate::recipe;

/// Root of a multi-service manifest. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Services keyed by name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
}

/// A single service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSpec {
    /// Image the service produces or runs.
    #[serde(default)]
    pub image: Option<String>,
    /// How to build the image; absent for pull-only services.
    #[serde(default)]
    pub build: Option<BuildSpec>,
}

/// The `build` section: a bare context directory or a structured form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    /// Build context directory only.
    Context(String),
    /// Context directory, recipe filename, and build arguments.
    Full {
        /// Build context directory.
        #[serde(default)]
        context: Option<String>,
        /// Recipe filename relative to the context.
        #[serde(default)]
        dockerfile: Option<String>,
        /// Build arguments.
        #[serde(default)]
        args: BuildArgs,
    },
}

/// Build arguments as a map or as a list of `KEY=value` strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BuildArgs {
    /// Key-value map.
    Map(HashMap<String, Option<String>>),
    /// `KEY=value` list.
    List(Vec<String>),
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self::Map(HashMap::new())
    }
}

impl BuildArgs {
    /// Converts to a map; entries without a value are dropped.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        match self {
            Self::Map(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
                .collect(),
            Self::List(list) => list
                .iter()
                .filter_map(|s| s.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl BuildSpec {
    fn context_dir(&self) -> &str {
        match self {
            Self::Context(dir) => dir,
            Self::Full { context, .. } => context.as_deref().unwrap_or("."),
        }
    }

    fn recipe_file(&self) -> &str {
        match self {
            Self::Full {
                dockerfile: Some(file),
                ..
            } => file,
            _ => DEFAULT_RECIPE_FILE,
        }
    }

    fn build_args(&self) -> BTreeMap<String, String> {
        match self {
            Self::Context(_) => BTreeMap::new(),
            Self::Full { args, .. } => args.to_map(),
        }
    }
}

/// Parses manifest text.
///
/// # Errors
///
/// Returns a parse error if the YAML is malformed.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    serde_yaml::from_str(content).map_err(|e| BuildError::parse("<manifest>", e.to_string()))
}

/// Resolves the manifest at `path`.
///
/// Recipe paths are relative to `project_dir`, which defaults to the
/// manifest's own directory.
///
/// # Errors
///
/// Returns an I/O error if the manifest cannot be read, a parse error if it
/// is malformed, and [`BuildError::Service`] if any service fails.
pub fn resolve_manifest_file(
    path: &Path,
    project_dir: Option<&Path>,
    context: &Context,
) -> Result<Vec<ImageDependencies>> {
    tracing::info!(path = %path.display(), "resolving manifest");
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let manifest = parse_manifest(&content)?;
    let default_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    resolve_manifest(&manifest, project_dir.unwrap_or(default_dir), context)
}

/// Resolves every buildable service of a parsed manifest.
///
/// Returns one record per distinct identity; when two services share an
/// identity, the first in name order wins.
///
/// # Errors
///
/// Returns [`BuildError::Service`] wrapping the first failing service's
/// recipe path.
pub fn resolve_manifest(
    manifest: &Manifest,
    project_dir: &Path,
    context: &Context,
) -> Result<Vec<ImageDependencies>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    for (name, service) in &manifest.services {
        let Some(build) = &service.build else {
            tracing::debug!(service = %name, "service has no build section, skipping");
            continue;
        };

        let identity = service
            .image
            .as_deref()
            .map_or_else(|| name.clone(), |image| expand(context, image));
        if !seen.insert(identity.clone()) {
            tracing::warn!(service = %name, image = %identity, "duplicate image identity, skipping");
            continue;
        }

        let recipe_path = recipe_path(project_dir, build, context);
        let deps = recipe::resolve_file(&recipe_path, &build.build_args()).map_err(|e| {
            BuildError::Service {
                path: recipe_path.clone(),
                source: Box::new(e),
            }
        })?;
        tracing::debug!(service = %name, runtime = %deps.runtime, "resolved service");
        out.push(deps.for_image(identity));
    }

    Ok(out)
}

fn recipe_path(project_dir: &Path, build: &BuildSpec, context: &Context) -> PathBuf {
    let context_dir = expand(context, build.context_dir());
    let recipe_file = expand(context, build.recipe_file());
    project_dir.join(context_dir).join(recipe_file)
}

fn expand(context: &Context, value: &str) -> String {
    expand_host_env(&context.expand(value))
}
