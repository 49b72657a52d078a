//! `regbuild scan`: resolve base images of a local recipe or manifest.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use regbuild_common::constants::DEFAULT_RECIPE_FILE;
use regbuild_common::types::{ImageDependencies, Variable};
use regbuild_compose::graph::LineageGraph;
use regbuild_compose::{manifest, recipe};
use regbuild_core::context::Context;
use serde::Serialize;

use crate::output;

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Recipe or compose manifest to scan.
    #[arg(default_value = DEFAULT_RECIPE_FILE)]
    pub file: PathBuf,

    /// Treat the file as a compose manifest; implied by `.yml`/`.yaml`.
    #[arg(long)]
    pub compose: bool,

    /// Image name reported for a single recipe.
    #[arg(long, short = 't', default_value = "image")]
    pub tag: String,

    /// Project directory for a compose manifest.
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Build argument `NAME=value`; repeatable.
    #[arg(long = "build-arg")]
    pub build_args: Vec<String>,

    /// Variable `NAME=value` used to expand manifest paths; repeatable.
    #[arg(long = "var")]
    pub vars: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    dependencies: Vec<ImageDependencies>,
    build_order: Vec<String>,
    /// Produced images mapped to the produced images built on them.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    dependents: BTreeMap<String, Vec<String>>,
}

impl ScanReport {
    fn new(dependencies: Vec<ImageDependencies>) -> anyhow::Result<Self> {
        let lineage = LineageGraph::from_dependencies(&dependencies);
        let build_order = lineage
            .build_order()
            .context("produced images depend on each other")?;
        let dependents = build_order
            .iter()
            .filter_map(|image| {
                let children = lineage.dependents_of(image);
                (!children.is_empty()).then(|| (image.clone(), children))
            })
            .collect();
        Ok(Self {
            dependencies,
            build_order,
            dependents,
        })
    }
}

impl ScanArgs {
    fn is_manifest(&self) -> bool {
        self.compose
            || self
                .file
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
    }
}

/// Executes the `scan` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or resolved.
pub fn execute(args: &ScanArgs) -> anyhow::Result<()> {
    output::print_json(&ScanReport::new(scan(args)?)?)
}

fn scan(args: &ScanArgs) -> anyhow::Result<Vec<ImageDependencies>> {
    let display = args.file.display();
    if args.is_manifest() {
        let vars = args
            .vars
            .iter()
            .map(|v| Variable::parse_assignment(v, false))
            .collect::<Result<Vec<_>, _>>()?;
        let context = Context::new(vars, Vec::new())?;
        return manifest::resolve_manifest_file(&args.file, args.project_dir.as_deref(), &context)
            .with_context(|| format!("failed to scan manifest {display}"));
    }

    let build_args = parse_build_args(&args.build_args)?;
    let deps = recipe::resolve_file(&args.file, &build_args)
        .with_context(|| format!("failed to scan recipe {display}"))?;
    Ok(vec![deps.for_image(args.tag.clone())])
}

fn parse_build_args(items: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    items
        .iter()
        .map(|item| {
            Variable::parse_assignment(item, false)
                .map(|v| (v.name, v.value))
                .map_err(anyhow::Error::from)
        })
        .collect()
}
