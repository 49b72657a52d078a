//! Runtime and build-time lineage of a single recipe.
//!
//! Stages are walked in file order. A `FROM` naming an earlier stage alias
//! resolves to that stage's origin image; any other token is itself an
//! origin. The origin of the last stage is the runtime dependency, every
//! other distinct origin is a build-time dependency.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::ImageDependencies;
use regbuild_core::reduce::expand_with;

use crate::parser::{self, ast::Recipe};

/// Base images found in one recipe, before an identity is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDependencies {
    /// Origin of the final stage.
    pub runtime: String,
    /// Origins of every other stage.
    pub buildtime: BTreeSet<String>,
}

impl RecipeDependencies {
    /// Attaches the produced image's identity.
    #[must_use]
    pub fn for_image(&self, image: impl Into<String>) -> ImageDependencies {
        ImageDependencies {
            image: image.into(),
            runtime: self.runtime.clone(),
            buildtime: self.buildtime.clone(),
        }
    }
}

/// Resolves lineage from a parsed recipe.
///
/// `build_args` override the defaults of global `ARG`s referenced by
/// `FROM` lines.
///
/// # Errors
///
/// Returns a parse error if the recipe has no stage.
pub fn resolve(recipe: &Recipe, build_args: &BTreeMap<String, String>) -> Result<RecipeDependencies> {
    let declared: HashMap<&str, Option<&str>> = recipe
        .global_args
        .iter()
        .map(|arg| (arg.name.as_str(), arg.default.as_deref()))
        .collect();

    let mut aliases: HashMap<String, String> = HashMap::new();
    let mut origins: BTreeSet<String> = BTreeSet::new();
    let mut current: Option<String> = None;

    for stage in &recipe.stages {
        let token = substitute_args(&stage.image, &declared, build_args);
        let origin = match aliases.get(&token.to_ascii_lowercase()) {
            Some(origin) => origin.clone(),
            None => {
                let _ = origins.insert(token.clone());
                token
            }
        };
        if let Some(alias) = &stage.alias {
            let _ = aliases.insert(alias.to_ascii_lowercase(), origin.clone());
        }
        tracing::trace!(image = %stage.image, origin = %origin, "resolved stage");
        current = Some(origin);
    }

    let Some(runtime) = current else {
        return Err(BuildError::parse("", "recipe has no FROM directive"));
    };
    let _ = origins.remove(&runtime);

    Ok(RecipeDependencies {
        runtime,
        buildtime: origins,
    })
}

/// Parses and resolves a recipe stream.
///
/// # Errors
///
/// Returns I/O errors reading the stream and parse errors from the recipe.
pub fn resolve_reader(
    reader: impl Read,
    build_args: &BTreeMap<String, String>,
) -> Result<RecipeDependencies> {
    let recipe = parser::read_recipe(reader)?;
    resolve(&recipe, build_args)
}

/// Opens, parses, and resolves the recipe at `path`.
///
/// # Errors
///
/// Returns an I/O error carrying `path` if the file cannot be opened or
/// read, and parse errors from the recipe.
pub fn resolve_file(path: &Path, build_args: &BTreeMap<String, String>) -> Result<RecipeDependencies> {
    tracing::debug!(path = %path.display(), "resolving recipe");
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let recipe = parser::parse_recipe(&content)?;
    resolve(&recipe, build_args)
}

fn substitute_args(
    token: &str,
    declared: &HashMap<&str, Option<&str>>,
    build_args: &BTreeMap<String, String>,
) -> String {
    expand_with(&brace_bare_refs(token), |name| {
        let default = declared.get(name)?;
        build_args
            .get(name)
            .cloned()
            .or_else(|| default.map(str::to_string))
    })
}

/// Rewrites `$NAME` into `${NAME}` so both forms share one substitution path.
fn brace_bare_refs(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        let starts_name = chars
            .peek()
            .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');
        if c == '$' && starts_name {
            out.push_str("${");
            while let Some(n) = chars.next_if(|n| n.is_ascii_alphanumeric() || *n == '_') {
                out.push(n);
            }
            out.push('}');
        } else {
            out.push(c);
        }
    }
    out
}
