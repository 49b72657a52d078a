//! Immutable, layered variable scopes.
//!
//! A [`Context`] holds two layers: user-defined variables (lowest
//! precedence) and system-generated variables (engine and collaborator
//! supplied, winning on name collision). Both layers are resolved together
//! once, at construction. [`Context::append`] never touches the receiver; it
//! builds a new scope that shares the unchanged user layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use regbuild_common::constants::REDACTED;
use regbuild_common::error::Result;
use regbuild_common::types::Variable;

use crate::reduce::{expand_with, reduce};

/// A resolved variable scope used for templating and process environments.
#[derive(Debug, Clone, Default)]
pub struct Context {
    user_defined: Arc<[Variable]>,
    system_generated: Arc<[Variable]>,
    resolved: Arc<BTreeMap<String, String>>,
}

impl Context {
    /// Builds a context from its two layers.
    ///
    /// # Errors
    ///
    /// Fails if the union of both layers contains a variable cycle or nests
    /// markers too deeply.
    pub fn new(user_defined: Vec<Variable>, system_generated: Vec<Variable>) -> Result<Self> {
        Self::from_layers(user_defined.into(), system_generated.into())
    }

    fn from_layers(user_defined: Arc<[Variable]>, system_generated: Arc<[Variable]>) -> Result<Self> {
        let templates: BTreeMap<String, String> = user_defined
            .iter()
            .chain(system_generated.iter())
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();
        let resolved = reduce(&templates)?;
        Ok(Self {
            user_defined,
            system_generated,
            resolved: Arc::new(resolved),
        })
    }

    /// Returns a new context with `vars` layered over the system layer.
    ///
    /// Entries in `vars` replace same-named system entries in place; new
    /// names are appended. The receiver is left untouched.
    ///
    /// # Errors
    ///
    /// Fails if the merged layers contain a cycle or nest too deeply.
    pub fn append(&self, vars: &[Variable]) -> Result<Self> {
        let mut merged = self.system_generated.to_vec();
        for var in vars {
            match merged.iter_mut().find(|existing| existing.name == var.name) {
                Some(existing) => *existing = var.clone(),
                None => merged.push(var.clone()),
            }
        }
        Self::from_layers(Arc::clone(&self.user_defined), merged.into())
    }

    /// Substitutes every `${name}` known to this context.
    ///
    /// Unknown references are left as-is for the host-environment fallback.
    pub fn expand(&self, input: &str) -> String {
        expand_with(input, |name| self.resolved.get(name).cloned())
    }

    /// Flattens the resolved map into sorted `NAME=value` lines.
    ///
    /// Sensitive values are exported unmasked.
    pub fn export(&self) -> Vec<String> {
        self.resolved
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }

    /// Iterates over resolved `(name, value)` pairs in name order.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolved.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the resolved value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.resolved.get(name).map(String::as_str)
    }

    /// Whether the effective definition of `name` is sensitive.
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.system_generated
            .iter()
            .rev()
            .chain(self.user_defined.iter().rev())
            .find(|v| v.name == name)
            .is_some_and(|v| v.sensitive)
    }

    /// Masks the resolved values of sensitive variables in `text`.
    ///
    /// For display only; never apply this to arguments that get executed.
    pub fn redact(&self, text: &str) -> String {
        let mut secrets: Vec<&str> = self
            .resolved
            .iter()
            .filter(|(name, value)| !value.is_empty() && self.is_sensitive(name))
            .map(|(_, value)| value.as_str())
            .collect();
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));

        let mut out = text.to_string();
        for secret in secrets {
            out = out.replace(secret, REDACTED);
        }
        out
    }
}
