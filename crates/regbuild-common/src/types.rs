//! Domain primitive types used across the regbuild workspace.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{BUILD_TIMESTAMP_FORMAT, DEFAULT_REGISTRY, DEFAULT_TAG};
use crate::error::{BuildError, Result};

/// Identifier of one build run, exported to every tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildNumber(String);

impl BuildNumber {
    /// Creates a build number from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random build number.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Formats a build timestamp the way it is exported to tools.
#[must_use]
pub fn format_build_timestamp(at: DateTime<Utc>) -> String {
    at.format(BUILD_TIMESTAMP_FORMAT).to_string()
}

/// A named value in a variable scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Name, unique within its scope.
    pub name: String,
    /// Template value; may reference other variables via `${name}`.
    pub value: String,
    /// Masked when displayed, never when executed.
    #[serde(default)]
    pub sensitive: bool,
}

impl Variable {
    /// Creates a plain variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    /// Creates a variable whose value is masked in logs.
    #[must_use]
    pub fn sensitive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: true,
        }
    }

    /// Parses a `NAME=value` assignment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if there is no `=` or the name is empty.
    pub fn parse_assignment(input: &str, sensitive: bool) -> Result<Self> {
        match input.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_string(),
                value: value.to_string(),
                sensitive,
            }),
            _ => Err(BuildError::configuration(
                "variable",
                format!("expected NAME=value, got `{input}`"),
            )),
        }
    }
}

/// Base images an image is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDependencies {
    /// The produced image.
    pub image: String,
    /// Base of the final stage; ships inside the image.
    #[serde(rename = "runtime-dependency")]
    pub runtime: String,
    /// Bases of intermediate stages only.
    #[serde(rename = "buildtime-dependency")]
    pub buildtime: BTreeSet<String>,
}

/// A parsed `[registry/]repository[:tag][@digest]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry host, if one was given explicitly.
    pub registry: Option<String>,
    /// Repository path as written.
    pub repository: String,
    /// Tag, if given.
    pub tag: Option<String>,
    /// Digest, if given.
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parses an image reference.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the reference or its repository is empty.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BuildError::parse(input, "empty image reference"));
        }

        let (rest, digest) = match trimmed.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (trimmed, None),
        };

        let last_slash = rest.rfind('/').map_or(0, |i| i + 1);
        let (name, tag) = match rest[last_slash..].rfind(':') {
            Some(i) => (
                &rest[..last_slash + i],
                Some(rest[last_slash + i + 1..].to_string()),
            ),
            None => (rest, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((host, path)) if is_registry_host(host) => (Some(host.to_string()), path),
            _ => (None, name),
        };

        if repository.is_empty() {
            return Err(BuildError::parse(input, "image reference has no repository"));
        }

        Ok(Self {
            registry,
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Returns the fully-qualified form used to compare references.
    #[must_use]
    pub fn normalized(&self) -> String {
        let registry = self.registry.as_deref().unwrap_or(DEFAULT_REGISTRY);
        let repository = if registry == DEFAULT_REGISTRY && !self.repository.contains('/') {
            format!("library/{}", self.repository)
        } else {
            self.repository.clone()
        };
        let mut out = format!("{registry}/{repository}");
        match (&self.tag, &self.digest) {
            (Some(tag), _) => {
                out.push(':');
                out.push_str(tag);
            }
            (None, None) => {
                out.push(':');
                out.push_str(DEFAULT_TAG);
            }
            (None, Some(_)) => {}
        }
        if let Some(digest) = &self.digest {
            out.push('@');
            out.push_str(digest);
        }
        out
    }

    /// Prefixes `image` with `registry` unless it already names one.
    ///
    /// Unparseable names and an empty registry leave `image` unchanged.
    #[must_use]
    pub fn qualify(image: &str, registry: &str) -> String {
        if registry.is_empty() {
            return image.to_string();
        }
        match Self::parse(image) {
            Ok(reference) if reference.registry.is_none() => {
                format!("{}/{}", registry.trim_end_matches('/'), image.trim())
            }
            _ => image.to_string(),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        let var = Variable::parse_assignment("URL=http://x?a=b", false).expect("parse");
        assert_eq!(var.name, "URL");
        assert_eq!(var.value, "http://x?a=b");
        assert!(!var.sensitive);
    }

    #[test]
    fn parse_assignment_rejects_missing_name() {
        assert!(Variable::parse_assignment("=value", false).is_err());
        assert!(Variable::parse_assignment("novalue", true).is_err());
    }

    #[test]
    fn docker_hub_short_name_normalizes() {
        let reference = ImageReference::parse("alpine").expect("parse");
        assert_eq!(reference.registry, None);
        assert_eq!(reference.normalized(), "docker.io/library/alpine:latest");
    }

    #[test]
    fn registry_with_port_and_tag() {
        let reference = ImageReference::parse("localhost:5000/team/app:1.2").expect("parse");
        assert_eq!(reference.registry.as_deref(), Some("localhost:5000"));
        assert_eq!(reference.repository, "team/app");
        assert_eq!(reference.tag.as_deref(), Some("1.2"));
        assert_eq!(reference.to_string(), "localhost:5000/team/app:1.2");
    }

    #[test]
    fn digest_reference_has_no_default_tag() {
        let reference = ImageReference::parse("myreg.io/app@sha256:abc").expect("parse");
        assert_eq!(reference.normalized(), "myreg.io/app@sha256:abc");
    }

    #[test]
    fn qualify_prefixes_only_unqualified_names() {
        assert_eq!(
            ImageReference::qualify("app:v1", "myreg.azurecr.io"),
            "myreg.azurecr.io/app:v1"
        );
        assert_eq!(
            ImageReference::qualify("other.io/app:v1", "myreg.azurecr.io"),
            "other.io/app:v1"
        );
        assert_eq!(ImageReference::qualify("app", ""), "app");
    }

    #[test]
    fn dependencies_serialize_with_wire_names() {
        let deps = ImageDependencies {
            image: "app".into(),
            runtime: "alpine".into(),
            buildtime: BTreeSet::from(["golang:alpine".to_string()]),
        };
        let json = serde_json::to_string(&deps).expect("serialize");
        assert!(json.contains("\"runtime-dependency\":\"alpine\""), "got: {json}");
        assert!(json.contains("\"buildtime-dependency\":[\"golang:alpine\"]"), "got: {json}");
    }

    #[test]
    fn timestamp_uses_fixed_format() {
        let at = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        assert_eq!(format_build_timestamp(at), "20240305-070809z");
    }
}
