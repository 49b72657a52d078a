//! The build request a workflow is compiled from.

use std::rc::Rc;

use regbuild_common::error::{BuildError, Result};
use regbuild_core::task::{BuildTarget, Credential, Source};

/// A source and the builds that run against it, in declaration order.
#[derive(Clone)]
pub struct SourceTarget {
    /// Where the code comes from.
    pub source: Rc<dyn Source>,
    /// What gets built from it.
    pub builds: Vec<Rc<dyn BuildTarget>>,
}

impl SourceTarget {
    /// Pairs a source with its builds.
    #[must_use]
    pub fn new(source: Rc<dyn Source>, builds: Vec<Rc<dyn BuildTarget>>) -> Self {
        Self { source, builds }
    }
}

/// Everything one invocation asks the scheduler to do.
#[derive(Clone, Default)]
pub struct BuildRequest {
    /// Registry images are pushed to.
    pub registry: Option<String>,
    /// Logins performed before any source is obtained.
    pub credentials: Vec<Rc<dyn Credential>>,
    /// Sources with their builds.
    pub targets: Vec<SourceTarget>,
}

impl BuildRequest {
    /// Checks the request before anything runs.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Configuration`] when there is no source, a
    /// source has no builds, `push` is set without a registry, or a
    /// credential is missing a field.
    pub fn validate(&self, push: bool) -> Result<()> {
        if self.targets.is_empty() {
            return Err(BuildError::configuration(
                "source",
                "at least one source is required",
            ));
        }
        if let Some(target) = self.targets.iter().find(|t| t.builds.is_empty()) {
            return Err(BuildError::configuration(
                "build",
                format!("source {} has no builds", target.source.describe()),
            ));
        }
        let has_registry = self.registry.as_deref().is_some_and(|r| !r.trim().is_empty());
        if push && !has_registry {
            return Err(BuildError::configuration(
                "registry",
                "pushing requires a target registry",
            ));
        }
        if let Some(credential) = self.credentials.iter().find(|c| !c.is_complete()) {
            return Err(BuildError::configuration(
                "credential",
                format!("credential {} has empty fields", credential.describe()),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for BuildRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildRequest")
            .field("registry", &self.registry)
            .field(
                "credentials",
                &self.credentials.iter().map(|c| c.describe()).collect::<Vec<_>>(),
            )
            .field(
                "targets",
                &self
                    .targets
                    .iter()
                    .map(|t| t.source.describe())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use regbuild_source::local::LocalSource;

    use super::*;
    use crate::build::DockerBuildTarget;
    use crate::credential::PasswordCredential;

    fn request() -> BuildRequest {
        let build: Rc<dyn BuildTarget> = Rc::new(DockerBuildTarget::new(vec!["app".into()]));
        BuildRequest {
            registry: Some("reg.io".into()),
            credentials: Vec::new(),
            targets: vec![SourceTarget::new(
                Rc::new(LocalSource::new(".")),
                vec![build],
            )],
        }
    }

    fn parameter(err: BuildError) -> String {
        match err {
            BuildError::Configuration { parameter, .. } => parameter,
            other => other.to_string(),
        }
    }

    #[test]
    fn complete_request_is_valid() {
        request().validate(true).expect("should be valid");
    }

    #[test]
    fn no_source_is_rejected() {
        let err = BuildRequest::default().validate(false).expect_err("should fail");
        assert_eq!(parameter(err), "source");
    }

    #[test]
    fn source_without_builds_is_rejected() {
        let mut req = request();
        req.targets[0].builds.clear();
        assert_eq!(parameter(req.validate(false).expect_err("should fail")), "build");
    }

    #[test]
    fn push_requires_registry() {
        let mut req = request();
        req.registry = None;
        req.validate(false).expect("no push, no registry needed");
        assert_eq!(parameter(req.validate(true).expect_err("should fail")), "registry");
    }

    #[test]
    fn incomplete_credential_is_rejected() {
        let mut req = request();
        req.credentials.push(Rc::new(PasswordCredential::new("reg.io", "bob", "")));
        assert_eq!(parameter(req.validate(false).expect_err("should fail")), "credential");
    }
}
