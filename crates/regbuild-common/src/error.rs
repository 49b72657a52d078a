//! Unified error types for the regbuild workspace.
//!
//! Every crate reports failures through [`BuildError`] so that the first
//! error of a run can travel unchanged from a task back to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A recipe or manifest directive is malformed.
    #[error("parse error in `{line}`: {message}")]
    Parse {
        /// The offending line (or manifest fragment).
        line: String,
        /// Description of what was expected.
        message: String,
    },

    /// A variable requires its own value to be resolved.
    #[error("variable cycle detected while resolving `{name}`")]
    VariableCycle {
        /// One member of the cycle.
        name: String,
    },

    /// A variable kept producing new markers past the nesting cap.
    #[error("variable `{name}` is nested too many levels (limit {depth})")]
    NestingTooDeep {
        /// Variable being resolved when the cap was hit.
        name: String,
        /// The configured cap.
        depth: usize,
    },

    /// A cycle was found in the image lineage graph.
    #[error("cyclic image lineage detected: {message}")]
    LineageCycle {
        /// Description of the offending image.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An external tool could not be spawned or exited unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    ExternalTool {
        /// The displayed (obfuscated) command line.
        command: String,
        /// Exit status or spawn failure description.
        message: String,
    },

    /// Build request parameters are missing or conflict with each other.
    #[error("invalid configuration for {parameter}: {message}")]
    Configuration {
        /// Name of the offending parameter.
        parameter: String,
        /// Description of the problem.
        message: String,
    },

    /// A manifest service failed to resolve.
    #[error("failed to resolve recipe {path}: {source}")]
    Service {
        /// Recipe path of the failing service.
        path: PathBuf,
        /// Underlying resolution error.
        source: Box<BuildError>,
    },

    /// A remote download failed.
    #[error("failed to download {url}: {message}")]
    Download {
        /// URL being fetched.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// A hash validation failed.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Resource that failed validation.
        resource: String,
        /// Expected hash value.
        expected: String,
        /// Actual computed hash value.
        actual: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// Shorthand for a [`BuildError::Configuration`].
    pub fn configuration(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`BuildError::Parse`].
    pub fn parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            line: line.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BuildError>;
