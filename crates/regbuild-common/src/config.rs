//! Configuration models for the scheduler and the process runner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// What a workflow does when a dependency scan fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFailurePolicy {
    /// Log the failure, contribute no dependencies, keep running.
    Continue,
    /// Fail the run with the scan error.
    #[default]
    Abort,
}

impl fmt::Display for ScanFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for ScanFailurePolicy {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(BuildError::configuration(
                "scan-failure",
                format!("expected `continue` or `abort`, got `{other}`"),
            )),
        }
    }
}

/// Settings applied when compiling a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Handling of dependency-scan failures.
    pub scan_failure: ScanFailurePolicy,
}

/// Settings of the process runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Log commands instead of executing them.
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_policy_parses_case_insensitively() {
        assert_eq!(
            "Continue".parse::<ScanFailurePolicy>().expect("parse"),
            ScanFailurePolicy::Continue
        );
        assert_eq!(
            "abort".parse::<ScanFailurePolicy>().expect("parse"),
            ScanFailurePolicy::Abort
        );
        assert!("ignore".parse::<ScanFailurePolicy>().is_err());
    }

    #[test]
    fn default_policy_aborts() {
        assert_eq!(WorkflowConfig::default().scan_failure, ScanFailurePolicy::Abort);
    }
}
