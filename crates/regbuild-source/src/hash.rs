//! SHA-256 content verification.
//!
//! Validates the integrity of downloaded source archives.

use regbuild_common::error::{BuildError, Result};
use sha2::{Digest, Sha256};

/// Computes the hex-encoded SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Validates that `bytes` match the expected digest.
///
/// `expected` may carry a `sha256:` prefix and is compared case-insensitively.
///
/// # Errors
///
/// Returns [`BuildError::HashMismatch`] if the digests differ.
pub fn validate_hash(resource: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let expected = expected.trim();
    let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
    let actual = sha256_hex(bytes);
    tracing::debug!(resource, %actual, "validating SHA-256 hash");
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(BuildError::HashMismatch {
            resource: resource.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}
