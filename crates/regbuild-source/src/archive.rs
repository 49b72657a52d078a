//! A remote tarball downloaded and unpacked into a working directory.

use std::path::PathBuf;

use regbuild_common::constants::{EXPORT_ARCHIVE_URL, EXPORT_WORKING_DIR};
use regbuild_common::error::{BuildError, Result};
use regbuild_common::types::Variable;
use regbuild_core::runner::Runner;
use regbuild_core::task::Source;

use crate::hash::validate_hash;
use crate::unpack::unpack_tarball;
use crate::workdir::ReturnPoint;

/// Retrieves the archive body for a URL.
pub type Fetcher = fn(&str) -> Result<Vec<u8>>;

/// Builds from a downloaded `.tar` or `.tar.gz`.
#[derive(Debug)]
pub struct ArchiveSource {
    url: String,
    sha256: Option<String>,
    target_dir: PathBuf,
    fetch: Fetcher,
    return_point: ReturnPoint,
}

impl ArchiveSource {
    /// Creates a source unpacking `url` into `target_dir`.
    #[must_use]
    pub fn new(url: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            sha256: None,
            target_dir: target_dir.into(),
            fetch: download,
            return_point: ReturnPoint::default(),
        }
    }

    /// Requires the downloaded body to match this SHA-256 digest.
    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    /// Replaces the HTTP download.
    #[must_use]
    pub fn with_fetcher(mut self, fetch: Fetcher) -> Self {
        self.fetch = fetch;
        self
    }
}

impl Source for ArchiveSource {
    fn obtain(&self, runner: &mut dyn Runner) -> Result<()> {
        let shown = redact_url(&self.url);
        tracing::info!(url = %shown, target = %self.target_dir.display(), "obtaining archive source");
        if runner.dry_run() {
            tracing::info!(url = %shown, "dry run, not downloading");
            return self.return_point.enter(runner, &self.target_dir);
        }
        let bytes = (self.fetch)(&self.url)?;
        if let Some(expected) = &self.sha256 {
            validate_hash(&shown, &bytes, expected)?;
        }
        let target = runner.working_dir()?.join(&self.target_dir);
        unpack_tarball(&bytes, &target)?;
        self.return_point.enter(runner, &self.target_dir)
    }

    fn return_source(&self, runner: &mut dyn Runner) -> Result<()> {
        self.return_point.leave(runner)
    }

    fn export(&self) -> Vec<Variable> {
        // Signed query strings stay usable by the build but are masked in logs.
        let url = if redact_url(&self.url) == self.url {
            Variable::new(EXPORT_ARCHIVE_URL, self.url.clone())
        } else {
            Variable::sensitive(EXPORT_ARCHIVE_URL, self.url.clone())
        };
        vec![
            url,
            Variable::new(EXPORT_WORKING_DIR, self.target_dir.display().to_string()),
        ]
    }

    fn describe(&self) -> String {
        format!("archive({})", redact_url(&self.url))
    }
}

/// `url` without credentials, query string, or fragment, for logs and errors.
fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Downloads `url` with a blocking HTTP GET.
///
/// # Errors
///
/// Returns [`BuildError::Download`] on transport failures and non-success
/// status codes.
pub fn download(url: &str) -> Result<Vec<u8>> {
    let shown = redact_url(url);
    let response = reqwest::blocking::get(url).map_err(|e| BuildError::Download {
        url: shown.clone(),
        message: e.without_url().to_string(),
    })?;

    if !response.status().is_success() {
        return Err(BuildError::Download {
            url: shown,
            message: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().map_err(|e| BuildError::Download {
        url: shown.clone(),
        message: format!("failed to read response body: {}", e.without_url()),
    })?;
    tracing::debug!(url = %shown, size = bytes.len(), "downloaded archive");
    Ok(bytes.to_vec())
}
