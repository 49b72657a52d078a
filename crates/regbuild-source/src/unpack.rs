//! Tarball extraction into a source working directory.
//!
//! Supports both plain tar streams and gzip-compressed ones; compression is
//! detected from the stream's magic bytes rather than a file extension.

use std::io::Cursor;
use std::path::Path;

use regbuild_common::error::{BuildError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extracts a tar (or gzip-compressed tar) held in memory into `target`.
///
/// Creates `target` if it does not exist.
///
/// # Errors
///
/// Returns an I/O error carrying `target` if the directory cannot be
/// created or the archive cannot be unpacked.
pub fn unpack_tarball(bytes: &[u8], target: &Path) -> Result<()> {
    tracing::info!(
        target = %target.display(),
        size = bytes.len(),
        gzip = is_gzip(bytes),
        "extracting source archive"
    );

    std::fs::create_dir_all(target).map_err(|e| BuildError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;

    let unpacked = if is_gzip(bytes) {
        let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
        tar::Archive::new(decoder).unpack(target)
    } else {
        tar::Archive::new(Cursor::new(bytes)).unpack(target)
    };

    unpacked.map_err(|e| BuildError::Io {
        path: target.to_path_buf(),
        source: e,
    })
}

/// Whether `bytes` start with the gzip magic number.
#[must_use]
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}
