//! Content digests for tracked files and directory trees.
//!
//! This module provides the fingerprint used to decide whether a step's
//! executable, inputs, or outputs changed since the step last succeeded:
//! - SHA-256 of a regular file's raw bytes
//! - SHA-256 over every regular file beneath a directory, in sorted order
//!
//! # Architecture
//!
//! - [`walker`]: Deterministic listing of the files beneath a directory
//! - [`hasher`]: Streaming SHA-256 over files and directory listings
//!
//! # Example
//!
//! ```no_run
//! use steady::digest::digest_path;
//! use std::path::Path;
//!
//! match digest_path(Path::new("data/input.csv")) {
//!     Ok(hex) => println!("sha256 = {}", hex),
//!     Err(e) => eprintln!("cannot determine freshness: {}", e),
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

pub use hasher::{Hasher, DIGEST_HEX_LEN};
pub use walker::list_files;

/// Compute the hex digest of a file or directory using default settings.
///
/// Shorthand for `Hasher::new().digest_path(path)`.
///
/// # Errors
///
/// Returns a [`DigestError`] if the path is missing, unreadable, or is
/// neither a regular file nor a directory.
pub fn digest_path(path: &Path) -> Result<String, DigestError> {
    Hasher::new().digest_path(path)
}

/// A tracked path could not be digested.
///
/// Wherever this shows up during a staleness check the step is treated
/// as stale: an unknown digest never counts as a match.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path is neither a regular file nor a directory (socket, fifo, ...).
    #[error("Not a file or directory: {0}")]
    Unsupported(PathBuf),

    /// An I/O error occurred while reading the path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed (unreadable entry, symlink loop).
    #[error("Failed to walk {path}: {source}")]
    Walk {
        /// Directory being walked
        path: PathBuf,
        /// The underlying walkdir error
        #[source]
        source: walkdir::Error,
    },
}

impl DigestError {
    /// Classify an I/O error for `path` into the matching variant.
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// The path that could not be digested.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Unsupported(path) => path,
            Self::Io { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}
