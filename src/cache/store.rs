//! Filesystem-backed digest cache.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::key;
use crate::digest::DIGEST_HEX_LEN;

/// Name of the default cache directory inside the platform temp directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = "steady-cache";

/// Errors that can occur while writing or deleting cache artifacts.
///
/// Reads never fail: an unreadable or corrupt artifact is reported as a
/// cache miss by [`DigestCache::lookup`].
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The directory for an artifact could not be created.
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An artifact could not be written.
    #[error("Failed to write cache artifact {path}: {source}")]
    Write {
        /// Artifact path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An artifact could not be deleted.
    #[error("Failed to remove cache artifact {path}: {source}")]
    Remove {
        /// Artifact path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Refused to store something that is not a hex SHA-256 digest.
    #[error("Invalid digest: {0:?}")]
    InvalidDigest(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// One digest per (step name, tracked path), stored as small text files
/// under a cache root.
///
/// The root is configuration, not global state: every engine gets its own
/// `DigestCache` value. There is no locking. Two runs sharing a root and
/// step names at the same time may race.
#[derive(Debug, Clone)]
pub struct DigestCache {
    root: PathBuf,
}

impl Default for DigestCache {
    fn default() -> Self {
        Self::with_default_root()
    }
}

impl DigestCache {
    /// Use `root` as the cache root.
    ///
    /// A missing directory is not an error, but it is reported right away
    /// with a warning rather than at the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        log::debug!("Setting cache directory to \"{}\"", root.display());
        if !root.is_dir() {
            log::warn!("Cache directory \"{}\" does not exist", root.display());
        }
        Self { root }
    }

    /// Use the platform temp location (`$TMPDIR/steady-cache` on Unix).
    #[must_use]
    pub fn with_default_root() -> Self {
        Self {
            root: Self::default_root(),
        }
    }

    /// The default cache root.
    #[must_use]
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
    }

    /// The configured cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the artifact for (`step`, `path`).
    #[must_use]
    pub fn artifact_path(&self, step: &str, path: &Path) -> PathBuf {
        key::artifact_path(&self.root, step, path)
    }

    /// The digest recorded for `path` when `step` last succeeded.
    ///
    /// Returns `None` when no artifact exists, it cannot be read, or its
    /// content is not exactly one hex digest followed by a line terminator.
    #[must_use]
    pub fn lookup(&self, step: &str, path: &Path) -> Option<String> {
        let artifact = self.artifact_path(step, path);
        let content = match fs::read_to_string(&artifact) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::trace!("No cache entry for \"{}\" in step \"{}\"", path.display(), step);
                return None;
            }
            Err(e) => {
                log::debug!("Unreadable cache artifact {}: {}", artifact.display(), e);
                return None;
            }
        };

        let digest = parse_artifact(&content);
        if digest.is_none() {
            log::debug!(
                "Corrupt cache artifact {}, treating as absent",
                artifact.display()
            );
        }
        digest
    }

    /// Record `digest` for (`step`, `path`), replacing any previous value.
    ///
    /// The artifact is written to a temporary file next to its final
    /// location and renamed into place, so a crash never leaves a partial
    /// artifact under the real name.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidDigest`] if `digest` is not a 64-char hex
    /// string, or a creation/write error from the filesystem.
    pub fn store(&self, step: &str, path: &Path, digest: &str) -> CacheResult<()> {
        if !is_hex_digest(digest) {
            return Err(CacheError::InvalidDigest(digest.to_string()));
        }

        let artifact = self.artifact_path(step, path);
        let dir = artifact.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let write_err = |source: io::Error| CacheError::Write {
            path: artifact.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        writeln!(tmp, "{}", digest.to_ascii_lowercase()).map_err(write_err)?;
        tmp.persist(&artifact).map_err(|e| write_err(e.error))?;

        log::trace!("Cached {} for \"{}\" in step \"{}\"", digest, path.display(), step);
        Ok(())
    }

    /// Delete the artifact for (`step`, `path`).
    ///
    /// Returns whether an artifact was actually removed; a missing artifact
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Remove`] if an existing artifact cannot be deleted.
    pub fn remove(&self, step: &str, path: &Path) -> CacheResult<bool> {
        let artifact = self.artifact_path(step, path);
        match fs::remove_file(&artifact) {
            Ok(()) => {
                log::debug!("Removed {}", artifact.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Remove {
                path: artifact,
                source,
            }),
        }
    }

    /// Delete the artifacts for every (`step`, path) pair.
    ///
    /// Keeps going after a failure so one stuck artifact does not protect
    /// the rest; the first error is returned at the end. Returns the number
    /// of artifacts removed.
    ///
    /// # Errors
    ///
    /// Returns the first [`CacheError::Remove`] encountered.
    pub fn clear<'a, I>(&self, step: &str, paths: I) -> CacheResult<usize>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut removed = 0;
        let mut first_error = None;

        for path in paths {
            match self.remove(step, path) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }
}

/// Extract the digest from artifact content, or `None` if it is malformed.
///
/// Valid content is exactly one hex digest followed by `\n` (or `\r\n`).
#[must_use]
pub fn parse_artifact(content: &str) -> Option<String> {
    let line = content.strip_suffix('\n')?;
    let line = line.strip_suffix('\r').unwrap_or(line);
    if is_hex_digest(line) {
        Some(line.to_ascii_lowercase())
    } else {
        None
    }
}

fn is_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
