//! SHA-256 hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes the hex digest stored in cache artifacts:
//!
//! - **Files**: SHA-256 of the raw bytes. The result matches `sha256sum`.
//! - **Directories**: one SHA-256 over every regular file beneath the
//!   directory, visited in sorted relative-path order. Each file is framed
//!   by its relative path and byte length before its content, so renaming
//!   a file or adding an empty one changes the digest too.
//!
//! Files are read through a fixed-size buffer, never loaded whole.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use bytesize::ByteSize;
use sha2::{Digest, Sha256};

use super::walker::{list_files, portable_name};
use super::DigestError;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Default read buffer size (64 KiB).
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming SHA-256 hasher for tracked paths.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 64 KiB read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Override the read buffer size. Values below 1 KiB are raised to 1 KiB.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1024);
        self
    }

    /// Digest a file or directory, dispatching on what `path` is.
    ///
    /// Symbolic links are followed.
    ///
    /// # Errors
    ///
    /// - [`DigestError::NotFound`] / [`DigestError::PermissionDenied`] if the
    ///   path cannot be stat'ed or read
    /// - [`DigestError::Unsupported`] for sockets, fifos and similar
    /// - [`DigestError::Walk`] if a directory entry cannot be traversed
    pub fn digest_path(&self, path: &Path) -> Result<String, DigestError> {
        let metadata = fs::metadata(path).map_err(|e| DigestError::from_io(path, e))?;

        if metadata.is_file() {
            self.digest_file(path)
        } else if metadata.is_dir() {
            self.digest_dir(path)
        } else {
            Err(DigestError::Unsupported(path.to_path_buf()))
        }
    }

    /// SHA-256 of a single file's content, hex-encoded.
    ///
    /// # Errors
    ///
    /// Returns a [`DigestError`] if the file cannot be opened or read.
    pub fn digest_file(&self, path: &Path) -> Result<String, DigestError> {
        let mut sha = Sha256::new();
        let bytes = self.feed_file(&mut sha, path)?;
        log::trace!("Digested {} ({})", path.display(), ByteSize::b(bytes));
        Ok(format!("{:x}", sha.finalize()))
    }

    /// SHA-256 over every regular file beneath `dir`, hex-encoded.
    ///
    /// # Errors
    ///
    /// Returns a [`DigestError`] if the tree cannot be walked or any file
    /// beneath it cannot be read.
    pub fn digest_dir(&self, dir: &Path) -> Result<String, DigestError> {
        let files = list_files(dir)?;
        let mut sha = Sha256::new();
        let mut total = 0u64;

        for relative in &files {
            let path = dir.join(relative);
            let len = fs::metadata(&path)
                .map_err(|e| DigestError::from_io(&path, e))?
                .len();

            sha.update(portable_name(relative).as_bytes());
            sha.update([0u8]);
            sha.update(len.to_le_bytes());
            total += self.feed_file(&mut sha, &path)?;
        }

        log::trace!(
            "Digested directory {} ({} files, {})",
            dir.display(),
            files.len(),
            ByteSize::b(total)
        );
        Ok(format!("{:x}", sha.finalize()))
    }

    /// Stream a file's bytes into `sha`, returning the number of bytes read.
    fn feed_file(&self, sha: &mut Sha256, path: &Path) -> Result<u64, DigestError> {
        let file = File::open(path).map_err(|e| DigestError::from_io(path, e))?;
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;

        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| DigestError::from_io(path, e))?;
            if read == 0 {
                break;
            }
            sha.update(&buffer[..read]);
            total += read as u64;
        }

        Ok(total)
    }
}
