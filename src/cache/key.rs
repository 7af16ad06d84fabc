//! Cache artifact naming.
//!
//! Every (step name, tracked path) pair maps to exactly one artifact file:
//!
//! ```text
//! <cache root>/<escaped step name>/<escaped absolute path>.sha256
//! ```
//!
//! Escaping is injective: bytes outside `[A-Za-z0-9._-]` become `%XX`, as
//! does a leading `.` (so `.` and `..` can never name a directory), and a
//! literal `%` is always escaped. Names longer than [`MAX_NAME_LEN`] are
//! shortened to a readable prefix plus the SHA-256 of the full name behind
//! a `%%` marker, which plain escaping never produces.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// File extension of cache artifacts.
pub const ARTIFACT_EXTENSION: &str = "sha256";

/// Longest escaped name kept verbatim; leaves room for the extension
/// under the common 255-byte file name limit.
pub const MAX_NAME_LEN: usize = 200;

/// Bytes kept from an over-long escaped name before the hash suffix.
const TRUNCATED_PREFIX_LEN: usize = 96;

/// Path of the artifact holding the digest of `path` for step `step`.
///
/// Relative paths are made absolute against the current directory first, so
/// `data/a.txt` run from two different directories gets two different keys.
#[must_use]
pub fn artifact_path(root: &Path, step: &str, path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let file_name = format!(
        "{}.{}",
        escape_component(&path_bytes(&absolute)),
        ARTIFACT_EXTENSION
    );
    root.join(step_dir_name(step)).join(file_name)
}

/// Directory (under the cache root) that holds one step's artifacts.
#[must_use]
pub fn step_dir_name(step: &str) -> String {
    escape_component(step.as_bytes())
}

/// Escape arbitrary bytes into a single safe path component.
#[must_use]
pub fn escape_component(raw: &[u8]) -> String {
    if raw.is_empty() {
        return "%".to_string();
    }

    let mut out = String::with_capacity(raw.len());
    for (i, &byte) in raw.iter().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || byte == b'_'
            || byte == b'-'
            || (byte == b'.' && i > 0);
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }

    if out.len() <= MAX_NAME_LEN {
        return out;
    }

    let hash = format!("{:x}", Sha256::digest(raw));
    format!("%%{}-{}", &out[..TRUNCATED_PREFIX_LEN], hash)
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}
