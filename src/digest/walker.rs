//! Deterministic directory listing for directory digests.
//!
//! # Overview
//!
//! A directory digest is only reproducible if the files are fed to the
//! hasher in the same order every time. Filesystems make no promise about
//! enumeration order, so [`list_files`] collects every regular file beneath
//! the root and sorts the relative paths before returning them. The sort is
//! byte-wise over the `/`-separated name, so `a-b/x` comes before `a/b`.
//!
//! Symbolic links are followed; a link cycle surfaces as a
//! [`DigestError::Walk`] rather than an endless traversal.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::DigestError;

/// List every regular file beneath `root`, relative to `root`, sorted.
///
/// Directories themselves are not listed, so an empty subdirectory does not
/// contribute to the digest.
///
/// # Errors
///
/// Returns [`DigestError::Walk`] if any entry beneath `root` cannot be read.
///
/// # Example
///
/// ```no_run
/// use steady::digest::list_files;
/// use std::path::Path;
///
/// for rel in list_files(Path::new("out/tiles")).unwrap() {
///     println!("{}", rel.display());
/// }
/// ```
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, DigestError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| DigestError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        // strip_prefix cannot fail for entries yielded under root
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(relative);
    }

    files.sort_by_cached_key(|p| portable_name(p));
    log::trace!("Listed {} files under {}", files.len(), root.display());
    Ok(files)
}

/// Relative path with `/` separators so a tree digests the same on every platform.
pub(crate) fn portable_name(relative: &Path) -> String {
    let name = relative.to_string_lossy();
    if cfg!(windows) {
        name.replace('\\', "/")
    } else {
        name.into_owned()
    }
}
