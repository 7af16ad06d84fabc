use std::fs;

use steady::digest::{digest_path, DigestError, Hasher};
use tempfile::tempdir;

#[test]
fn test_file_digest_matches_sha256sum() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("empty");
    fs::write(&empty, "").unwrap();

    assert_eq!(
        digest_path(&empty).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_directory_digest_is_stable_across_copies() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();

    // Same tree, created in opposite orders.
    for (name, body) in [("a.txt", "1"), ("sub/b.txt", "2"), ("sub/deeper/c.txt", "3")] {
        let path = first.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    for (name, body) in [("sub/deeper/c.txt", "3"), ("sub/b.txt", "2"), ("a.txt", "1")] {
        let path = second.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    assert_eq!(
        digest_path(first.path()).unwrap(),
        digest_path(second.path()).unwrap()
    );
}

#[test]
fn test_directory_digest_ignores_empty_subdirectories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "1").unwrap();
    let before = digest_path(dir.path()).unwrap();

    fs::create_dir(dir.path().join("empty")).unwrap();
    assert_eq!(digest_path(dir.path()).unwrap(), before);
}

#[test]
fn test_empty_file_added_changes_digest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "1").unwrap();
    let before = digest_path(dir.path()).unwrap();

    fs::write(dir.path().join("b.txt"), "").unwrap();
    assert_ne!(digest_path(dir.path()).unwrap(), before);
}

#[test]
fn test_missing_path_is_not_found() {
    let dir = tempdir().unwrap();
    let err = digest_path(&dir.path().join("gone")).unwrap_err();
    assert!(matches!(err, DigestError::NotFound(_)));
}

#[test]
fn test_buffer_size_does_not_change_digest() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("big.bin"), &data).unwrap();

    let small = Hasher::new().with_buffer_size(1024);
    assert_eq!(
        small.digest_path(dir.path()).unwrap(),
        Hasher::new().digest_path(dir.path()).unwrap()
    );
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_followed() {
    use std::os::unix::fs::symlink;

    let target = tempdir().unwrap();
    fs::write(target.path().join("real.txt"), "linked content").unwrap();

    let with_link = tempdir().unwrap();
    symlink(target.path(), with_link.path().join("link")).unwrap();

    let with_copy = tempdir().unwrap();
    fs::create_dir(with_copy.path().join("link")).unwrap();
    fs::write(with_copy.path().join("link/real.txt"), "linked content").unwrap();

    assert_eq!(
        digest_path(with_link.path()).unwrap(),
        digest_path(with_copy.path()).unwrap()
    );
}
