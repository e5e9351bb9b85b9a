//! Share store integration tests: scanning a real directory tree and
//! hashing its content step by step.

use std::fs;
use std::path::Path;

use clearskies_core::share::Share;
use tempfile::TempDir;

/// Hex SHA-256 of empty input.
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// A small tree with three regular files and a few empty directories.
fn create_tree(root: &Path) {
    fs::create_dir_all(root.join("a/aa")).expect("mkdir");
    fs::write(root.join("a/aa/f"), b"aaaf content\n").expect("write");

    fs::create_dir_all(root.join("a/ab")).expect("mkdir");
    fs::write(root.join("a/ab/aabf"), b"").expect("write");

    fs::create_dir_all(root.join("a/ac")).expect("mkdir");

    fs::create_dir_all(root.join("b")).expect("mkdir");
    fs::write(root.join("b/f"), b"").expect("write");

    fs::create_dir_all(root.join("c")).expect("mkdir");
}

fn hash_everything(share: &mut Share) {
    while share.scan_step().expect("scan step") {}
}

#[test]
fn scan_finds_and_hashes_the_tree() {
    let tmp = TempDir::new().expect("tempdir");
    create_tree(tmp.path());

    let mut share = Share::new(tmp.path()).expect("share");
    let queued = share.scan().expect("scan");
    assert_eq!(queued, 3);
    assert_eq!(share.len(), 3);
    for file in share.iter() {
        assert!(file.sha256.is_empty());
    }

    hash_everything(&mut share);
    assert_eq!(share.pending_checksums(), 0);
    for file in share.iter() {
        assert!(!file.sha256.is_empty(), "unhashed: {}", file.path);
        assert!(!file.deleted);
    }

    let empty = share.get_file_info("a/ab/aabf").expect("present");
    assert_eq!(empty.sha256, EMPTY_SHA256);
    assert_eq!(empty.size, 0);

    let content = share.get_file_info("a/aa/f").expect("present");
    assert_ne!(content.sha256, EMPTY_SHA256);
    assert_eq!(content.size, 13);
    assert_ne!(content.mtime, 0);
}

#[test]
fn rescan_of_an_unchanged_tree_queues_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    create_tree(tmp.path());

    let mut share = Share::new(tmp.path()).expect("share");
    share.scan().expect("scan");
    hash_everything(&mut share);

    let queued = share.scan().expect("rescan");
    assert_eq!(queued, 0);
    let content = share.get_file_info("a/aa/f").expect("present");
    assert!(!content.sha256.is_empty(), "hash survived the rescan");
}

#[test]
fn vanished_files_are_marked_deleted() {
    let tmp = TempDir::new().expect("tempdir");
    create_tree(tmp.path());

    let mut share = Share::new(tmp.path()).expect("share");
    share.scan().expect("scan");
    hash_everything(&mut share);

    fs::remove_file(tmp.path().join("b/f")).expect("remove");
    share.scan().expect("rescan");

    let gone = share.get_file_info("b/f").expect("record kept");
    assert!(gone.deleted);
    assert!(gone.sha256.is_empty());
    assert!(!share.get_file_info("a/aa/f").expect("present").deleted);
}

#[test]
fn modified_files_are_rehashed() {
    let tmp = TempDir::new().expect("tempdir");
    create_tree(tmp.path());

    let mut share = Share::new(tmp.path()).expect("share");
    share.scan().expect("scan");
    hash_everything(&mut share);
    let before = share
        .get_file_info("a/aa/f")
        .expect("present")
        .sha256
        .clone();

    fs::write(tmp.path().join("a/aa/f"), b"different content entirely\n").expect("write");
    let queued = share.scan().expect("rescan");
    assert_eq!(queued, 1);
    hash_everything(&mut share);

    let after = &share.get_file_info("a/aa/f").expect("present").sha256;
    assert_ne!(&before, after);
}
