//! Share store: the file-metadata index behind one synchronized directory.
//!
//! A [`Share`] tracks every regular file under its root as a [`FileInfo`]
//! record keyed by share-relative path. Scanning is split in two so a large
//! tree never stalls the owner:
//!
//! 1. [`Share::scan`] walks the tree, refreshes metadata, marks vanished
//!    files deleted, and queues changed files for hashing.
//! 2. [`Share::scan_step`] hashes one queued file per call; loop until it
//!    returns `false`.
//!
//! The index lives in memory only. Each share also owns the identity
//! material exchanged during the protocol handshake: the public share id,
//! this peer's id, and the pre-shared keys for the three access levels.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Metadata record for one file in a share.
///
/// This is also the record announced to peers inside `update` messages, so
/// it serializes with wire-stable field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Share-relative path, `/`-separated
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, seconds since the epoch
    pub mtime: i64,
    /// Unix mode bits, 0 where the platform has none
    pub mode: u32,
    /// Hex SHA-256 of the content, empty until hashed
    #[serde(default)]
    pub sha256: String,
    /// Whether the file has been deleted locally
    #[serde(default)]
    pub deleted: bool,
}

/// One synchronized directory: identity material plus the file index.
#[derive(Debug)]
pub struct Share {
    root: PathBuf,
    /// Share id, shared publicly
    share_id: [u8; 32],
    /// This peer's id on this share
    peer_id: [u8; 16],
    /// Pre-shared key, read-write access
    psk_rw: [u8; 16],
    /// Pre-shared key, read-only access
    psk_ro: [u8; 16],
    /// Pre-shared key, untrusted access
    psk_ut: [u8; 16],
    files: BTreeMap<String, FileInfo>,
    to_checksum: VecDeque<String>,
}

impl Share {
    /// Open a share over an existing directory, generating fresh identity
    /// material.
    ///
    /// # Errors
    ///
    /// Returns an error when `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }

        let mut rng = rand::thread_rng();
        let mut share_id = [0u8; 32];
        let mut peer_id = [0u8; 16];
        let mut psk_rw = [0u8; 16];
        let mut psk_ro = [0u8; 16];
        let mut psk_ut = [0u8; 16];
        rng.fill_bytes(&mut share_id);
        rng.fill_bytes(&mut peer_id);
        rng.fill_bytes(&mut psk_rw);
        rng.fill_bytes(&mut psk_ro);
        rng.fill_bytes(&mut psk_ut);

        Ok(Self {
            root,
            share_id,
            peer_id,
            psk_rw,
            psk_ro,
            psk_ut,
            files: BTreeMap::new(),
            to_checksum: VecDeque::new(),
        })
    }

    /// The directory this share synchronizes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hex share id, as exchanged in `start` messages.
    pub fn share_id(&self) -> String {
        hex::encode(self.share_id)
    }

    /// Hex peer id.
    pub fn peer_id(&self) -> String {
        hex::encode(self.peer_id)
    }

    /// Pre-shared key for the given access level.
    pub fn psk(&self, access: crate::message::Access) -> &[u8; 16] {
        match access {
            crate::message::Access::ReadWrite => &self.psk_rw,
            crate::message::Access::ReadOnly => &self.psk_ro,
            crate::message::Access::Untrusted => &self.psk_ut,
        }
    }

    /// Number of tracked files, deleted records included.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Files still queued for hashing.
    pub fn pending_checksums(&self) -> usize {
        self.to_checksum.len()
    }

    /// Iterate over all file records in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.values()
    }

    /// Look up one file by share-relative path.
    pub fn get_file_info(&self, path: &str) -> Option<&FileInfo> {
        self.files.get(path)
    }

    /// Insert a record for a path not yet tracked.
    ///
    /// # Errors
    ///
    /// Returns an error when a record for the path already exists.
    pub fn insert_file(&mut self, file: FileInfo) -> Result<()> {
        if self.files.contains_key(&file.path) {
            return Err(Error::DuplicateFile(file.path));
        }
        self.files.insert(file.path.clone(), file);
        Ok(())
    }

    /// Apply a peer's `update` announcement: insert or replace the record.
    pub fn apply_update(&mut self, file: FileInfo) {
        self.files.insert(file.path.clone(), file);
    }

    /// Apply a peer's `move` announcement: rekey a record.
    ///
    /// # Errors
    ///
    /// Returns an error when the source path is not tracked.
    pub fn rename_file(&mut self, source: &str, destination: &str) -> Result<()> {
        let Some(mut file) = self.files.remove(source) else {
            return Err(Error::UnknownPath(source.to_string()));
        };
        file.path = destination.to_string();
        self.files.insert(file.path.clone(), file);
        Ok(())
    }

    /// Walk the tree, refresh metadata, and queue changed files for hashing.
    /// Returns how many files were queued.
    ///
    /// # Errors
    ///
    /// Returns an error when the walk itself fails; unreadable individual
    /// entries are skipped.
    pub fn scan(&mut self) -> Result<usize> {
        let mut seen = BTreeSet::new();
        let mut queued = 0usize;

        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_path(&self.root, entry.path()) else {
                continue;
            };
            let Ok(metadata) = entry.metadata() else {
                tracing::debug!(path = %rel, "skipping unreadable entry");
                continue;
            };

            let size = metadata.len();
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_secs() as i64);
            let mode = mode_bits(&metadata);

            seen.insert(rel.clone());
            match self.files.get_mut(&rel) {
                Some(file) if !file.deleted && file.size == size && file.mtime == mtime => {}
                Some(file) => {
                    file.size = size;
                    file.mtime = mtime;
                    file.mode = mode;
                    file.deleted = false;
                    file.sha256.clear();
                    self.to_checksum.push_back(rel);
                    queued += 1;
                }
                None => {
                    self.files.insert(
                        rel.clone(),
                        FileInfo {
                            path: rel.clone(),
                            size,
                            mtime,
                            mode,
                            sha256: String::new(),
                            deleted: false,
                        },
                    );
                    self.to_checksum.push_back(rel);
                    queued += 1;
                }
            }
        }

        for (path, file) in &mut self.files {
            if !file.deleted && !seen.contains(path) {
                file.deleted = true;
                file.sha256.clear();
            }
        }

        tracing::debug!(
            files = self.files.len(),
            queued,
            "share scan complete"
        );
        Ok(queued)
    }

    /// Hash one queued file. Returns `false` when the queue is empty.
    ///
    /// A file that vanished between scan and hash is marked deleted rather
    /// than failing the step.
    ///
    /// # Errors
    ///
    /// Returns an error when reading the file fails for any reason other
    /// than it being gone.
    pub fn scan_step(&mut self) -> Result<bool> {
        let Some(rel) = self.to_checksum.pop_front() else {
            return Ok(false);
        };

        match checksum_file(&self.root.join(&rel)) {
            Ok(sha256) => {
                if let Some(file) = self.files.get_mut(&rel) {
                    file.sha256 = sha256;
                }
            }
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %rel, "file vanished before hashing");
                if let Some(file) = self.files.get_mut(&rel) {
                    file.deleted = true;
                }
            }
            Err(err) => return Err(err),
        }
        Ok(true)
    }
}

/// Share-relative `/`-separated path, `None` for the root itself or paths
/// that escape it.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let mut s = rel.to_string_lossy().into_owned();
    if std::path::MAIN_SEPARATOR != '/' {
        s = s.replace(std::path::MAIN_SEPARATOR, "/");
    }
    Some(s)
}

#[cfg(unix)]
fn mode_bits(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(_metadata: &std::fs::Metadata) -> u32 {
    0
}

/// Streaming hex SHA-256 of a file's content.
fn checksum_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 65536];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
