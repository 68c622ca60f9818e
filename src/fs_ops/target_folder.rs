//! Per-extension destination folders.
//!
//! `ensure(root, bucket)` makes `root/bucket` a directory exactly once per run:
//! - missing: create it (and ancestors)
//! - already a directory: nothing to do
//! - occupied by a non-directory (a conflict artifact): park the artifact on a
//!   unique sibling name, create the directory, then move the artifact inside
//!   under its original name
//!
//! All establishment work runs under one gate. Two files with different names
//! but the same extension are not excluded from each other by the NameLock,
//! so without the gate they could race on the same folder.

use anyhow::Result;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::config::types::bucket_dir;

use super::helpers::io_error_with_help;
use super::unique::{split_name, unique_path};

/// A non-directory entry that was moved out of a folder's way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResolved {
    /// Where the artifact was found (the folder path).
    pub old: PathBuf,
    /// Where it lives now (inside the new folder).
    pub new: PathBuf,
}

/// Bucket name for a file name: its suffix including the dot (".txt"), or
/// `no_extension_dir` when it has none.
pub fn bucket_for(name: &OsStr, no_extension_dir: &str) -> OsString {
    let (_, suffix) = split_name(name);
    if suffix.is_empty() {
        OsString::from(no_extension_dir)
    } else {
        suffix
    }
}

#[derive(Debug, Default)]
pub struct TargetFolderResolver {
    ready: Mutex<HashSet<OsString>>,
    conflicts: Mutex<Vec<ConflictResolved>>,
}

impl TargetFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `root/bucket` is a directory. Returns the folder path.
    pub fn ensure(&self, root: &Path, bucket: &OsStr) -> Result<PathBuf> {
        let folder = bucket_dir(root, bucket);
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        if ready.contains(bucket) {
            return Ok(folder);
        }

        match fs::symlink_metadata(&folder) {
            Ok(meta) if meta.is_dir() => {
                debug!(folder = %folder.display(), "destination folder already present");
            }
            Ok(_) => {
                let resolved = relocate_conflict(&folder)?;
                self.conflicts
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&folder)
                    .map_err(io_error_with_help("create destination folder", &folder))?;
                debug!(event = "folder-created", folder = %folder.display());
            }
            Err(e) => return Err(io_error_with_help("inspect destination folder", &folder)(e)),
        }

        // Failed attempts are not recorded, so the next file of this bucket retries.
        ready.insert(bucket.to_os_string());
        Ok(folder)
    }

    /// Conflict artifacts relocated so far.
    pub fn conflicts(&self) -> Vec<ConflictResolved> {
        self.conflicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn relocate_conflict(folder: &Path) -> Result<ConflictResolved> {
    let name = folder
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("destination folder has no name: {}", folder.display()))?
        .to_os_string();

    let parked = unique_path(folder)?;
    fs::rename(folder, &parked).map_err(io_error_with_help("park conflicting entry", folder))?;

    if let Err(e) = fs::create_dir(folder) {
        // Put the artifact back so the tree looks as it did before.
        if let Err(restore) = fs::rename(&parked, folder) {
            warn!(parked = %parked.display(), error = %restore, "could not restore parked entry");
        }
        return Err(io_error_with_help("create destination folder", folder)(e));
    }

    let inside = folder.join(&name);
    fs::rename(&parked, &inside).map_err(io_error_with_help("move parked entry into folder", &parked))?;

    info!(event = "conflict-resolved", old = %folder.display(), new = %inside.display());
    Ok(ConflictResolved {
        old: folder.to_path_buf(),
        new: inside,
    })
}
