//! Unique-path probing.
//!
//! `unique_path(p)` returns `p` when nothing exists there, otherwise the first
//! free sibling of the form `<stem>_renamed_<NNN>_<suffix>`, where NNN counts
//! from 1 and is zero-padded to at least three digits:
//!
//! - "2.txt"    -> "2_renamed_001_.txt", "2_renamed_002_.txt", ...
//! - ".txt"     -> ".txt_renamed_001_"
//! - "a.tar.gz" -> "a.tar_renamed_001_.gz"
//!
//! The answer is only meaningful while the caller holds the NameLock for the
//! file name; recompute it for every placement.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::errors::SortError;

pub const RENAME_MARKER: &str = "_renamed_";

/// Upper bound on numbered candidates before giving up on a name.
pub const MAX_ATTEMPTS: u32 = 10_000;

/// Split a file name into (stem, suffix) where suffix keeps its leading dot.
/// Names without a usable extension ("README", ".env", "file.") have an empty suffix.
pub fn split_name(name: &OsStr) -> (OsString, OsString) {
    let p = Path::new(name);
    match (p.file_stem(), p.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => {
            let mut suffix = OsString::from(".");
            suffix.push(ext);
            (stem.to_os_string(), suffix)
        }
        _ => (name.to_os_string(), OsString::new()),
    }
}

/// The `attempt`-th numbered sibling of `path`.
pub fn numbered_candidate(path: &Path, attempt: u32) -> PathBuf {
    let name = path.file_name().unwrap_or_else(|| OsStr::new("file"));
    let (stem, suffix) = split_name(name);
    let mut new_name = stem;
    new_name.push(format!("{RENAME_MARKER}{attempt:03}_"));
    new_name.push(&suffix);
    path.with_file_name(new_name)
}

/// Free destination for `path` against the live filesystem.
pub fn unique_path(path: &Path) -> Result<PathBuf, SortError> {
    unique_path_with(path, entry_exists)
}

/// Same probe sequence as [`unique_path`] with a caller-supplied existence test;
/// the dry-run planner layers its own reservations on top of the filesystem.
pub fn unique_path_with(
    path: &Path,
    mut exists: impl FnMut(&Path) -> bool,
) -> Result<PathBuf, SortError> {
    if !exists(path) {
        return Ok(path.to_path_buf());
    }
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = numbered_candidate(path, attempt);
        if !exists(&candidate) {
            trace!(path = %path.display(), attempt, "unique-path probe settled");
            return Ok(candidate);
        }
    }
    Err(SortError::NoFreeName {
        path: path.to_path_buf(),
        attempts: MAX_ATTEMPTS,
    })
}

/// Existence without following symlinks: a dangling link still occupies its name.
fn entry_exists(p: &Path) -> bool {
    fs::symlink_metadata(p).is_ok()
}
