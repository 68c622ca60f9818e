//! Guarded removal of the source tree.
//!
//! The tree is deleted only if it holds nothing but directories. Anything
//! else (a file left by a failed move, a skipped symlink, an unreadable
//! directory) blocks the whole removal.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::errors::SortError;
use crate::fs_ops::io_error_with_help;

/// Entries under `root` that are not directories, plus paths that could not be read.
pub fn remaining_entries(root: &Path) -> Vec<PathBuf> {
    let mut remaining = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(e) if e.file_type().is_dir() => {}
            Ok(e) => remaining.push(e.into_path()),
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                remaining.push(path);
            }
        }
    }
    remaining
}

/// Remove `root` if it contains only (possibly nested) empty directories.
pub fn remove_empty_tree(root: &Path) -> Result<()> {
    let remaining = remaining_entries(root);
    if !remaining.is_empty() {
        warn!(
            event = "cleanup-blocked",
            root = %root.display(),
            remaining = remaining.len(),
            "source tree still has entries; not removing"
        );
        return Err(SortError::CleanupBlocked {
            root: root.to_path_buf(),
            remaining,
        }
        .into());
    }
    fs::remove_dir_all(root).map_err(io_error_with_help("remove source tree", root))?;
    info!(root = %root.display(), "removed source tree");
    Ok(())
}
