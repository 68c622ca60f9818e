//! Per-file worker unit.
//!
//! For one discovered file:
//!   1. take the NameLock for its case-folded name
//!   2. pick the bucket from its extension
//!   3. make sure the bucket folder exists (TargetFolderResolver)
//!   4. compute a free destination (unique_path)
//!   5. link it there without replacing anything; if another worker claimed
//!      that path first (a file literally named like our numbered variant),
//!      probe again. On EXDEV fall back to copy-then-delete
//!   6. release the name (guard drop, also on every error path)

use anyhow::{Result, anyhow};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::errors::SortError;

use super::atomic::place_no_clobber;
use super::copy::copy_then_remove;
use super::helpers::io_error_with_help;
use super::name_lock::NameLock;
use super::target_folder::{TargetFolderResolver, bucket_for};
use super::unique::{MAX_ATTEMPTS, unique_path};
use super::util::is_cross_device;

/// A file that reached its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    /// True when the move had to copy across filesystems.
    pub copied: bool,
}

/// Moves files into `<root>/<bucket>/`. Shared by reference across workers.
#[derive(Debug)]
pub struct FileMover<'a> {
    root: &'a Path,
    no_extension_dir: &'a str,
    preserve_metadata: bool,
    names: &'a NameLock,
    folders: &'a TargetFolderResolver,
}

impl<'a> FileMover<'a> {
    pub fn new(
        root: &'a Path,
        no_extension_dir: &'a str,
        names: &'a NameLock,
        folders: &'a TargetFolderResolver,
    ) -> Self {
        Self {
            root,
            no_extension_dir,
            preserve_metadata: false,
            names,
            folders,
        }
    }

    /// Copy permissions and timestamps when a move degrades to a copy.
    pub fn preserve_metadata(mut self, yes: bool) -> Self {
        self.preserve_metadata = yes;
        self
    }

    /// Move `src` into its bucket and return where it landed.
    pub fn move_file(&self, src: &Path) -> Result<MovedFile> {
        let name = src
            .file_name()
            .ok_or_else(|| anyhow!("Source file missing a file name: {}", src.display()))?;

        let _guard = self.names.acquire(name);
        let bucket = bucket_for(name, self.no_extension_dir);
        debug!(file = %src.display(), bucket = %bucket.to_string_lossy(), "placing file");

        let folder = self.folders.ensure(self.root, &bucket)?;
        let wanted = folder.join(name);

        for _ in 0..MAX_ATTEMPTS {
            let dest = unique_path(&wanted)?;
            match place_no_clobber(src, &dest) {
                Ok(()) => return Ok(self.moved(src, dest, false)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(dest = %dest.display(), "destination claimed concurrently; probing again");
                }
                Err(e) if is_cross_device(&e) => {
                    warn!(src = %src.display(), dest = %dest.display(), "cross-filesystem move; copying instead");
                    let dest = copy_then_remove(src, &wanted, self.preserve_metadata)?;
                    return Ok(self.moved(src, dest, true));
                }
                Err(e) => return Err(io_error_with_help("move file", src)(e)),
            }
        }
        Err(SortError::NoFreeName {
            path: wanted,
            attempts: MAX_ATTEMPTS,
        }
        .into())
    }

    fn moved(&self, src: &Path, dest: PathBuf, copied: bool) -> MovedFile {
        info!(event = "file-moved", from = %src.display(), to = %dest.display(), copied);
        MovedFile {
            from: src.to_path_buf(),
            to: dest,
            copied,
        }
    }
}
