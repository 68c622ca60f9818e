//! Metadata preservation for the copy fallback.
//! A rename keeps metadata by itself; a copy only does so when asked.

use anyhow::{Context, Result};
use filetime::{FileTime, set_file_times};
use std::fs::{self, Metadata};
use std::path::Path;

/// Copy permissions, access and modification times from `src_meta` onto `dest`.
pub(super) fn preserve_metadata(src_meta: &Metadata, dest: &Path) -> Result<()> {
    fs::set_permissions(dest, src_meta.permissions())
        .with_context(|| format!("set permissions on {}", dest.display()))?;

    let atime = FileTime::from_last_access_time(src_meta);
    let mtime = FileTime::from_last_modification_time(src_meta);
    set_file_times(dest, atime, mtime)
        .with_context(|| format!("set timestamps on {}", dest.display()))?;
    Ok(())
}
