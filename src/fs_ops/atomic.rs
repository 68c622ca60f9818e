//! No-clobber placement.
//! - Hard-link `src` at `dst`, then unlink `src`. The link fails with
//!   `AlreadyExists` if anything occupies `dst`, so a concurrent placement of
//!   another name onto the same path can never replace a file.
//! - Filesystems without hard-link support fall back to a checked rename.
//! - On Unix, best-effort fsync of the destination directory afterwards.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Place `src` at `dst` without replacing anything already there.
///
/// The raw io::Error is returned so callers can detect EXDEV and `AlreadyExists`.
/// If the link succeeds but `src` cannot be removed, both names stay in place
/// and the unlink error is returned.
pub(super) fn place_no_clobber(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::hard_link(src, dst) {
        Ok(()) => fs::remove_file(src)?,
        Err(e) if links_unsupported(&e) => {
            debug!(dest = %dst.display(), error = %e, "hard links unavailable; checked rename");
            if fs::symlink_metadata(dst).is_ok() {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            fs::rename(src, dst)?;
        }
        Err(e) => return Err(e),
    }

    if let Some(parent) = dst.parent() {
        // A successful placement stays successful even if the directory fsync fails.
        let _ = super::util::fsync_dir(parent);
    }
    Ok(())
}

fn links_unsupported(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::Unsupported {
        return true;
    }
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EPERM || code == libc::EOPNOTSUPP || code == libc::EMLINK,
        #[cfg(not(unix))]
        Some(_) => false,
        None => false,
    }
}
