//! Cross-device fallback: copy then delete.
//!
//! Unlike a rename this is not atomic. The sequence is:
//! copy into a hidden temp file inside the destination folder, fsync it,
//! link it at the first free name (re-probing if another worker claims that
//! name first), fsync the folder, then remove the source.
//! A failure before the final step leaves the source untouched; a failure
//! removing the source leaves two copies, never zero.

use anyhow::{Context, Result, anyhow};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::SortError;
use crate::platform::available_space;

use super::atomic::place_no_clobber;
use super::helpers::{io_error_with_help, io_error_with_help_io};
use super::meta::preserve_metadata;
use super::unique::{MAX_ATTEMPTS, unique_path};
use super::util::unique_temp_path;

const BUF_SIZE: usize = 1024 * 1024;

/// Stream `src` into a newly created `dst` (never clobbers) and fsync it.
fn copy_streaming(src: &Path, dst: &Path) -> io::Result<u64> {
    let input = File::open(src).map_err(io_error_with_help_io("open source", src))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(io_error_with_help_io("create temporary file", dst))?;
    let mut reader = BufReader::with_capacity(BUF_SIZE, input);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, output);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()?;
    Ok(bytes)
}

fn ensure_space(required: u64, dest_dir: &Path, dest: &Path) -> Result<()> {
    match available_space(dest_dir) {
        Ok(available) if available < required => Err(SortError::InsufficientSpace {
            required,
            available,
            dest: dest.to_path_buf(),
        }
        .into()),
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(dir = %dest_dir.display(), error = %e, "free-space probe failed; copying anyway");
            Ok(())
        }
    }
}

/// Link the staged copy at the first free variant of `wanted`.
fn place_staged(tmp: &Path, wanted: &Path) -> Result<PathBuf> {
    for _ in 0..MAX_ATTEMPTS {
        let dest = unique_path(wanted)?;
        match place_no_clobber(tmp, &dest) {
            Ok(()) => return Ok(dest),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(dest = %dest.display(), "destination claimed concurrently; probing again");
            }
            Err(e) => return Err(io_error_with_help("link temporary file into place", &dest)(e)),
        }
    }
    Err(SortError::NoFreeName {
        path: wanted.to_path_buf(),
        attempts: MAX_ATTEMPTS,
    }
    .into())
}

/// Copy `src` to a free variant of `wanted`, then remove `src`. Returns where it landed.
pub(super) fn copy_then_remove(src: &Path, wanted: &Path, preserve: bool) -> Result<PathBuf> {
    let dest_dir = wanted
        .parent()
        .ok_or_else(|| anyhow!("destination has no parent: {}", wanted.display()))?;
    let src_meta = fs::metadata(src).map_err(io_error_with_help("stat source", src))?;
    ensure_space(src_meta.len(), dest_dir, wanted)?;

    let tmp = unique_temp_path(dest_dir);
    let staged = copy_streaming(src, &tmp)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| {
            if preserve {
                preserve_metadata(&src_meta, &tmp)?;
            }
            Ok(bytes)
        })
        .and_then(|bytes| Ok((place_staged(&tmp, wanted)?, bytes)));
    let (dest, bytes) = match staged {
        Ok(placed) => placed,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("copy {} -> {}", src.display(), wanted.display()));
        }
    };
    debug!(src = %src.display(), dest = %dest.display(), bytes, "copied across filesystems");

    fs::remove_file(src).map_err(|e| {
        io_error_with_help("remove original after copy", src)(e)
            .context(format!("file was copied to {} but the original remains", dest.display()))
    })?;
    Ok(dest)
}
