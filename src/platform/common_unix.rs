//! Atomic 0600 file write shared by Unix targets.

use anyhow::{Context, Result, bail};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use super::temp::tmp_config_sibling_name;

/// Write `contents` to a new file at `path` with mode 0600.
///
/// Temp sibling (O_EXCL) -> write -> fsync -> hard-link into place -> fsync dir.
/// Linking instead of renaming makes the final step fail if `path` appeared
/// in the meantime, so an existing config is never replaced.
pub(crate) fn atomic_write_new_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create parent '{}'", parent.display()))?;
    if path.exists() {
        bail!("refusing to overwrite existing file {}", path.display());
    }

    let tmp = tmp_config_sibling_name(path);
    let mut f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&tmp)
        .with_context(|| format!("create temp '{}'", tmp.display()))?;
    let written = f
        .write_all(contents)
        .and_then(|_| f.sync_all())
        .with_context(|| format!("write temp '{}'", tmp.display()));
    drop(f);

    let linked = written.and_then(|_| {
        fs::hard_link(&tmp, path)
            .with_context(|| format!("link '{}' -> '{}'", tmp.display(), path.display()))
    });
    let _ = fs::remove_file(&tmp);
    linked?;

    File::open(parent)
        .and_then(|d| d.sync_all())
        .with_context(|| format!("fsync dir '{}'", parent.display()))?;
    Ok(())
}
