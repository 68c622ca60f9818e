//! io::Error enrichment.
//!
//! Wraps an io::Error with the operation, the path, a short platform-aware
//! hint and the raw OS code, for use with `map_err`:
//!
//!   fs::create_dir(dir).map_err(io_error_with_help("create folder", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for_code(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
            libc::ENOENT => Some("path not found; it may have been moved by another process"),
            libc::EEXIST => Some("already exists"),
            libc::ENOTDIR => Some("a path component is a file, not a directory"),
            libc::EISDIR => Some("target is a directory"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ENAMETOOLONG => Some("file name or path too long"),
            libc::EMFILE | libc::ENFILE => Some("too many open files; lower the worker count"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; check permissions"),
            17 => Some("not same device; cross-filesystem move"),
            32 => Some("sharing violation; file is in use"),
            2 | 3 => Some("path not found"),
            80 | 183 => Some("already exists"),
            112 => Some("insufficient disk space"),
            206 => Some("file name or path too long"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn hint_for_kind(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; it may have been moved by another process"),
        io::ErrorKind::AlreadyExists => Some("already exists"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    let hint = match e.raw_os_error() {
        Some(code) => hint_for_code(code),
        None => hint_for_kind(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for anyhow::Result code: io::Error -> anyhow::Error with context.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code: keeps the ErrorKind, enriches the message.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_fallback_includes_op_and_path() {
        let p = Path::new("/nonexistent/a.txt");
        let err = io_error_with_help("move file", p)(io::Error::from(io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.starts_with("move file '/nonexistent/a.txt'"));
        assert!(msg.contains("path not found"));
        assert!(!msg.contains("os code"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_code_hint_and_code_present() {
        let p = Path::new("/out/.txt");
        let err = io_error_with_help("create folder", p)(io::Error::from_raw_os_error(libc::ENOTDIR));
        let msg = err.to_string();
        assert!(msg.contains("not a directory"), "msg was: {msg}");
        assert!(msg.contains(&format!("[os code: {}]", libc::ENOTDIR)));
    }

    #[test]
    fn io_adapter_preserves_kind() {
        let p = Path::new("/tmp/x");
        let wrapped = io_error_with_help_io("copy", p)(io::Error::from(io::ErrorKind::AlreadyExists));
        assert_eq!(wrapped.kind(), io::ErrorKind::AlreadyExists);
        assert!(wrapped.to_string().contains("already exists"));
    }
}
