//! Setup validation.
//! Verifies the source tree and output root before any file is touched and
//! canonicalises both paths in place.
//!
//! The only mutation performed here is creating a missing output directory,
//! and that is skipped for a dry run.

use anyhow::Result;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};

use crate::errors::SortError;

use super::types::Config;

/// Validate `cfg` and replace `source`/`output` with their canonical forms.
///
/// - source must exist and be a directory
/// - output is created if missing and must be a directory
/// - the two must not be equal or nested in either direction
/// - the no-extension folder name must be a single plain component (or empty)
pub fn validate_and_normalize(cfg: &mut Config) -> Result<()> {
    validate_bucket_name(&cfg.no_extension_dir)?;

    let src = &cfg.source;
    let meta = match fs::metadata(src) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SortError::SourceNotFound(src.clone()).into());
        }
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Err(SortError::SourceNotDir(src.clone()).into());
    }
    let source = dunce::canonicalize(src)?;

    // Check overlap against the would-be output before creating anything.
    let out_abs = absolute_lexical(&cfg.output)?;
    ensure_disjoint(&source, &out_abs)?;

    let output = if cfg.dry_run && fs::symlink_metadata(&cfg.output).is_err() {
        debug!(output = %out_abs.display(), "dry run: output directory not created");
        out_abs
    } else {
        ensure_output_dir(&cfg.output)?;
        let output = dunce::canonicalize(&cfg.output)?;
        ensure_disjoint(&source, &output)?;
        output
    };

    debug!(source = %source.display(), output = %output.display(), "paths normalized");
    info!(
        "Config validated: source='{}' output='{}' workers={} log_file='{}'",
        source.display(),
        output.display(),
        cfg.worker_count(),
        cfg.log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".into())
    );

    cfg.source = source;
    cfg.output = output;
    Ok(())
}

fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }
    let mut comps = Path::new(name).components();
    match (comps.next(), comps.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(()),
        _ => Err(SortError::InvalidBucketName(name.to_string()).into()),
    }
}

fn ensure_output_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(m) if m.is_dir() => Ok(()),
        Ok(_) => Err(SortError::OutputNotDir(path.to_path_buf()).into()),
        Err(_) => {
            fs::create_dir_all(path).map_err(|source| SortError::OutputUncreatable {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Created output directory: {}", path.display());
            Ok(())
        }
    }
}

/// Best-effort absolute form of a path that may not exist yet: canonicalise the
/// deepest existing ancestor and append the remaining components.
fn absolute_lexical(path: &Path) -> Result<std::path::PathBuf> {
    let abs = std::path::absolute(path)?;
    let mut existing = abs.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(abs),
        }
    }
    let mut out = dunce::canonicalize(existing)?;
    for name in tail.into_iter().rev() {
        out.push(name);
    }
    Ok(out)
}

fn ensure_disjoint(source: &Path, output: &Path) -> Result<()> {
    if source.starts_with(output) || output.starts_with(source) {
        return Err(SortError::PathsOverlap {
            source_dir: source.to_path_buf(),
            output: output.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn setup_error(err: &anyhow::Error) -> &SortError {
        err.downcast_ref::<SortError>().expect("typed setup error")
    }

    #[test]
    fn missing_source_is_reported_without_creating_output() {
        let td = TempDir::new().unwrap();
        let out = td.child("out");
        let mut cfg = Config::new(td.child("nope").path(), out.path());
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(matches!(setup_error(&err), SortError::SourceNotFound(_)));
        assert!(!out.path().exists());
    }

    #[test]
    fn source_file_is_rejected() {
        let td = TempDir::new().unwrap();
        let f = td.child("file.txt");
        f.touch().unwrap();
        let mut cfg = Config::new(f.path(), td.child("out").path());
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(matches!(setup_error(&err), SortError::SourceNotDir(_)));
    }

    #[test]
    fn output_created_and_paths_canonicalized() {
        let td = TempDir::new().unwrap();
        let src = td.child("src");
        src.create_dir_all().unwrap();
        let out = td.child("a").child("b").child("out");
        let mut cfg = Config::new(src.path(), out.path());
        validate_and_normalize(&mut cfg).unwrap();
        assert!(out.path().is_dir());
        assert!(cfg.source.is_absolute());
        assert_eq!(cfg.output, dunce::canonicalize(out.path()).unwrap());
    }

    #[test]
    fn output_file_is_rejected() {
        let td = TempDir::new().unwrap();
        let src = td.child("src");
        src.create_dir_all().unwrap();
        let out = td.child("out");
        out.touch().unwrap();
        let mut cfg = Config::new(src.path(), out.path());
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(matches!(setup_error(&err), SortError::OutputNotDir(_)));
    }

    #[test]
    fn nested_output_is_rejected_before_creation() {
        let td = TempDir::new().unwrap();
        let src = td.child("src");
        src.create_dir_all().unwrap();
        let out = src.child("sorted");
        let mut cfg = Config::new(src.path(), out.path());
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(matches!(setup_error(&err), SortError::PathsOverlap { .. }));
        assert!(!out.path().exists(), "nothing may be created inside the source");
    }

    #[test]
    fn source_inside_output_is_rejected() {
        let td = TempDir::new().unwrap();
        let out = td.child("out");
        let src = out.child("src");
        src.create_dir_all().unwrap();
        let mut cfg = Config::new(src.path(), out.path());
        assert!(validate_and_normalize(&mut cfg).is_err());
    }

    #[test]
    fn dry_run_does_not_create_output() {
        let td = TempDir::new().unwrap();
        let src = td.child("src");
        src.create_dir_all().unwrap();
        let out = td.child("out");
        let mut cfg = Config::new(src.path(), out.path());
        cfg.dry_run = true;
        validate_and_normalize(&mut cfg).unwrap();
        assert!(!out.path().exists());
        assert!(cfg.output.is_absolute());
        assert_eq!(cfg.output.file_name(), Some(std::ffi::OsStr::new("out")));
    }

    #[test]
    fn bucket_name_must_be_single_component() {
        assert!(validate_bucket_name("").is_ok());
        assert!(validate_bucket_name("no_extension").is_ok());
        assert!(validate_bucket_name("a/b").is_err());
        assert!(validate_bucket_name("..").is_err());
        assert!(validate_bucket_name(".").is_err());
    }
}
