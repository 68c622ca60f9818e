//! XML configuration support.
//! - Loads optional settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`--init-config`).
//!
//! Notes:
//! - Values are read as trimmed strings and parsed here, so `<workers> 8 </workers>`
//!   and empty elements behave predictably.
//! - Unknown elements are rejected to surface typos early.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{NO_EXTENSION_DIR_DEFAULT, OUTPUT_DEFAULT};

use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source: Option<String>,
    output: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    workers: Option<String>,
    discovery_threads: Option<String>,
    no_extension_dir: Option<String>,
    preserve_metadata: Option<String>,
    keep_source: Option<String>,
}

/// Settings found in a config file. Every field is optional; unset fields leave
/// the current Config value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlOverrides {
    pub path: PathBuf,
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub log_file: Option<PathBuf>,
    pub workers: Option<usize>,
    pub discovery_threads: Option<usize>,
    pub no_extension_dir: Option<String>,
    pub preserve_metadata: Option<bool>,
    pub keep_source: Option<bool>,
}

impl XmlOverrides {
    /// Apply file values onto `cfg` (file beats defaults; CLI is applied afterwards).
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(p) = &self.source {
            cfg.source = p.clone();
        }
        if let Some(p) = &self.output {
            cfg.output = p.clone();
        }
        if let Some(l) = self.log_level {
            cfg.log_level = l;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if self.workers.is_some() {
            cfg.workers = self.workers;
        }
        if self.discovery_threads.is_some() {
            cfg.discovery_threads = self.discovery_threads;
        }
        if let Some(name) = &self.no_extension_dir {
            cfg.no_extension_dir = name.clone();
        }
        if let Some(b) = self.preserve_metadata {
            cfg.preserve_metadata = b;
        }
        if let Some(b) = self.keep_source {
            cfg.keep_source = b;
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_count(field: &str, raw: Option<String>) -> Result<Option<usize>> {
    match non_empty(raw) {
        None => Ok(None),
        Some(v) => v
            .parse::<usize>()
            .map(Some)
            .with_context(|| format!("<{field}> must be a non-negative integer, got '{v}'")),
    }
}

fn parse_flag(field: &str, raw: Option<String>) -> Result<Option<bool>> {
    match non_empty(raw).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => bail!("<{field}> must be true or false, got '{v}'"),
        },
    }
}

/// Load overrides from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<XmlOverrides> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;

    let log_level = match non_empty(parsed.log_level) {
        None => None,
        Some(s) => Some(
            s.parse::<LogLevel>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("in config '{}'", path.display()))?,
        ),
    };

    Ok(XmlOverrides {
        path: path.to_path_buf(),
        source: non_empty(parsed.source).map(PathBuf::from),
        output: non_empty(parsed.output).map(PathBuf::from),
        log_level,
        log_file: non_empty(parsed.log_file).map(PathBuf::from),
        workers: parse_count("workers", parsed.workers)?,
        discovery_threads: parse_count("discovery_threads", parsed.discovery_threads)?,
        // An explicitly empty element is meaningful here (sort into the output root).
        no_extension_dir: parsed.no_extension_dir.map(|s| s.trim().to_string()),
        preserve_metadata: parse_flag("preserve_metadata", parsed.preserve_metadata)?,
        keep_source: parse_flag("keep_source", parsed.keep_source)?,
    })
}

/// Load the active config file, if any.
///
/// Search order:
///  - `$SORTDIR_CONFIG` (must exist when set)
///  - the OS default path (silently skipped when missing)
pub fn load_config_from_xml() -> Result<Option<XmlOverrides>> {
    if let Some(explicit) = config_path_from_env() {
        debug!(path = %explicit.display(), "using config from environment");
        return load_config_from_xml_path(&explicit).map(Some);
    }
    let Some(path) = default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file at default location");
        return Ok(None);
    }
    load_config_from_xml_path(&path).map(Some)
}

/// Write a commented template config at `path`. Refuses to overwrite an
/// existing file or to write through a symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/sortdir.log".into());

    let content = format!(
        "<!--\n  sortdir configuration (XML)\n\n    source             -> directory to sort (usually given on the command line)\n    output             -> root for the per-extension folders\n    log_level          -> quiet | normal | info | debug\n    log_file           -> path to log file (optional; console logging continues)\n    workers            -> move workers (empty = CPUs + 4)\n    discovery_threads  -> directory scanners (empty = CPUs)\n    no_extension_dir   -> folder for files without extension (empty = output root)\n    preserve_metadata  -> keep permissions and timestamps when a move has to copy\n    keep_source        -> leave the emptied source tree in place\n\n  CLI flags override these values.\n-->\n<config>\n  <output>{}</output>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <workers></workers>\n  <discovery_threads></discovery_threads>\n  <no_extension_dir>{}</no_extension_dir>\n  <preserve_metadata>false</preserve_metadata>\n  <keep_source>false</keep_source>\n</config>\n",
        OUTPUT_DEFAULT, suggested_log, NO_EXTENSION_DIR_DEFAULT
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_all_fields_with_whitespace() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(
            &p,
            "<config>\n  <source> /in </source>\n  <output>/out</output>\n  <log_level>debug</log_level>\n  <workers> 8 </workers>\n  <no_extension_dir></no_extension_dir>\n  <keep_source>true</keep_source>\n</config>",
        )
        .unwrap();
        let o = load_config_from_xml_path(&p).unwrap();
        assert_eq!(o.source, Some(PathBuf::from("/in")));
        assert_eq!(o.output, Some(PathBuf::from("/out")));
        assert_eq!(o.log_level, Some(LogLevel::Debug));
        assert_eq!(o.workers, Some(8));
        assert_eq!(o.discovery_threads, None);
        assert_eq!(o.keep_source, Some(true));
        assert_eq!(o.preserve_metadata, None);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><destination>/x</destination></config>").unwrap();
        assert!(load_config_from_xml_path(&p).is_err());
    }

    #[test]
    fn bad_number_is_reported() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><workers>many</workers></config>").unwrap();
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("workers"));
    }

    #[test]
    fn overrides_only_touch_set_fields() {
        let mut cfg = Config::new("/a", "/b");
        let o = XmlOverrides {
            output: Some(PathBuf::from("/c")),
            workers: Some(2),
            ..Default::default()
        };
        o.apply_to(&mut cfg);
        assert_eq!(cfg.source, PathBuf::from("/a"));
        assert_eq!(cfg.output, PathBuf::from("/c"));
        assert_eq!(cfg.workers, Some(2));
        assert_eq!(cfg.no_extension_dir, NO_EXTENSION_DIR_DEFAULT);
    }

    #[test]
    fn template_round_trips_through_loader() {
        let td = tempdir().unwrap();
        let root = dunce::canonicalize(td.path()).unwrap();
        let p = root.join("nested").join("config.xml");
        create_template_config(&p).unwrap();
        let o = load_config_from_xml_path(&p).unwrap();
        assert_eq!(o.output, Some(PathBuf::from(OUTPUT_DEFAULT)));
        assert_eq!(o.log_level, Some(LogLevel::Normal));
        assert_eq!(o.workers, None);
        assert_eq!(o.keep_source, Some(false));
        assert!(create_template_config(&p).is_err(), "must not overwrite");
    }
}
