//! Core configuration types.
//! - Config holds runtime settings for one sort run.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{NO_EXTENSION_DIR_DEFAULT, OUTPUT_DEFAULT, WORKER_HEADROOM};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// Discovery and placement detail
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for a sort run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tree to be sorted; removed after a fully successful run
    pub source: PathBuf,
    /// Root under which per-extension folders are created
    pub output: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Size of the processing pool; None = available parallelism + headroom
    pub workers: Option<usize>,
    /// Size of the discovery pool; None = available parallelism
    pub discovery_threads: Option<usize>,
    /// Folder for files without an extension; empty = output root itself
    pub no_extension_dir: String,
    /// Copy permissions and timestamps when a move falls back to copy
    pub preserve_metadata: bool,
    /// Leave the (emptied) source tree in place
    pub keep_source: bool,
    /// Plan only; do not touch the filesystem
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            output: PathBuf::from(OUTPUT_DEFAULT),
            log_level: LogLevel::Normal,
            log_file: None,
            workers: None,
            discovery_threads: None,
            no_extension_dir: NO_EXTENSION_DIR_DEFAULT.to_string(),
            preserve_metadata: false,
            keep_source: false,
            dry_run: false,
        }
    }
}

impl Config {
    /// Construct a Config with explicit source and output; other fields use defaults.
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    /// Effective processing pool size.
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| available_parallelism() + WORKER_HEADROOM)
    }

    /// Effective discovery pool size.
    pub fn discovery_thread_count(&self) -> usize {
        self.discovery_threads
            .filter(|n| *n > 0)
            .unwrap_or_else(available_parallelism)
    }

    /// Destination folder for a bucket name; the empty bucket maps to the output root.
    pub fn bucket_dir(&self, bucket: &std::ffi::OsStr) -> PathBuf {
        bucket_dir(&self.output, bucket)
    }
}

pub(crate) fn bucket_dir(root: &Path, bucket: &std::ffi::OsStr) -> PathBuf {
    if bucket.is_empty() {
        root.to_path_buf()
    } else {
        root.join(bucket)
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
