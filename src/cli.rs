//! CLI definition and parsing.
//!
//! Notes:
//! - CLI flags override values from the XML config file, which override defaults.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Sort a directory tree into per-extension folders.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    author,
    version,
    about = "Sort every file under a directory into per-extension folders"
)]
pub struct Args {
    /// Directory to sort. Removed after a fully successful run unless --keep-source.
    #[arg(short = 's', long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Output directory; created if absent. Defaults to ./sorted.
    #[arg(short = 'o', long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Worker threads for moving files (default: CPUs + 4).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Threads for directory discovery (default: CPUs).
    #[arg(long, value_name = "N")]
    pub discovery_threads: Option<usize>,

    /// Folder name for files without an extension.
    #[arg(long, value_name = "NAME")]
    pub no_extension_dir: Option<String>,

    /// Leave the (emptied) source tree in place.
    #[arg(long)]
    pub keep_source: bool,

    /// Show what would be done, but do not modify files or directories.
    #[arg(long)]
    pub dry_run: bool,

    /// Preserve permissions and timestamps when a move has to copy across filesystems.
    #[arg(long)]
    pub preserve_metadata: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print where sortdir looks for its config file, then exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write a template config file at the default location (or SORTDIR_CONFIG), then exit.
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(src) = &self.source {
            cfg.source = src.clone();
        }
        if let Some(out) = &self.output {
            cfg.output = out.clone();
        }
        if let Some(n) = self.workers {
            cfg.workers = Some(n);
        }
        if let Some(n) = self.discovery_threads {
            cfg.discovery_threads = Some(n);
        }
        if let Some(name) = &self.no_extension_dir {
            cfg.no_extension_dir = name.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(lf) = &self.log_file {
            cfg.log_file = Some(lf.clone());
        }
        if self.keep_source {
            cfg.keep_source = true;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
        if self.preserve_metadata {
            cfg.preserve_metadata = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

