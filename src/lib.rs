//! Core library for `sortdir`.
//!
//! Sorts every regular file under a source tree into per-extension folders
//! of an output tree. Discovery runs in parallel and finishes completely
//! before any file moves; files are then moved by a bounded worker pool.
//! Two files that share a (case-insensitive) name never overwrite each
//! other, and a plain file occupying a needed folder path is moved inside
//! that folder rather than lost.
//!
//! ```no_run
//! use sortdir::{Config, Sorter, validate_and_normalize};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cfg = Config::new("/data/inbox", "/data/sorted");
//! validate_and_normalize(&mut cfg)?;
//! let report = Sorter::new(cfg).run()?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod shutdown;
pub mod sorter;

pub use config::types::{Config, LogLevel};
pub use config::{
    config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor,
    validate_and_normalize,
};
pub use errors::SortError;
pub use fs_ops::{
    ConflictResolved, FileMover, MovedFile, NameLock, TargetFolderResolver, unique_path,
};
pub use shutdown::ShutdownFlag;
pub use sorter::{
    CleanupOutcome, DirectoryWalker, FileFailure, FileRegistry, Plan, PlannedMove, RunReport,
    Sorter,
};
