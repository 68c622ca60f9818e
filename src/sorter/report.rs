//! Run results handed back to the caller.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::SortError;
use crate::fs_ops::{ConflictResolved, MovedFile};

use super::walker::DiscoveryError;

/// A file that could not be moved. It is still at `path` (or duplicated, for a
/// copy whose source removal failed).
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

impl FileFailure {
    pub fn interrupted(path: PathBuf) -> Self {
        Self {
            path,
            error: SortError::Interrupted.into(),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(
            self.error.downcast_ref::<SortError>(),
            Some(SortError::Interrupted)
        )
    }
}

/// What happened to the source tree at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CleanupOutcome {
    /// The emptied source tree was deleted.
    Removed,
    /// `keep_source` was set.
    Kept,
    /// Preconditions were not met; nothing was inspected or deleted.
    Skipped { reason: String },
    /// Entries were still present; nothing was deleted.
    Blocked { remaining: Vec<PathBuf> },
    /// The tree was empty but removing it failed part-way.
    Failed { error: String },
    /// Dry run or not reached.
    #[default]
    NotRun,
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOutcome::Removed => write!(f, "source removed"),
            CleanupOutcome::Kept => write!(f, "source kept"),
            CleanupOutcome::Skipped { reason } => write!(f, "cleanup skipped ({reason})"),
            CleanupOutcome::Blocked { remaining } => {
                write!(f, "cleanup blocked by {} remaining entries", remaining.len())
            }
            CleanupOutcome::Failed { error } => write!(f, "cleanup failed: {error}"),
            CleanupOutcome::NotRun => write!(f, "cleanup not run"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub moved: Vec<MovedFile>,
    pub failures: Vec<FileFailure>,
    pub discovery_errors: Vec<DiscoveryError>,
    pub conflicts: Vec<ConflictResolved>,
    pub cleanup: CleanupOutcome,
    pub elapsed: Duration,
}

impl RunReport {
    /// Every file moved, discovery was complete, and cleanup was not blocked.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self.discovery_errors.is_empty()
            && !matches!(
                self.cleanup,
                CleanupOutcome::Blocked { .. } | CleanupOutcome::Failed { .. }
            )
    }

    pub fn interrupted(&self) -> bool {
        self.failures.iter().any(FileFailure::is_interrupted)
    }

    /// Number of moves that degraded to copy-then-delete.
    pub fn copied(&self) -> usize {
        self.moved.iter().filter(|m| m.copied).count()
    }
}
