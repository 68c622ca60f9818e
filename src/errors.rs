//! Typed error definitions for sortdir.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortError {
    #[error("Source path not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Source path is not a directory: {0}")]
    SourceNotDir(PathBuf),

    #[error("Output path exists but is not a directory: {0}")]
    OutputNotDir(PathBuf),

    #[error("Cannot create output directory {path}: {source}")]
    OutputUncreatable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source '{source_dir}' and output '{output}' must be disjoint directories")]
    PathsOverlap { source_dir: PathBuf, output: PathBuf },

    #[error("Invalid no-extension folder name '{0}': must be a single plain path component")]
    InvalidBucketName(String),

    #[error("No free destination name for {path} after {attempts} attempts")]
    NoFreeName { path: PathBuf, attempts: u32 },

    #[error("Insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("Operation interrupted by user")]
    Interrupted,

    #[error("Refusing to remove source tree {root}: {} still present", entries(.remaining))]
    CleanupBlocked {
        root: PathBuf,
        remaining: Vec<PathBuf>,
    },
}

fn entries(remaining: &[PathBuf]) -> String {
    match remaining.len() {
        1 => "1 entry".to_string(),
        n => format!("{n} entries"),
    }
}

impl SortError {
    /// Stable numeric code per failure mode; emitted as a structured log field.
    pub fn code(&self) -> u16 {
        match self {
            SortError::SourceNotFound(_) => 10,
            SortError::SourceNotDir(_) => 11,
            SortError::OutputNotDir(_) => 12,
            SortError::OutputUncreatable { .. } => 13,
            SortError::PathsOverlap { .. } => 14,
            SortError::InvalidBucketName(_) => 15,
            SortError::NoFreeName { .. } => 20,
            SortError::InsufficientSpace { .. } => 21,
            SortError::Interrupted => 30,
            SortError::CleanupBlocked { .. } => 40,
        }
    }

    /// Setup failures are fatal and happen before any filesystem mutation.
    pub fn is_setup(&self) -> bool {
        self.code() < 20
    }
}
