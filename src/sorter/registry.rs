//! Thread-safe accumulator of discovered files.
//!
//! Discovery tasks append concurrently; after the barrier the registry is
//! consumed by `freeze`, so nothing can be added once processing starts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct FileRegistry {
    files: Mutex<HashSet<PathBuf>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file. Returns false if the path was already present.
    pub fn add(&self, path: PathBuf) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path)
    }

    /// Files recorded so far.
    pub(crate) fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// End of discovery: hand the entries over for a single read.
    pub fn freeze(self) -> Vec<PathBuf> {
        self.files
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .collect()
    }
}
