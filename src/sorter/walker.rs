//! Parallel directory discovery.
//!
//! One task per directory on a bounded rayon pool. Each task reads its
//! directory, records regular files and spawns a task per subdirectory
//! without waiting for it. `rayon::scope` does not return until every task
//! spawned inside it, transitively, has finished; that is the discovery
//! barrier.
//!
//! Entries are classified without following symlinks. Links, FIFOs, sockets
//! and devices are left where they are.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::fs_ops::io_error_with_help_io;
use crate::shutdown::ShutdownFlag;

use super::registry::FileRegistry;

/// A directory (or entry) that could not be read. Its subtree contributes no files.
#[derive(Debug)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Everything discovery produced, available only after the barrier.
#[derive(Debug, Default)]
pub struct WalkSummary {
    pub files: Vec<PathBuf>,
    pub errors: Vec<DiscoveryError>,
    pub directories: usize,
    pub skipped: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct DirectoryWalker {
    threads: usize,
    shutdown: ShutdownFlag,
}

struct WalkState {
    registry: FileRegistry,
    errors: Mutex<Vec<DiscoveryError>>,
    directories: AtomicUsize,
    skipped: AtomicUsize,
    shutdown: ShutdownFlag,
}

impl WalkState {
    fn record_error(&self, path: &Path, error: io::Error) {
        warn!(event = "discovery-failed", path = %path.display(), error = %error);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DiscoveryError {
                path: path.to_path_buf(),
                error,
            });
    }
}

impl DirectoryWalker {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            shutdown: ShutdownFlag::new(),
        }
    }

    /// Stop spawning traversals once the flag is raised.
    pub fn with_shutdown(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Discover every regular file under `root` and return once all traversals are done.
    pub fn walk(&self, root: &Path) -> Result<WalkSummary> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("sortdir-discover-{i}"))
            .build()
            .context("Failed to build discovery thread pool")?;

        let state = WalkState {
            registry: FileRegistry::new(),
            errors: Mutex::new(Vec::new()),
            directories: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            shutdown: self.shutdown.clone(),
        };

        let root = root.to_path_buf();
        pool.scope(|s| visit(s, root, &state));
        debug!(files = state.registry.len(), "discovery barrier reached");

        let WalkState {
            registry,
            errors,
            directories,
            skipped,
            shutdown,
        } = state;
        let summary = WalkSummary {
            files: registry.freeze(),
            errors: errors.into_inner().unwrap_or_else(PoisonError::into_inner),
            directories: directories.into_inner(),
            skipped: skipped.into_inner(),
            interrupted: shutdown.is_requested(),
            elapsed: start.elapsed(),
        };
        debug!(
            files = summary.files.len(),
            directories = summary.directories,
            errors = summary.errors.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "discovery finished"
        );
        Ok(summary)
    }
}

fn visit<'scope>(scope: &rayon::Scope<'scope>, dir: PathBuf, state: &'scope WalkState) {
    if state.shutdown.is_requested() {
        return;
    }
    debug!(event = "directory-entered", path = %dir.display());
    state.directories.fetch_add(1, Ordering::Relaxed);

    let entries = match fs::read_dir(&dir) {
        Ok(it) => it,
        Err(e) => {
            let e = io_error_with_help_io("read directory", &dir)(e);
            state.record_error(&dir, e);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(en) => en,
            Err(e) => {
                state.record_error(&dir, e);
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                state.record_error(&path, e);
                continue;
            }
        };

        if file_type.is_dir() {
            scope.spawn(move |s| visit(s, path, state));
        } else if file_type.is_file() {
            debug!(event = "file-discovered", path = %path.display());
            state.registry.add(path);
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
            state.skipped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
