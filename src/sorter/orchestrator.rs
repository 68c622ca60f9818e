//! Run driver: Discovering -> Barrier -> Processing -> Cleanup -> Done.
//!
//! All run state (registry, name lock, folder gate) is created per run and
//! dropped with it; nothing is process-global except the shutdown flag the
//! caller chooses to share.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::SortError;
use crate::fs_ops::{FileMover, MovedFile, NameLock, TargetFolderResolver};
use crate::shutdown::ShutdownFlag;

use super::cleanup::remove_empty_tree;
use super::plan::{Plan, plan_moves};
use super::report::{CleanupOutcome, FileFailure, RunReport};
use super::walker::{DirectoryWalker, WalkSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    Barrier,
    Processing,
    Cleanup,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Discovering => "discovering",
            Phase::Barrier => "barrier",
            Phase::Processing => "processing",
            Phase::Cleanup => "cleanup",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Sorts one source tree into one output tree. `config` is expected to have
/// passed `validate_and_normalize`.
#[derive(Debug)]
pub struct Sorter {
    config: Config,
    shutdown: ShutdownFlag,
}

impl Sorter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: ShutdownFlag::new(),
        }
    }

    /// Share an externally owned flag (e.g. one set from a signal handler).
    pub fn with_shutdown(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn enter(&self, phase: Phase) {
        debug!(%phase, "entering phase");
    }

    /// Discovering + Barrier: every regular file under the source, frozen.
    pub fn discover(&self) -> Result<WalkSummary> {
        self.enter(Phase::Discovering);
        let walker = DirectoryWalker::new(self.config.discovery_thread_count())
            .with_shutdown(self.shutdown.clone());
        let summary = walker.walk(&self.config.source)?;
        self.enter(Phase::Barrier);
        info!(
            files = summary.files.len(),
            directories = summary.directories,
            errors = summary.errors.len(),
            "discovery complete"
        );
        Ok(summary)
    }

    /// Dry run: discovery plus destination planning, no mutation.
    pub fn plan(&self) -> Result<Plan> {
        let summary = self.discover()?;
        plan_moves(&self.config, summary.files, summary.errors)
    }

    /// Full run. Per-file failures are collected in the report; only
    /// failures that prevent the run from starting are returned as errors.
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let summary = self.discover()?;
        let discovered = summary.files.len();

        self.enter(Phase::Processing);
        let folders = TargetFolderResolver::new();
        let (moved, failures) = self.process(summary.files, &folders)?;

        let mut report = RunReport {
            discovered,
            moved,
            failures,
            discovery_errors: summary.errors,
            conflicts: folders.conflicts(),
            ..Default::default()
        };

        self.enter(Phase::Cleanup);
        report.cleanup = self.cleanup(&report, summary.interrupted);

        report.elapsed = start.elapsed();
        self.enter(Phase::Done);
        info!(
            discovered = report.discovered,
            moved = report.moved.len(),
            failed = report.failures.len(),
            conflicts = report.conflicts.len(),
            cleanup = %report.cleanup,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    fn process(
        &self,
        files: Vec<PathBuf>,
        folders: &TargetFolderResolver,
    ) -> Result<(Vec<MovedFile>, Vec<FileFailure>)> {
        let workers = self.config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sortdir-worker-{i}"))
            .build()
            .context("Failed to build worker thread pool")?;
        debug!(workers, files = files.len(), "dispatching files");

        let names = NameLock::new();
        let mover = FileMover::new(
            &self.config.output,
            &self.config.no_extension_dir,
            &names,
            folders,
        )
        .preserve_metadata(self.config.preserve_metadata);
        let shutdown = &self.shutdown;

        let results: Vec<Result<MovedFile, FileFailure>> = pool.install(|| {
            files
                .into_par_iter()
                .map(|src| {
                    if shutdown.is_requested() {
                        return Err(FileFailure::interrupted(src));
                    }
                    mover.move_file(&src).map_err(|error| {
                        warn!(event = "move-failed", path = %src.display(), error = %format!("{error:#}"));
                        FileFailure { path: src, error }
                    })
                })
                .collect()
        });

        let mut moved = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for r in results {
            match r {
                Ok(m) => moved.push(m),
                Err(f) => failures.push(f),
            }
        }
        Ok((moved, failures))
    }

    fn cleanup(&self, report: &RunReport, discovery_interrupted: bool) -> CleanupOutcome {
        let source = &self.config.source;
        let skip = |reason: String| {
            info!(source = %source.display(), %reason, "leaving source tree in place");
            CleanupOutcome::Skipped { reason }
        };

        if self.config.keep_source {
            return CleanupOutcome::Kept;
        }
        if discovery_interrupted || self.shutdown.is_requested() {
            return skip("interrupted".to_string());
        }
        if !report.failures.is_empty() {
            return skip(format!("{} file(s) failed to move", report.failures.len()));
        }
        if !report.discovery_errors.is_empty() {
            return skip(format!(
                "{} path(s) could not be read during discovery",
                report.discovery_errors.len()
            ));
        }

        match remove_empty_tree(source) {
            Ok(()) => CleanupOutcome::Removed,
            Err(e) => match e.downcast::<SortError>() {
                Ok(SortError::CleanupBlocked { remaining, .. }) => {
                    CleanupOutcome::Blocked { remaining }
                }
                Ok(other) => CleanupOutcome::Failed {
                    error: other.to_string(),
                },
                Err(e) => {
                    warn!(source = %source.display(), error = %format!("{e:#}"), "source removal failed");
                    CleanupOutcome::Failed {
                        error: format!("{e:#}"),
                    }
                }
            },
        }
    }
}
