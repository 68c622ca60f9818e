//! The sorting engine: discovery, per-file processing and cleanup.

mod cleanup;
mod orchestrator;
mod plan;
mod registry;
mod report;
mod walker;

pub use cleanup::{remaining_entries, remove_empty_tree};
pub use orchestrator::{Phase, Sorter};
pub use plan::{Plan, PlannedMove, plan_moves};
pub use registry::FileRegistry;
pub use report::{CleanupOutcome, FileFailure, RunReport};
pub use walker::{DirectoryWalker, DiscoveryError, WalkSummary};
