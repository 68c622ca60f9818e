//! Filesystem operations used by the sorter.
//!
//! `file_move` is the per-file unit; the rest are its building blocks:
//! name locking, folder establishment, unique naming and the
//! rename-or-copy primitives.

mod atomic;
mod copy;
mod file_move;
mod helpers;
mod meta;
mod name_lock;
mod target_folder;
mod unique;
mod util;

pub use file_move::{FileMover, MovedFile};
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use name_lock::{NameGuard, NameLock, fold_name};
pub use target_folder::{ConflictResolved, TargetFolderResolver, bucket_for};
pub use unique::{
    MAX_ATTEMPTS, RENAME_MARKER, numbered_candidate, split_name, unique_path, unique_path_with,
};
