//! Per-name mutual exclusion for concurrent movers.
//!
//! Workers that could produce the same destination name (same case-folded
//! file name) must not pick a destination at the same time. `NameLock` keeps
//! the set of names in flight; membership is checked and inserted under one
//! mutex, and waiters park on a condvar until the name is released.
//!
//! Distinct names never block each other beyond the short set update.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::trace;

/// Case-folded key for a file name; destination filesystems may be case-insensitive.
pub fn fold_name(name: &OsStr) -> String {
    name.to_string_lossy().to_lowercase()
}

#[derive(Debug, Default)]
pub struct NameLock {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// RAII guard: the name is released when this is dropped, on every exit path.
#[must_use = "the name is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct NameGuard<'a> {
    lock: &'a NameLock,
    key: String,
}

#[cfg(test)]
impl NameGuard<'_> {
    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(&self.key);
    }
}

impl NameLock {
    pub fn new() -> Self {
        Self::default()
    }

    // The set holds plain strings, so a panic elsewhere cannot leave it half-updated.
    fn set(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until no other worker holds `name` (case-insensitively), then take it.
    pub fn acquire(&self, name: &OsStr) -> NameGuard<'_> {
        let key = fold_name(name);
        let start = Instant::now();
        let mut held = self.set();
        let mut contended = false;
        while held.contains(&key) {
            contended = true;
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key.clone());
        drop(held);

        if contended {
            let waited = start.elapsed();
            trace!(name = %key, waited_us = waited.as_micros() as u64, "name lock acquired after wait");
        }
        NameGuard { lock: self, key }
    }

    /// Non-blocking variant; `None` if the name is currently held.
    #[cfg(test)]
    pub(crate) fn try_acquire(&self, name: &OsStr) -> Option<NameGuard<'_>> {
        let key = fold_name(name);
        let mut held = self.set();
        if !held.insert(key.clone()) {
            return None;
        }
        Some(NameGuard { lock: self, key })
    }

    fn release(&self, key: &str) {
        self.set().remove(key);
        // Waiters for other names re-check and go back to sleep.
        self.released.notify_all();
    }

    /// Number of names currently held.
    #[cfg(test)]
    pub(crate) fn held(&self) -> usize {
        self.set().len()
    }
}
