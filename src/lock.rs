//! Per-note advisory locks
//!
//! Read-modify-write sequences on a note hold a `NoteLock` for the note's
//! resolved path. Locks are in-process only and keyed by path, so work on
//! different notes never waits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard};

use once_cell::sync::Lazy;

struct LockTable {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

static LOCKS: Lazy<LockTable> = Lazy::new(|| LockTable {
    held: Mutex::new(HashSet::new()),
    released: Condvar::new(),
});

impl LockTable {
    fn held(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // A panic while holding the table leaves the set itself consistent
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Guard for exclusive access to one note; released on drop
#[derive(Debug)]
pub struct NoteLock {
    path: PathBuf,
}

impl NoteLock {
    /// Block until the note at `path` is free, then take it
    pub fn acquire(path: &Path) -> Self {
        let mut held = LOCKS.held();
        while held.contains(path) {
            held = LOCKS
                .released
                .wait(held)
                .unwrap_or_else(|e| e.into_inner());
        }
        held.insert(path.to_path_buf());
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Path this lock covers
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NoteLock {
    fn drop(&mut self) {
        LOCKS.held().remove(&self.path);
        LOCKS.released.notify_all();
    }
}
