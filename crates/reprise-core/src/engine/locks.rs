//! Per-progress mutual exclusion
//!
//! Mutations of one progress (its slots, log and cache) are serialized.
//! Different progress records proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Keyed locks, one per progress id, created on demand
#[derive(Debug, Default)]
pub struct ProgressLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProgressLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `progress_id`.
    pub fn with_lock<T>(&self, progress_id: &str, f: impl FnOnce() -> T) -> T {
        let entry = Entry {
            locks: self,
            progress_id,
            handle: self.acquire(progress_id),
        };
        // The guarded value is `()`, poison carries no broken state
        let _guard = entry.handle.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }

    /// Number of ids currently holding an entry
    pub fn len(&self) -> usize {
        self.locks.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn acquire(&self, progress_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(progress_id.to_string()).or_default())
    }

    /// Drop the map entry once nobody else holds or waits on it.
    ///
    /// Handles are only cloned under the map lock, so the strong count
    /// cannot grow while we inspect it.
    fn release(&self, progress_id: &str, handle: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(handle) == 2 {
            locks.remove(progress_id);
        }
    }
}

/// Held map entry, released on drop so a panicking closure cleans up too.
/// Declared before the mutex guard, so it drops after it.
struct Entry<'a> {
    locks: &'a ProgressLocks,
    progress_id: &'a str,
    handle: Arc<Mutex<()>>,
}

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        self.locks.release(self.progress_id, &self.handle);
    }
}
