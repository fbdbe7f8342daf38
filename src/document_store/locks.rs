//! # Per-Document Locks
//!
//! Serializes the multi-step mutations on a single document id. Slots are
//! created on demand and dropped once nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct IdLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`.
    pub fn with_lock<T>(&self, id: &str, f: impl FnOnce() -> T) -> T {
        let slot = self.acquire_slot(id);
        let result = {
            // A panic inside a previous holder leaves no state behind the
            // mutex, so poisoning is ignored.
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release_slot(id, slot);
        result
    }

    /// Number of ids that currently have a slot
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn acquire_slot(&self, id: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id.to_string()).or_default().clone()
    }

    fn release_slot(&self, id: &str, slot: Arc<Mutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held here: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(id);
        }
    }
}
