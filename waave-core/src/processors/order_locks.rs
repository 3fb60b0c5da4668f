//! Per-order critical sections.
//!
//! Callbacks for the same reference id are processed one at a time so the
//! "already completed" read and the following transition see a consistent
//! order. Callbacks for different orders never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of async locks keyed by reference id.
///
/// Entries are held weakly and pruned once no delivery holds them.
#[derive(Debug, Clone, Default)]
pub struct OrderLocks {
    slots: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

/// Holds the critical section for one reference id until dropped.
#[derive(Debug)]
pub struct OrderGuard {
    _guard: OwnedMutexGuard<()>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `reference_id`.
    pub async fn lock(&self, reference_id: &str) -> OrderGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| slot.strong_count() > 0);
            match slots.get(reference_id).and_then(Weak::upgrade) {
                Some(slot) => slot,
                None => {
                    let slot = Arc::new(AsyncMutex::new(()));
                    slots.insert(reference_id.to_owned(), Arc::downgrade(&slot));
                    slot
                }
            }
        };
        OrderGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of reference ids currently locked or waited on.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}
