//! Registry of live watch handles.
//!
//! An explicit, injectable object rather than process-global state, so tests
//! can run isolated registries side by side. A single mutex guards insert
//! and drain; neither path needs per-entry locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::backend::WatchHandle;

/// Identifier of one registered watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

struct RegisteredWatch {
    id: WatchId,
    handle: Arc<dyn WatchHandle>,
    task: Option<JoinHandle<()>>,
}

/// Thread-safe ordered collection of live watch handles.
///
/// Every handle the engine opens is enqueued here at creation and stays
/// until bulk shutdown closes it, or until its loop exits terminally and
/// discards the entry.
#[derive(Default)]
pub struct HandleRegistry {
    entries: Mutex<Vec<RegisteredWatch>>,
    next_id: AtomicU64,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a freshly opened handle. Called before its loop task exists.
    pub fn insert(&self, handle: Arc<dyn WatchHandle>) -> WatchId {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(RegisteredWatch {
            id,
            handle,
            task: None,
        });
        id
    }

    /// Attach the spawned loop task to an entry.
    ///
    /// A miss means `close_all` drained the entry in between; the loop will
    /// observe its closed handle and exit on its own.
    pub fn attach_task(&self, id: WatchId, task: JoinHandle<()>) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.task = Some(task);
        }
    }

    /// Drop an entry without closing its handle.
    ///
    /// Used when registration fails after insertion, and by loops that exit
    /// terminally, so the registry does not accumulate dead sessions.
    pub fn discard(&self, id: WatchId) {
        self.entries.lock().retain(|e| e.id != id);
    }

    /// Close every registered handle and await loop termination.
    ///
    /// The drain happens under one lock acquisition, so a handle can never
    /// be closed twice and a concurrent insert either joins this drain or
    /// stays registered for the next one. No-op on an empty registry.
    pub async fn close_all(&self) {
        let drained: Vec<RegisteredWatch> = std::mem::take(&mut *self.entries.lock());

        // Close everything first so all loops wind down concurrently.
        for entry in &drained {
            entry.handle.close();
        }
        for entry in drained {
            if let Some(task) = entry.task {
                // A JoinError here means the listener panicked and already
                // took its loop down; nothing left to do.
                let _ = task.await;
            }
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
