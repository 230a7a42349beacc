//! Production backend wrapping `notify::RecommendedWatcher`.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{RawEvent, TakeError, WatchBackend, WatchHandle};
use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::event::{EventKind, EventKinds};

/// Opens watch sessions backed by the platform notify implementation.
pub struct NativeBackend {
    config: WatchConfig,
}

impl NativeBackend {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }
}

impl WatchBackend for NativeBackend {
    fn open(&self) -> Result<Arc<dyn WatchHandle>, WatchError> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);

        // Poll interval is a sensitivity hint; it only matters on platforms
        // where notify falls back to polling.
        let notify_config = notify::Config::default()
            .with_poll_interval(Duration::from_millis(self.config.poll_interval_ms));

        let watcher = notify::RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                // A full queue is treated like an OS buffer overflow: the
                // event is dropped. Blocking here would stall notify's
                // callback thread.
                let _ = tx.try_send(res);
            },
            notify_config,
        )?;

        Ok(Arc::new(NativeHandle {
            watcher: Mutex::new(Some(watcher)),
            event_rx: tokio::sync::Mutex::new(rx),
            pending: Mutex::new(VecDeque::new()),
            registration: Mutex::new(None),
            closed: AtomicBool::new(false),
        }))
    }
}

struct Registration {
    path: PathBuf,
    kinds: EventKinds,
}

/// One `RecommendedWatcher` session covering a single directory.
///
/// Closing drops the inner watcher, which tears down the OS watch and the
/// sender half of the event channel; a pending `take` then observes the
/// closed condition.
struct NativeHandle {
    watcher: Mutex<Option<notify::RecommendedWatcher>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<notify::Result<notify::Event>>>,
    pending: Mutex<VecDeque<RawEvent>>,
    registration: Mutex<Option<Registration>>,
    closed: AtomicBool,
}

impl NativeHandle {
    /// Queue the per-path raw events of one notify event, applying the
    /// registered interest set the way the OS would: unrequested kinds are
    /// dropped, unmapped kinds pass through as overflow.
    fn buffer(&self, event: notify::Event) {
        let admitted = match self.registration.lock().as_ref() {
            Some(reg) => reg.kinds.admits(EventKind::from_native(event.kind)),
            None => false,
        };
        if !admitted {
            return;
        }

        let mut pending = self.pending.lock();
        for path in event.paths {
            pending.push_back(RawEvent {
                kind: event.kind,
                path,
            });
        }
    }
}

#[async_trait]
impl WatchHandle for NativeHandle {
    fn register(&self, path: &Path, kinds: EventKinds) -> Result<(), WatchError> {
        let mut watcher = self.watcher.lock();
        let watcher = watcher.as_mut().ok_or_else(|| WatchError::PathWatchFailed {
            path: path.to_path_buf(),
            reason: "handle already closed".to_string(),
        })?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        *self.registration.lock() = Some(Registration {
            path: path.to_path_buf(),
            kinds,
        });
        Ok(())
    }

    async fn take(&self) -> Result<(), TakeError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TakeError::Closed);
        }
        // Leftovers from a previous batch count as a ready batch.
        if !self.pending.lock().is_empty() {
            return Ok(());
        }

        let mut rx = self.event_rx.lock().await;
        match rx.recv().await {
            None => Err(TakeError::Closed),
            Some(Ok(event)) => {
                self.buffer(event);
                Ok(())
            }
            Some(Err(e)) => Err(TakeError::Backend(e.to_string())),
        }
    }

    fn poll_events(&self) -> Vec<RawEvent> {
        // Fold in anything else notify has already queued so the batch
        // reflects everything delivered so far.
        if let Ok(mut rx) = self.event_rx.try_lock() {
            while let Ok(res) = rx.try_recv() {
                match res {
                    Ok(event) => self.buffer(event),
                    Err(e) => tracing::debug!("[watch] dropping queued notify error: {e}"),
                }
            }
        }

        self.pending.lock().drain(..).collect()
    }

    fn rearm(&self) -> bool {
        if self.closed.load(Ordering::Acquire) || self.watcher.lock().is_none() {
            return false;
        }
        // notify keeps a watch armed between batches, so re-arming reduces
        // to "is this session still viable": the registered directory must
        // still exist.
        self.registration
            .lock()
            .as_ref()
            .map(|reg| reg.path.exists())
            .unwrap_or(false)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Dropping the watcher tears down the OS watch and the sender half
        // of the channel, unblocking a pending take.
        self.watcher.lock().take();
    }
}
