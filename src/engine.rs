//! Watch registration and the per-directory event loop.
//!
//! Each registered directory gets its own backend handle and its own
//! independent loop task. The shared [`HandleRegistry`] is the only state
//! the tasks and the registration path have in common.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::backend::{NativeBackend, TakeError, WatchBackend, WatchHandle};
use crate::config::Settings;
use crate::error::WatchError;
use crate::event::{EventKind, EventKinds, Notification};
use crate::registry::{HandleRegistry, WatchId};

/// Callback receiving translated notifications.
///
/// Invoked synchronously on the loop task of the directory that produced
/// the event. A listener that blocks stalls only that directory's delivery.
pub type Listener = Arc<dyn Fn(Notification) + Send + Sync>;

/// Parameters of one watch operation.
pub struct WatchRequest {
    pub path: PathBuf,
    pub kinds: EventKinds,
    pub listener: Listener,
    pub recurse: bool,
}

/// Entry point for registering filesystem watches.
pub struct DirWatcher {
    backend: Arc<dyn WatchBackend>,
    registry: Arc<HandleRegistry>,
}

impl DirWatcher {
    /// Create a watcher backed by the platform notify implementation,
    /// with its own isolated registry.
    pub fn new(settings: &Settings) -> Self {
        Self::with_backend(
            Arc::new(NativeBackend::new(settings.watch.clone())),
            Arc::new(HandleRegistry::new()),
        )
    }

    /// Create a watcher with an injected backend and registry.
    pub fn with_backend(backend: Arc<dyn WatchBackend>, registry: Arc<HandleRegistry>) -> Self {
        Self { backend, registry }
    }

    /// The registry holding this watcher's live handles.
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Register interest in `kinds` under `path`.
    ///
    /// With `recurse`, every directory reachable by descent (symlinks not
    /// followed) gets its own handle and loop, exactly as if each had been
    /// registered individually. Directories created after this call are not
    /// picked up automatically.
    ///
    /// Returns once registration is done; delivery happens asynchronously
    /// on the spawned loop tasks. Only a failure to open or register the
    /// root directory's handle is surfaced here.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(
        &self,
        path: &Path,
        kinds: EventKinds,
        listener: impl Fn(Notification) + Send + Sync + 'static,
        recurse: bool,
    ) -> Result<(), WatchError> {
        self.submit(WatchRequest {
            path: path.to_path_buf(),
            kinds,
            listener: Arc::new(listener),
            recurse,
        })
    }

    /// Register the watch described by `request`.
    pub fn submit(&self, request: WatchRequest) -> Result<(), WatchError> {
        let WatchRequest {
            path,
            kinds,
            listener,
            recurse,
        } = request;

        if !path.exists() {
            return Err(WatchError::PathWatchFailed {
                path,
                reason: "path does not exist".to_string(),
            });
        }

        if !recurse {
            return self.watch_dir(&path, kinds, listener);
        }

        // Pre-order descent: the root first, then every subdirectory. Each
        // visit runs the single-directory registration with the same kinds
        // and listener.
        let mut walker = WalkDir::new(&path).follow_links(false).into_iter();
        match walker.next() {
            Some(Ok(root)) => self.watch_dir(root.path(), kinds, listener.clone())?,
            Some(Err(e)) => {
                return Err(WatchError::PathWatchFailed {
                    path,
                    reason: e.to_string(),
                });
            }
            None => {
                return Err(WatchError::PathWatchFailed {
                    path,
                    reason: "nothing to walk".to_string(),
                });
            }
        }

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[watch] skipping unreadable entry under {}: {e}", path.display());
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            // A subdirectory that cannot be watched (vanished mid-walk,
            // permissions) does not fail the whole request.
            if let Err(e) = self.watch_dir(entry.path(), kinds, listener.clone()) {
                tracing::warn!("[watch] failed to watch {}: {e}", entry.path().display());
            }
        }

        Ok(())
    }

    /// Single-directory registration: one new handle, enqueued into the
    /// registry at creation, registered for exactly `kinds`, then one
    /// spawned loop task.
    fn watch_dir(
        &self,
        dir: &Path,
        kinds: EventKinds,
        listener: Listener,
    ) -> Result<(), WatchError> {
        let handle = self.backend.open()?;
        let id = self.registry.insert(handle.clone());

        if let Err(e) = handle.register(dir, kinds) {
            self.registry.discard(id);
            return Err(e);
        }
        crate::debug_event!("watch", "registered", "{}", dir.display());

        let task = tokio::spawn(run_loop(
            id,
            handle,
            dir.to_path_buf(),
            listener,
            Arc::clone(&self.registry),
        ));
        self.registry.attach_task(id, task);
        Ok(())
    }

    /// Close every outstanding handle and wait for the loops to stop.
    ///
    /// Global: not scoped to any one watch request. Safe to call with an
    /// empty registry.
    pub async fn close_all(&self) {
        self.registry.close_all().await;
    }
}

/// Per-directory event loop.
///
/// Blocks until the handle reports a ready batch, drains it, hands
/// translated notifications to the listener on this task, then re-arms.
/// Transient wait failures keep the loop alive; a closed handle ends it
/// silently; a failed re-arm ends it and discards the registry entry.
///
/// Listener panics are deliberately not caught: they abort this one task
/// and leave every other loop running.
async fn run_loop(
    id: WatchId,
    handle: Arc<dyn WatchHandle>,
    dir: PathBuf,
    listener: Listener,
    registry: Arc<HandleRegistry>,
) {
    loop {
        match handle.take().await {
            Ok(()) => {}
            Err(TakeError::Closed) => {
                crate::debug_event!("watch", "closed", "{}", dir.display());
                return;
            }
            Err(TakeError::Backend(reason)) => {
                tracing::error!("[watch] wait failed for {}: {reason}", dir.display());
                continue;
            }
        }

        for raw in handle.poll_events() {
            let kind = EventKind::from_native(raw.kind);
            let path = resolve(&dir, raw.path);
            // Overflow carries no attributable path; absorb it.
            let Some(notification) = Notification::from_kind(kind, path) else {
                continue;
            };
            listener(notification);
        }

        if !handle.rearm() {
            crate::log_event!("watch", "stopped", "{} is no longer watchable", dir.display());
            registry.discard(id);
            return;
        }
    }
}

/// Resolve an event's context path against the watched directory.
fn resolve(dir: &Path, context: PathBuf) -> PathBuf {
    if context.is_absolute() {
        context
    } else {
        dir.join(context)
    }
}
