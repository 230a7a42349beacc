//! Backend seam over the OS change-notification primitive.
//!
//! The engine never talks to the operating system directly; it goes through
//! [`WatchBackend`] (open a session) and [`WatchHandle`] (register, wait,
//! drain, re-arm, close). Production code uses the notify-backed
//! [`NativeBackend`]; tests substitute a scripted implementation.

mod native;

pub use native::NativeBackend;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::WatchError;
use crate::event::EventKinds;

/// One raw event drained from a handle.
///
/// `path` is the context path as the OS reported it: absolute, or relative
/// to the registered directory. The engine resolves it before delivery.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub kind: notify::EventKind,
    pub path: PathBuf,
}

/// Why a blocking [`WatchHandle::take`] returned without a ready batch.
#[derive(Error, Debug)]
pub enum TakeError {
    /// The handle was closed. The sole clean-termination signal.
    #[error("watch handle closed")]
    Closed,

    /// Transient failure; the loop logs it and waits again.
    #[error("watch backend error: {0}")]
    Backend(String),
}

/// Factory for watch sessions.
pub trait WatchBackend: Send + Sync {
    /// Open a fresh handle, not yet registered to any directory.
    fn open(&self) -> Result<Arc<dyn WatchHandle>, WatchError>;
}

/// One live watch session covering a single directory.
///
/// All methods take `&self`; implementations synchronize internally so the
/// registry can close a handle while its loop is blocked in `take`.
#[async_trait]
pub trait WatchHandle: Send + Sync {
    /// Register a directory for exactly the given kinds.
    ///
    /// Called once per handle, before the loop starts.
    fn register(&self, path: &Path, kinds: EventKinds) -> Result<(), WatchError>;

    /// Block until at least one event batch is ready or the handle closes.
    async fn take(&self) -> Result<(), TakeError>;

    /// Drain every pending event, in delivery order.
    fn poll_events(&self) -> Vec<RawEvent>;

    /// Re-arm the session after a drained batch.
    ///
    /// Returns false when the session cannot observe further events (the
    /// directory is gone, or the handle is closed); the loop treats that as
    /// terminal.
    fn rearm(&self) -> bool;

    /// Close the session, unblocking any pending `take`. Idempotent.
    fn close(&self);
}
