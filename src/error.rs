//! Error types for watch operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by watch registration.
///
/// Once a loop is running, its failures are handled internally (logged and
/// retried, or terminal for that loop alone) and never reach the caller.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watch backend: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
