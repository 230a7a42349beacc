//! Asynchronous file-system change notifications.
//!
//! Register interest in create/modify/delete events under a path, optionally
//! recursing into subdirectories, and receive translated notifications
//! through a callback. One OS watch handle per watched directory, one
//! independent event loop per handle, and a shared registry that lets all
//! outstanding handles be bulk-closed.
//!
//! # Architecture
//!
//! ```text
//! DirWatcher::watch(path, kinds, listener, recurse)
//!       |
//!       | one handle + one loop task per directory
//!       v
//! WatchBackend::open() -> WatchHandle      HandleRegistry
//!       |  register / take / poll / rearm        ^
//!       v                                        | enqueue on creation,
//! run_loop: translate kinds, resolve paths,      | drain on close_all
//!           invoke listener                      |
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dirwatch::{DirWatcher, EventKinds, Settings};
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), dirwatch::WatchError> {
//! let watcher = DirWatcher::new(&Settings::default());
//! watcher.watch(
//!     Path::new("/tmp/x"),
//!     EventKinds::CREATE | EventKinds::DELETE,
//!     |notification| println!("{notification:?}"),
//!     false,
//! )?;
//! // ... later
//! watcher.close_all().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod registry;

pub use backend::{NativeBackend, RawEvent, TakeError, WatchBackend, WatchHandle};
pub use config::{LoggingConfig, Settings, WatchConfig};
pub use engine::{DirWatcher, Listener, WatchRequest};
pub use error::WatchError;
pub use event::{EventKind, EventKinds, Notification};
pub use registry::{HandleRegistry, WatchId};
