//! Logical event kinds, interest sets, and listener-facing notifications.
//!
//! The translation between [`EventKind`] and the native `notify::EventKind`
//! is two explicit total functions. Every native kind outside the closed
//! {create, modify, remove} set collapses to [`EventKind::Overflow`], which
//! listeners never see.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use notify::event::{CreateKind, ModifyKind, RemoveKind};

/// Logical change type for a watched entry.
///
/// `Overflow` is a sentinel meaning the OS dropped events from its internal
/// buffer; it is absorbed by the event loop and never delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Modify,
    Delete,
    Overflow,
}

impl EventKind {
    /// Map a logical kind to its native `notify` representation.
    pub fn to_native(self) -> notify::EventKind {
        match self {
            EventKind::Create => notify::EventKind::Create(CreateKind::Any),
            EventKind::Modify => notify::EventKind::Modify(ModifyKind::Any),
            EventKind::Delete => notify::EventKind::Remove(RemoveKind::Any),
            EventKind::Overflow => notify::EventKind::Other,
        }
    }

    /// Map a native kind back to its logical counterpart.
    ///
    /// Anything outside the closed create/modify/remove set is reported as
    /// `Overflow` rather than an error.
    pub fn from_native(native: notify::EventKind) -> Self {
        match native {
            notify::EventKind::Create(_) => EventKind::Create,
            notify::EventKind::Modify(_) => EventKind::Modify,
            notify::EventKind::Remove(_) => EventKind::Delete,
            _ => EventKind::Overflow,
        }
    }
}

bitflags! {
    /// Set of event kinds a caller registers interest in.
    ///
    /// Overflow is implicit and cannot be requested or excluded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventKinds: u8 {
        const CREATE = 1 << 0;
        const MODIFY = 1 << 1;
        const DELETE = 1 << 2;
    }
}

impl EventKinds {
    /// Whether an event of the given logical kind passes this interest set.
    ///
    /// Overflow always passes; it is filtered downstream, not here.
    pub fn admits(self, kind: EventKind) -> bool {
        match kind {
            EventKind::Create => self.contains(EventKinds::CREATE),
            EventKind::Modify => self.contains(EventKinds::MODIFY),
            EventKind::Delete => self.contains(EventKinds::DELETE),
            EventKind::Overflow => true,
        }
    }
}

/// A change notification delivered to a listener.
///
/// Created fresh per OS event and passed to the listener by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Created { path: PathBuf },
    Modified { path: PathBuf },
    Deleted { path: PathBuf },
}

impl Notification {
    /// Build the notification for a translated kind, or `None` for
    /// `Overflow`, which has no listener-visible representation.
    pub fn from_kind(kind: EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create => Some(Notification::Created { path }),
            EventKind::Modify => Some(Notification::Modified { path }),
            EventKind::Delete => Some(Notification::Deleted { path }),
            EventKind::Overflow => None,
        }
    }

    /// The affected filesystem entry.
    pub fn path(&self) -> &Path {
        match self {
            Notification::Created { path }
            | Notification::Modified { path }
            | Notification::Deleted { path } => path,
        }
    }

    /// The logical kind this notification corresponds to.
    pub fn kind(&self) -> EventKind {
        match self {
            Notification::Created { .. } => EventKind::Create,
            Notification::Modified { .. } => EventKind::Modify,
            Notification::Deleted { .. } => EventKind::Delete,
        }
    }
}
