//! Error types shared by the indexing engine.
//!
//! Only configuration mutations, file-content lookups, persistence and the
//! scheduler's concurrency guard surface errors to callers. Failures while
//! scanning a single file or git directory are downgraded to warnings and
//! collected in a [`ScanReport`](crate::scheduler::ScanReport).

use std::{
    fmt::Display,
    io,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use thiserror::Error;
use tracing::warn;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors returned by engine operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// A filesystem entry could not be read.
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path does not exist or is not a directory.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// The directory is already registered as a root.
    #[error("directory is already registered: {}", .0.display())]
    Duplicate(PathBuf),

    /// An indexing pass is already running; retry once `is_indexing` is false.
    #[error("an indexing pass is already running")]
    Busy,

    /// The file is missing or lies outside every indexed project.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading or writing the persisted state failed.
    #[error("failed to persist {}: {message}", path.display())]
    Persist { path: PathBuf, message: String },
}

impl IndexError {
    pub(crate) fn access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether the caller may simply retry the same request later.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// Shared, thread-safe collector for non-fatal scan problems.
///
/// Cloning is cheap; all clones append to the same list.
#[derive(Clone, Default, Debug)]
pub struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it through `tracing`.
    pub fn push(&self, warning: impl Display) {
        let message = warning.to_string();
        warn!("{message}");
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain every collected warning, leaving the collector empty.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
