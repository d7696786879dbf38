//! Error types for the planck crate.

use std::io;
use std::path::{Path, PathBuf};

/// Failure of a single atomic write, classified by the step that failed.
///
/// Every variant carries the operating-system error unchanged; use
/// [`AtomicWriteError::kind`] to inspect it or convert into [`io::Error`]
/// to get the original error back.
#[derive(Debug, thiserror::Error)]
pub enum AtomicWriteError {
    /// The target's directory is missing or inaccessible, or the staging
    /// file could not be created in it.
    #[error("cannot stage write in {dir}: {source}")]
    Path {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or flushing the staged content failed.
    #[error("failed to write staged content for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Applying the captured mode to the staging file failed for a reason
    /// other than missing privilege.
    #[error("failed to restore permissions for {path}: {source}")]
    PermissionRestore {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renaming the staging file onto the target failed.
    #[error("failed to atomically replace {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The rename succeeded but the directory entry could not be flushed.
    ///
    /// The new content is already visible at `path`; it may not survive a crash.
    #[error("replaced {path} but could not flush directory {dir}: {source}")]
    Durability {
        path: PathBuf,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AtomicWriteError {
    /// The underlying operating-system error.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Path { source, .. }
            | Self::Write { source, .. }
            | Self::PermissionRestore { source, .. }
            | Self::Rename { source, .. }
            | Self::Durability { source, .. } => source,
        }
    }

    /// Shorthand for `self.io_error().kind()`.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.io_error().kind()
    }

    /// Whether the new content is already visible at the target path.
    ///
    /// Only true for [`AtomicWriteError::Durability`].
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Durability { .. })
    }

    /// The path the error refers to: the target, or its directory for
    /// [`AtomicWriteError::Path`].
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Path { dir, .. } => dir,
            Self::Write { path, .. }
            | Self::PermissionRestore { path, .. }
            | Self::Rename { path, .. }
            | Self::Durability { path, .. } => path,
        }
    }
}

impl From<AtomicWriteError> for io::Error {
    fn from(err: AtomicWriteError) -> Self {
        match err {
            AtomicWriteError::Path { source, .. }
            | AtomicWriteError::Write { source, .. }
            | AtomicWriteError::PermissionRestore { source, .. }
            | AtomicWriteError::Rename { source, .. }
            | AtomicWriteError::Durability { source, .. } => source,
        }
    }
}

/// Convenience result type for planck operations.
pub type AtomicWriteResult<T> = Result<T, AtomicWriteError>;
