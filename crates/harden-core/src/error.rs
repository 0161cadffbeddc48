//! Error types for harden-core

use std::path::PathBuf;

/// Result type for harden-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a target.
///
/// A validator rejecting the new document is not an error: that outcome is
/// recovered by rollback and reported through [`crate::ApplyResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target missing or unreadable; nothing was backed up or changed
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: harden_fs::Error,
    },

    /// Backup or new document could not be written
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: harden_fs::Error,
    },

    /// Restoring the snapshot failed; the target may be left broken
    #[error("ROLLBACK FAILED for {path}: could not restore {backup}: {source} ({diagnostics})")]
    RollbackFailed {
        path: PathBuf,
        backup: PathBuf,
        diagnostics: String,
        #[source]
        source: harden_fs::Error,
    },

    /// The same key appears twice in one directive set
    #[error("Directive key '{key}' appears more than once")]
    DuplicateDirective { key: String },

    /// A directive that would render to a malformed line
    #[error("Invalid directive '{key}': {reason}")]
    InvalidDirective { key: String, reason: String },

    /// A worker stopped before reporting on this target
    #[error("Apply for {path} did not complete")]
    Interrupted { path: PathBuf },

    /// Profile could not be loaded or interpreted
    #[error("Profile error: {message}")]
    Profile { message: String },

    /// Filesystem error from harden-fs
    #[error(transparent)]
    Fs(#[from] harden_fs::Error),
}

impl Error {
    /// Whether the target may have been left in an unverified state.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. } | Self::Interrupted { .. })
    }
}
