//! Error types for harden-fs

use std::path::PathBuf;

/// Result type for harden-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in harden-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Checksum mismatch at {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the error refers to, when there is one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::Encoding { path }
            | Self::ConfigParse { path, .. }
            | Self::LockFailed { path }
            | Self::ChecksumMismatch { path, .. } => Some(path),
            Self::UnsupportedFormat { .. } => None,
        }
    }
}
