//! # Store Error Types

use std::path::PathBuf;

use thiserror::Error;
use wheelhouse_core::ParseError;

/// Errors from enumerating, opening, or hashing artifacts.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path the operation was attempted on.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact filename could not be decoded.
    #[error("invalid artifact: {0}")]
    Parse(#[from] ParseError),

    /// A filename is not valid UTF-8 and cannot be matched against requests.
    #[error("artifact filename is not valid UTF-8: {}", .0.display())]
    NonUtf8Filename(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is an invalid artifact rather than an I/O failure.
    pub fn is_invalid_artifact(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::NonUtf8Filename(_))
    }
}
