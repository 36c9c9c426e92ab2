//! Error types for scull
//!
//! Provides a unified error type for all operations.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scull operations
///
/// Short reads and short writes are never errors; they show up as a
/// byte count smaller than the request.
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Locking Errors
    // -------------------------------------------------------------------------
    /// Lock acquisition was cancelled before entry. Nothing was attempted.
    #[error("interrupted while waiting for device lock")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    /// An allocation failed part way through a write.
    ///
    /// Segments and blocks allocated earlier in the same call are kept;
    /// the device size is not advanced.
    #[error("out of memory")]
    OutOfMemory,

    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("no such device: {0}")]
    NoSuchDevice(usize),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors (CLI boundary only)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScullError {
    /// Map onto the `std::io` error convention used by file-like callers.
    ///
    /// `Interrupted` keeps its retryable meaning; callers holding a
    /// cancelled token must not retry blindly.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Interrupted => ErrorKind::Interrupted,
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::InvalidRange(_) | Self::Config(_) => ErrorKind::InvalidInput,
            Self::NoSuchDevice(_) => ErrorKind::NotFound,
            Self::Io(err) => err.kind(),
        }
    }
}

impl From<ScullError> for std::io::Error {
    fn from(err: ScullError) -> Self {
        match err {
            ScullError::Io(inner) => inner,
            other => std::io::Error::new(other.kind(), other),
        }
    }
}
