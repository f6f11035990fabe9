//! Common error types for rotator frontends and backends

use thiserror::Error;

use crate::model::RotModel;

/// Result type for rotator operations
pub type RotResult<T> = Result<T, RotError>;

/// Errors reported by the frontend and by backends
#[derive(Debug, Error)]
pub enum RotError {
    /// Missing or inconsistent argument (unknown handle, malformed value)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation of a handle or registry slot failed
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Operation not supported by the selected backend
    #[error("Feature not available: {0}")]
    NotAvailable(String),

    /// Transport type reserved but not implemented yet
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Transport I/O failure
    #[error("I/O error: {context}")]
    Io {
        /// What was being done when the failure happened
        context: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Operation invalid given the current open/closed status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Model, token or registry entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend init hook refused the new handle
    #[error("Backend init failed for model {model}: {source}")]
    InitFailed {
        /// Model whose init hook failed
        model: RotModel,
        /// Error returned by the hook
        #[source]
        source: Box<RotError>,
    },

    /// Backend received an unexpected or malformed reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Backend gave up waiting for the device
    #[error("Operation timed out")]
    Timeout,
}

/// Error taxonomy without context, for matching and numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    OutOfMemory,
    NotAvailable,
    NotImplemented,
    Io,
    InvalidState,
    NotFound,
    InitFailed,
    Protocol,
    Timeout,
}

impl ErrorKind {
    /// Negative integer code for C-style consumers (0 is success)
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => -1,
            ErrorKind::OutOfMemory => -3,
            ErrorKind::NotImplemented => -4,
            ErrorKind::Timeout => -5,
            ErrorKind::Io => -6,
            ErrorKind::Protocol => -8,
            ErrorKind::NotAvailable => -11,
            ErrorKind::InvalidState => -15,
            ErrorKind::NotFound => -16,
            ErrorKind::InitFailed => -17,
        }
    }
}

impl RotError {
    /// Shorthand for an unsupported backend operation
    pub fn not_available(operation: &str) -> Self {
        RotError::NotAvailable(operation.to_string())
    }

    /// Wrap an I/O error with the operation that produced it
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        RotError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the taxonomy entry for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RotError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RotError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            RotError::NotAvailable(_) => ErrorKind::NotAvailable,
            RotError::NotImplemented(_) => ErrorKind::NotImplemented,
            RotError::Io { .. } => ErrorKind::Io,
            RotError::InvalidState(_) => ErrorKind::InvalidState,
            RotError::NotFound(_) => ErrorKind::NotFound,
            RotError::InitFailed { .. } => ErrorKind::InitFailed,
            RotError::Protocol(_) => ErrorKind::Protocol,
            RotError::Timeout => ErrorKind::Timeout,
        }
    }

    /// Returns the negative integer code for this error
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}
