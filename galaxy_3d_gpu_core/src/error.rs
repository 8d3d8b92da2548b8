//! Error types for the Galaxy3D GPU core
//!
//! Only runtime/environment failures are represented here. Programming
//! errors (resetting a protected allocator, indexing a binding-table slot
//! out of range, ...) are assertions and never surface as `Error` values.

use std::fmt;

/// Result type for Galaxy3D GPU core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D GPU core errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Native graphics API call failed (object creation, submission, fence wait)
    BackendError(String),

    /// The device was removed or hung; nothing recorded afterwards will execute
    DeviceLost(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown binding name, mismatched constant size, ...)
    InvalidResource(String),

    /// Initialization failed (device, queue, fence)
    InitializationFailed(String),
}

impl Error {
    /// Whether this error must end the current render session
    ///
    /// Every native failure is fatal: a failed device is assumed unusable.
    /// Only `InvalidResource` describes bad caller data that can be fixed
    /// without tearing the device down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::InvalidResource(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
