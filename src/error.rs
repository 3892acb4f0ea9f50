//! Error types for softray operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in softray operations.
///
/// Geometric edge cases (near-parallel intersections, degenerate normals)
/// are not errors; they are reported as "no hit" by the intersection
/// routines.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument to a call (e.g. non-positive point size).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized enumeration value at an untyped API boundary.
    #[error("invalid enum value: {0}")]
    InvalidEnum(String),

    /// State-machine violation (nested begin, attribute change
    /// mid-primitive, unmatched end).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Context quota exceeded.
    #[error("out of resources: {0}")]
    OutOfResources(String),

    /// Matrix stack push beyond its bounded capacity.
    #[error("matrix stack overflow")]
    StackOverflow,

    /// Matrix stack pop with an empty stack.
    #[error("matrix stack underflow")]
    StackUnderflow,

    /// Buffer allocation failure.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),
}

/// Compact error class, used by the sticky first-error-wins polling
/// surface on [`crate::context::ContextManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::InvalidEnum`].
    InvalidEnum,
    /// See [`Error::InvalidOperation`].
    InvalidOperation,
    /// See [`Error::OutOfResources`].
    OutOfResources,
    /// See [`Error::StackOverflow`].
    StackOverflow,
    /// See [`Error::StackUnderflow`].
    StackUnderflow,
    /// See [`Error::OutOfMemory`].
    OutOfMemory,
    /// See [`Error::Io`].
    Io,
    /// See [`Error::PngEncoding`].
    Encoding,
}

impl Error {
    /// Classify this error for sticky polling.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidEnum(_) => ErrorCode::InvalidEnum,
            Self::InvalidOperation(_) => ErrorCode::InvalidOperation,
            Self::OutOfResources(_) => ErrorCode::OutOfResources,
            Self::StackOverflow => ErrorCode::StackOverflow,
            Self::StackUnderflow => ErrorCode::StackUnderflow,
            Self::OutOfMemory(_) => ErrorCode::OutOfMemory,
            Self::Io(_) => ErrorCode::Io,
            Self::PngEncoding(_) => ErrorCode::Encoding,
        }
    }
}
