//! Structured error types for the Physalia ecosystem.

use thiserror::Error;

/// Unified error type for all Physalia operations.
#[derive(Debug, Error)]
pub enum PhysaliaError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed input data)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A database directory already exists at the create path
    #[error("database '{0}' already exists")]
    DatabaseExists(String),

    /// No database directory at the open path
    #[error("database '{0}' does not exist")]
    DatabaseMissing(String),

    /// Write attempted on a database that has been closed
    #[error("database is closed for writing")]
    DatabaseClosed,

    /// Operands of mismatched dimension (BOF vectors, coordinate windows)
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// On-disk data that cannot be decoded (truncated or inconsistent record)
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the Physalia ecosystem.
pub type Result<T> = std::result::Result<T, PhysaliaError>;
