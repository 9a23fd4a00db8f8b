//! Error types for limsdb
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for limsdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the limsdb persistence core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A validation script rejected an entity. User-facing: names the
    /// offending entity and the script's message, never a stack trace.
    #[error("validation of {entity} failed: {message}")]
    Validation {
        /// Human-readable description of the rejected entity (kind, id, type code)
        entity: String,
        /// The script's failure message
        message: String,
    },

    /// The transaction was rolled back
    #[error("transaction rolled back: {reason}")]
    TransactionAborted {
        /// Human-readable reason for the rollback
        reason: String,
    },

    /// Operation attempted on a transaction in the wrong lifecycle state
    #[error("invalid transaction state: {0}")]
    InvalidState(String),

    /// The validation engine failed to execute a script
    #[error("script evaluation error: {0}")]
    Evaluation(String),

    /// Persistence store failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal-consistency violation. Fatal, non-recoverable.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build the user-facing validation failure for an entity description
    /// and a script message (or the message of an evaluation fault).
    pub fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an invalid-state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }
}
