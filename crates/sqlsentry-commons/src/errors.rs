//! Shared error types for sqlsentry.
//!
//! Every failure the pipeline can recover from is represented as a value
//! here. Only `Connection` faults are meant to propagate out of a batch;
//! the other variants end up as per-statement or per-request result fields.

use std::fmt;

/// Error type shared across the pipeline crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Statement rejected by the safety guard before reaching the database
    SafetyViolation(String),

    /// Malformed request (unknown CRUD operation, bad identifier, oversized batch)
    Validation(String),

    /// The database rejected or failed a statement
    Execution(String),

    /// Connectivity-level fault (pool exhausted, I/O, TLS); aborts the batch
    Connection(String),
}

impl PipelineError {
    /// Creates a SafetyViolation error with a message.
    pub fn safety_violation(msg: impl Into<String>) -> Self {
        Self::SafetyViolation(msg.into())
    }

    /// Creates a Validation error with a message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an Execution error with a message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a Connection error with a message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// The inner message without the variant prefix.
    pub fn detail(&self) -> &str {
        match self {
            PipelineError::SafetyViolation(msg)
            | PipelineError::Validation(msg)
            | PipelineError::Execution(msg)
            | PipelineError::Connection(msg) => msg,
        }
    }

    /// Whether this fault should abort the whole batch.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, PipelineError::Connection(_))
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SafetyViolation(msg) => write!(f, "Safety violation: {}", msg),
            PipelineError::Validation(msg) => write!(f, "Validation error: {}", msg),
            PipelineError::Execution(msg) => write!(f, "Execution error: {}", msg),
            PipelineError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Result type alias using PipelineError.
pub type Result<T> = std::result::Result<T, PipelineError>;
