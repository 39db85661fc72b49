//! Error types for the protected SQS worker
//!
//! Separates the one expected, recoverable failure (the orchestrator refusing
//! task protection) from ordinary faults that terminate the process.

use std::fmt;
use thiserror::Error;

/// Boxed error from a remote client (ECS, SQS, metadata endpoint)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for worker operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to fetch task metadata: {message}")]
    MetadataFetch { message: String },

    #[error("Task protection denied: {reason}")]
    TaskProtectionDenied { reason: String },

    #[error("Task protection request failed: {0}")]
    Protection(#[source] BoxError),

    #[error("Queue operation failed: {0}")]
    Queue(#[source] BoxError),

    #[error("Message processing failed: {0}")]
    Processing(#[source] BoxError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

impl WorkerError {
    /// Create metadata fetch error
    pub fn metadata_fetch<S: Into<String>>(message: S) -> Self {
        Self::MetadataFetch {
            message: message.into(),
        }
    }

    /// Create protection denial error
    pub fn protection_denied<S: Into<String>>(reason: S) -> Self {
        Self::TaskProtectionDenied {
            reason: reason.into(),
        }
    }

    /// Wrap a protection transport fault
    pub fn protection<E: Into<BoxError>>(source: E) -> Self {
        Self::Protection(source.into())
    }

    /// Wrap a queue transport fault
    pub fn queue<E: Into<BoxError>>(source: E) -> Self {
        Self::Queue(source.into())
    }

    /// Wrap a processing fault
    pub fn processing<E: Into<BoxError>>(source: E) -> Self {
        Self::Processing(source.into())
    }

    /// True when the orchestrator refused protection (a graceful stop, not a crash)
    pub fn is_protection_denied(&self) -> bool {
        matches!(self, Self::TaskProtectionDenied { .. })
    }

    /// Orchestrator's reason string for a protection denial
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Self::TaskProtectionDenied { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Step of a loop iteration a fault originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStage {
    Protect,
    Receive,
    Process,
    Delete,
    Unprotect,
}

impl IterationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationStage::Protect => "protect",
            IterationStage::Receive => "receive",
            IterationStage::Process => "process",
            IterationStage::Delete => "delete",
            IterationStage::Unprotect => "unprotect",
        }
    }
}

impl fmt::Display for IterationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Process exit status for a finished run: 0 for a clean stop, 1 for any fault
pub fn exit_status<T>(result: &WorkerResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
