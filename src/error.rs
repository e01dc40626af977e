//! Error types for guardian-sos
//!
//! Centralized error handling using thiserror. Only validation and
//! concurrency rejections ever reach the caller of a dispatch; everything
//! that goes wrong mid-run is surfaced through the notifier instead.

use thiserror::Error;

/// All error types that can occur in guardian-sos
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request is missing its recipients or message
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A dispatch run is already active in this process
    #[error("Dispatch already running")]
    AlreadyRunning,

    /// Run task ended without producing a report
    #[error("Run aborted: {0}")]
    RunAborted(String),
}

/// Result type alias for guardian-sos operations
pub type Result<T> = std::result::Result<T, DispatchError>;
