//! Error types for Framelink.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Framelink operations.
#[derive(Error, Debug)]
pub enum FramelinkError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("display mode unavailable: {0}")]
    ModeUnavailable(String),

    #[error("frame size mismatch: got {actual} bytes, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("session is stopped")]
    SessionStopped,

    #[error("completion wait timed out after {0:?}")]
    CompletionTimeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for Framelink operations.
pub type Result<T> = std::result::Result<T, FramelinkError>;
