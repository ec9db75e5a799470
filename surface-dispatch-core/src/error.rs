//! Error types for remote calls, validation, storage and the surface lifecycle.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Phase;

/// Failure of a call to a native service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The service factory could not be reached when the proxy was bound.
    ///
    /// The proxy does not retry; callers decide when to reconnect.
    #[error("backend unavailable: {service}")]
    BackendUnavailable { service: String },

    /// The service rejected the call.
    #[error("request failed ({code}): {message}")]
    RequestFailed { code: i32, message: String },
}

impl RemoteError {
    /// Shorthand for [`RemoteError::BackendUnavailable`].
    pub fn unavailable(service: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            service: service.into(),
        }
    }

    /// Shorthand for [`RemoteError::RequestFailed`].
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            code,
            message: message.into(),
        }
    }
}

/// A UI-side precondition was not met; no remote call was issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation}: {reason}")]
pub struct ValidationError {
    pub operation: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

/// Durable storage failure.
///
/// Never terminates a surface: the persistor logs it and keeps running.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stored blob: {0}")]
    Json(#[from] serde_json::Error),
}

/// A lifecycle transition that skips a phase or moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid lifecycle transition {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
}

/// Errors returned to the code driving a surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// User intent arrived outside the `Ready` phase.
    #[error("surface is not ready (phase {0:?})")]
    NotReady(Phase),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected cross-frame message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("message from unexpected origin {origin}")]
    OriginMismatch { origin: String },

    #[error("malformed {command} message: {reason}")]
    Malformed { command: String, reason: String },
}

/// Category of a failed operation, as stored in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BackendUnavailable,
    RequestFailed,
    ValidationFailed,
}

/// A failed operation, written into a slice field such as `last_action_error`.
///
/// Carries the operation name so the UI can offer a retry for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct OperationError {
    pub operation: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationError {
    /// Convert a remote failure of `operation` into its state value.
    pub fn remote(operation: impl Into<String>, error: &RemoteError) -> Self {
        let kind = match error {
            RemoteError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            RemoteError::RequestFailed { .. } => ErrorKind::RequestFailed,
        };
        Self {
            operation: operation.into(),
            kind,
            message: error.to_string(),
        }
    }

    /// Whether retrying the same operation can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, ErrorKind::ValidationFailed)
    }
}

impl From<&ValidationError> for OperationError {
    fn from(error: &ValidationError) -> Self {
        Self {
            operation: error.operation.to_string(),
            kind: ErrorKind::ValidationFailed,
            message: error.reason.clone(),
        }
    }
}
