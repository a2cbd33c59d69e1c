//! Top-level error types for the FeedX domain.
//!
//! [`FeedxError`] is what every service operation returns. Port implementations
//! report failures through [`StoreError`], which the services convert with `?`.
//! Adapter crates (credentials, uploads, HTTP) keep their own error enums and
//! map into [`FeedxError`] at the boundary.

use thiserror::Error;

use crate::IssueStatus;

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Failure reported by a persistence or file-storage port.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (I/O, corrupt row, driver error).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Service-level errors
// ---------------------------------------------------------------------------

/// Errors returned by FeedX operations.
///
/// The `Display` text of the client-facing variants is the message shown to
/// the caller; [`FeedxError::Storage`] and [`FeedxError::Configuration`] are
/// logged and replaced by a generic message at the HTTP boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedxError {
    /// The addressed record does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Human-readable entity label (e.g. `"Resource"`, `"Issue"`).
        entity: &'static str,
    },

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, or expired credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// The caller is authenticated but lacks the required role or ownership.
    #[error("{0}")]
    Forbidden(String),

    /// The write collides with existing data.
    #[error("{0}")]
    Conflict(String),

    /// A faculty response asked for a status change the workflow forbids.
    #[error("Cannot move issue from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: IssueStatus,
        /// Requested status.
        to: IssueStatus,
    },

    /// The escalation rule refused the request.
    #[error("{0}")]
    EscalationNotAllowed(String),

    /// Underlying storage failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Start-up or runtime configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FeedxError {
    /// Shorthand for [`FeedxError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`FeedxError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// `true` for failures the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Configuration(_))
    }
}

impl From<StoreError> for FeedxError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Backend(message) => Self::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflicts_stay_client_facing() {
        let err: FeedxError = StoreError::Conflict("Username or email already exists".into()).into();
        assert_eq!(err.to_string(), "Username or email already exists");
        assert!(!err.is_internal());
    }

    #[test]
    fn backend_failures_are_internal() {
        let err: FeedxError = StoreError::Backend("disk I/O error".into()).into();
        assert!(err.is_internal());
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = FeedxError::InvalidTransition {
            from: IssueStatus::Resolved,
            to: IssueStatus::InProgress,
        };
        assert_eq!(err.to_string(), "Cannot move issue from resolved to in_progress");
    }
}
