//! Error types for the conversation pipeline.

use heal_core::{AlertId, MessageId, SessionId, UserId};
use heal_store::AlertStatus;
use thiserror::Error;

use crate::responder::ResponderError;

/// A result type using `ChatError`.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur in pipeline operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session exists but belongs to someone else.
    ///
    /// Callers outside the crate must report this exactly like
    /// `SessionNotFound`.
    #[error("user {user_id} does not own session {session_id}")]
    NotOwner {
        /// The user making the request.
        user_id: UserId,
        /// The session being accessed.
        session_id: SessionId,
    },

    /// The message does not exist in the given session.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// The alert does not exist for this user.
    #[error("alert not found: {0}")]
    AlertNotFound(AlertId),

    /// The user has no safety plan yet.
    #[error("safety plan not found")]
    SafetyPlanNotFound,

    /// Request input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The responder failed or timed out. The user message is already stored.
    #[error("responder unavailable for session {session_id}: {source}")]
    ResponderUnavailable {
        /// Session whose turn failed.
        session_id: SessionId,
        /// Underlying responder failure.
        #[source]
        source: ResponderError,
    },

    /// The requested alert status change is not allowed.
    #[error("invalid status transition for alert {alert_id}: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The alert being transitioned.
        alert_id: AlertId,
        /// The current status.
        from: AlertStatus,
        /// The requested status.
        to: AlertStatus,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] heal_store::StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::SessionNotFound(_)
            | Self::NotOwner { .. }
            | Self::MessageNotFound(_)
            | Self::AlertNotFound(_)
            | Self::SafetyPlanNotFound => 404,
            Self::Validation(_) => 400,
            Self::ResponderUnavailable { .. } => 503,
            Self::InvalidStateTransition { .. } => 409,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ResponderUnavailable { .. } | Self::Store(_) | Self::Internal(_)
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        let session_id = SessionId::generate();
        let user_id = UserId::generate();
        let alert_id = AlertId::generate();

        assert_eq!(ChatError::SessionNotFound(session_id).http_status_code(), 404);
        assert_eq!(
            ChatError::NotOwner {
                user_id,
                session_id
            }
            .http_status_code(),
            404
        );
        assert_eq!(ChatError::validation("empty").http_status_code(), 400);
        assert_eq!(
            ChatError::ResponderUnavailable {
                session_id,
                source: ResponderError::RateLimited,
            }
            .http_status_code(),
            503
        );
        assert_eq!(
            ChatError::InvalidStateTransition {
                alert_id,
                from: AlertStatus::Resolved,
                to: AlertStatus::Escalated,
            }
            .http_status_code(),
            409
        );
    }

    #[test]
    fn only_transient_errors_retry() {
        let session_id = SessionId::generate();
        assert!(ChatError::ResponderUnavailable {
            session_id,
            source: ResponderError::EmptyResponse,
        }
        .is_retriable());
        assert!(!ChatError::SessionNotFound(session_id).is_retriable());
        assert!(!ChatError::validation("x").is_retriable());
    }
}
