//! API error types and responses.
//!
//! Every failure leaves the gateway as `{"error": {"code", "message"}}` with a
//! stable code. Storage and internal details are logged, never returned.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use heal_auth::AuthError;
use heal_chat::ChatError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid authentication token.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested resource was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request conflicts with the current state.
    #[error("{0}")]
    Conflict(String),

    /// Invalid request body or parameters.
    #[error("{0}")]
    BadRequest(String),

    /// The responder could not produce a reply.
    #[error("the companion is temporarily unavailable; your message was saved")]
    ResponderUnavailable,

    /// Internal server error.
    #[error("internal error")]
    Internal,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ResponderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "invalid_state_transition",
            Self::BadRequest(_) => "validation_error",
            Self::ResponderUnavailable => "responder_unavailable",
            Self::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::InvalidUserId
            | AuthError::MissingClaim(_)
            | AuthError::InvalidToken(_) => Self::Unauthorized,
            AuthError::MissingSecret | AuthError::Internal(_) => {
                tracing::error!(error = %err, "Auth internal error");
                Self::Internal
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            // A foreign session must be indistinguishable from a missing one.
            ChatError::SessionNotFound(_) | ChatError::NotOwner { .. } => {
                Self::NotFound("session")
            }
            ChatError::MessageNotFound(_) => Self::NotFound("message"),
            ChatError::AlertNotFound(_) => Self::NotFound("alert"),
            ChatError::SafetyPlanNotFound => Self::NotFound("safety plan"),
            ChatError::Validation(msg) => Self::BadRequest(msg),
            ChatError::ResponderUnavailable { .. } => Self::ResponderUnavailable,
            ChatError::InvalidStateTransition { from, to, .. } => {
                Self::Conflict(format!("cannot change alert from {from} to {to}"))
            }
            ChatError::Store(store_err) => {
                tracing::error!(error = %store_err, "Store error");
                Self::Internal
            }
            ChatError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heal_chat::ResponderError;
    use heal_core::{SessionId, UserId};

    #[test]
    fn error_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::ResponderUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn foreign_and_missing_sessions_look_alike() {
        let session_id = SessionId::generate();
        let missing = ApiError::from(ChatError::SessionNotFound(session_id));
        let foreign = ApiError::from(ChatError::NotOwner {
            user_id: UserId::generate(),
            session_id,
        });

        assert_eq!(missing.to_string(), foreign.to_string());
        assert_eq!(missing.code(), foreign.code());
    }

    #[test]
    fn responder_failure_hides_cause() {
        let err = ApiError::from(ChatError::ResponderUnavailable {
            session_id: SessionId::generate(),
            source: ResponderError::Rejected {
                status: 400,
                message: "API key not valid".to_string(),
            },
        });

        assert_eq!(err.code(), "responder_unavailable");
        assert!(!err.to_string().contains("API key"));
    }

    #[test]
    fn store_failure_is_generic() {
        let err = ApiError::from(ChatError::Store(heal_store::StoreError::Database(
            "corruption at /data/heal/000123.sst".to_string(),
        )));
        assert_eq!(err.to_string(), "internal error");
    }
}
