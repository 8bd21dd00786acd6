//! Failures raised while minting or checking bearer tokens.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Why a bearer token was refused or could not be produced.
#[derive(Debug, Error)]
pub enum AuthError {
    /// `exp` is in the past.
    #[error("token expired")]
    TokenExpired,

    /// The HMAC does not match the configured secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// `sub` is not a UUID.
    #[error("subject is not a valid user id")]
    InvalidUserId,

    /// A claim the validator requires is absent.
    #[error("missing required claim: {0}")]
    MissingClaim(String),

    /// Not a well-formed JWT.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// No signing secret was configured.
    #[error("signing secret not configured")]
    MissingSecret,

    /// Signing failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether a fresh token would fix the request.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// HTTP status for this failure.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::TokenExpired
            | Self::InvalidSignature
            | Self::InvalidUserId
            | Self::MissingClaim(_)
            | Self::InvalidToken(_) => 401,
            Self::MissingSecret | Self::Internal(_) => 500,
        }
    }
}
