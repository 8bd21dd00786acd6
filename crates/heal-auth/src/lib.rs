//! Bearer token authentication for the heal companion service.
//!
//! Tokens are HS256-signed JWTs carrying a `user_id` claim. The gateway only
//! needs the validated [`UserId`](heal_core::UserId); everything past that is
//! trusted by the conversation pipeline.
//!
//! # Example
//!
//! ```
//! use heal_auth::{AuthConfig, HmacValidator, JwtValidator, TokenIssuer};
//! use heal_core::UserId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new("a-long-random-secret");
//! let issuer = TokenIssuer::new(&config)?;
//! let validator = HmacValidator::new(&config)?;
//!
//! let user_id = UserId::generate();
//! let token = issuer.issue(user_id)?;
//! let claims = validator.validate(&token).await?;
//! assert_eq!(claims.user_id, user_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod jwt;

pub use error::{AuthError, Result};
pub use jwt::{HmacValidator, JwtValidator, TokenIssuer, ValidatedClaims};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::MockJwtValidator;

/// Configuration for token signing and validation.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret.
    pub secret: String,
    /// Lifetime of issued access tokens, in seconds.
    pub access_ttl_seconds: u64,
    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_seconds: u64,
}

impl AuthConfig {
    /// Create a configuration with the default lifetimes.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl_seconds: 24 * 60 * 60,
            leeway_seconds: 30,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AuthConfig::new("secret");
        assert_eq!(config.access_ttl_seconds, 86_400);
        assert_eq!(config.leeway_seconds, 30);
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", AuthConfig::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn auth_error_status_codes() {
        assert_eq!(AuthError::TokenExpired.http_status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.http_status_code(), 401);
        assert_eq!(AuthError::MissingSecret.http_status_code(), 500);
    }

    #[test]
    fn auth_error_retriable() {
        assert!(AuthError::TokenExpired.is_retriable());
        assert!(!AuthError::InvalidSignature.is_retriable());
    }
}
