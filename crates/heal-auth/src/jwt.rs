//! JWT issuance, validation and claims extraction.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use heal_core::UserId;

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// Validated claims extracted from a JWT.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    /// The authenticated user.
    pub user_id: UserId,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Trait for validating bearer tokens.
#[async_trait]
pub trait JwtValidator: Send + Sync {
    /// Validate a token and extract claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, expired, or cannot be validated.
    async fn validate(&self, token: &str) -> Result<ValidatedClaims>;
}

/// Wire claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    /// User ID as a UUID string.
    user_id: String,
    /// Expiration timestamp.
    exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    iat: u64,
}

fn require_secret(config: &AuthConfig) -> Result<&[u8]> {
    if config.secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(config.secret.as_bytes())
}

/// HS256 validator using a shared secret.
pub struct HmacValidator {
    key: DecodingKey,
    validation: Validation,
}

impl HmacValidator {
    /// Create a validator from the shared secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSecret` if the secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let key = DecodingKey::from_secret(require_secret(config)?);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self { key, validation })
    }
}

#[async_trait]
impl JwtValidator for HmacValidator {
    async fn validate(&self, token: &str) -> Result<ValidatedClaims> {
        let token_data = decode::<RawClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::MissingClaim(claim.clone())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;

        let user_id = UserId::from_str(&claims.user_id).map_err(|_| AuthError::InvalidUserId)?;

        let exp_secs = i64::try_from(claims.exp).unwrap_or(i64::MAX);
        let expires_at = DateTime::from_timestamp(exp_secs, 0)
            .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".to_string()))?;

        Ok(ValidatedClaims {
            user_id,
            expires_at,
        })
    }
}

/// Mints HS256 access tokens.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    /// Create an issuer from the shared secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSecret` if the secret is empty.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let key = EncodingKey::from_secret(require_secret(config)?);
        let ttl_secs = i64::try_from(config.access_ttl_seconds).unwrap_or(i64::MAX);
        Ok(Self {
            key,
            ttl: chrono::Duration::seconds(ttl_secs),
        })
    }

    /// Issue an access token for `user_id`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String> {
        let claims = RawClaims {
            user_id: user_id.to_string(),
            exp: u64::try_from((now + self.ttl).timestamp()).unwrap_or_default(),
            iat: u64::try_from(now.timestamp()).unwrap_or_default(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::debug!(user_id = %user_id, "Issued access token");
        Ok(token)
    }
}

/// A mock JWT validator for testing.
///
/// Accepts any token in the format `test-token:<user_uuid>`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockJwtValidator;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl JwtValidator for MockJwtValidator {
    async fn validate(&self, token: &str) -> Result<ValidatedClaims> {
        let rest = token
            .strip_prefix("test-token:")
            .ok_or_else(|| AuthError::InvalidToken("expected test-token:<user>".to_string()))?;

        let user_id = UserId::from_str(rest).map_err(|_| AuthError::InvalidUserId)?;

        Ok(ValidatedClaims {
            user_id,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }
}
