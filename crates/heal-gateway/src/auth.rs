//! Bearer token extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use heal_auth::{JwtValidator, ValidatedClaims};
use heal_chat::Companion;
use heal_core::UserId;

use crate::error::ApiError;
use crate::state::GatewayState;

/// An authenticated caller.
///
/// Validates the `Authorization: Bearer <token>` header. Handlers that take
/// this extractor never see unauthenticated requests.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The caller's user ID.
    pub user_id: UserId,
}

impl From<ValidatedClaims> for AuthUser {
    fn from(claims: ValidatedClaims) -> Self {
        Self {
            user_id: claims.user_id,
        }
    }
}

/// Pull the token out of an `Authorization` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<C, V> FromRequestParts<Arc<GatewayState<C, V>>> for AuthUser
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<C, V>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.jwt_validator.validate(token).await?;

        Ok(Self::from(claims))
    }
}
