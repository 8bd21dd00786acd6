//! HTTP request handlers.
//!
//! Request and response bodies use camelCase field names.

pub mod chat;
pub mod crisis;
pub mod health;

use std::str::FromStr;

use crate::error::ApiError;

/// Parse an ID from a path segment or body field.
fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {kind} ID: {raw}")))
}
