//! Liveness probe.

use axum::Json;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process is serving.
    pub status: &'static str,
    /// Binary name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Report liveness. Public; no bearer token required.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_package_identity() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "heal-gateway");
        assert!(!body.version.is_empty());
    }
}
