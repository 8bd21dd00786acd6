//! Heal Gateway - HTTP API for the companion service.
//!
//! # Configuration
//!
//! Read from the environment: `LISTEN_ADDR`, `DATA_DIR`, `JWT_SECRET`,
//! `GEMINI_API_KEY`, `GEMINI_MODEL`, `RESPONDER_MODE` (`gemini` or `canned`),
//! `RESPONDER_TIMEOUT_SECS` and `CORS_ORIGINS` (comma separated).
//!
//! Without `GEMINI_API_KEY` the service still starts; chat turns then fail
//! with `responder_unavailable` unless `RESPONDER_MODE=canned`.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to use a mock token validator that
//! accepts `test-token:<user-uuid>`.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dev-mode")]
use heal_auth::MockJwtValidator;
#[cfg(not(feature = "dev-mode"))]
use heal_auth::{AuthConfig, HmacValidator};
use heal_chat::{
    CannedResponder, CompanionService, GeminiResponder, Responder, UnconfiguredResponder,
};
use heal_gateway::{create_router, GatewayState, ResponderMode, Settings};
use heal_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,heal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Heal Gateway");

    let settings = Settings::from_env()?;

    tracing::info!(
        listen_addr = %settings.gateway.listen_addr,
        data_dir = %settings.data_dir.display(),
        responder_mode = ?settings.responder_mode,
        model = %settings.responder.model,
        responder_timeout_seconds = settings.companion.responder_timeout_seconds,
        "Gateway configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %settings.data_dir.display(), "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&settings.data_dir)?);

    let responder = select_responder(&settings)?;
    let companion = Arc::new(CompanionService::new(
        store,
        responder,
        settings.companion.clone(),
    ));

    // Initialize token validator
    #[cfg(feature = "dev-mode")]
    let jwt_validator = {
        tracing::warn!("DEV MODE ENABLED - using mock JWT validator");
        tracing::warn!("Use tokens in format: test-token:<user-uuid>");
        Arc::new(MockJwtValidator)
    };

    #[cfg(not(feature = "dev-mode"))]
    let jwt_validator = Arc::new(HmacValidator::new(&AuthConfig::new(
        settings.jwt_secret.clone(),
    ))?);
    tracing::info!("JWT validator initialized");

    let listen_addr = settings.gateway.listen_addr.clone();
    let state = GatewayState::new(companion, jwt_validator, settings.gateway);
    let app = create_router(state);

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn select_responder(
    settings: &Settings,
) -> Result<Arc<dyn Responder>, Box<dyn std::error::Error>> {
    match settings.responder_mode {
        ResponderMode::Canned => {
            tracing::info!("Using canned responder");
            Ok(Arc::new(CannedResponder))
        }
        ResponderMode::Gemini if settings.responder.is_configured() => {
            tracing::info!(model = %settings.responder.model, "Using Gemini responder");
            Ok(Arc::new(GeminiResponder::new(settings.responder.clone())?))
        }
        ResponderMode::Gemini => {
            tracing::warn!("No GEMINI_API_KEY set - chat replies will be unavailable");
            Ok(Arc::new(UnconfiguredResponder))
        }
    }
}
