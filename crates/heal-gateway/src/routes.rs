//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use heal_auth::JwtValidator;
use heal_chat::Companion;

use crate::handlers::{chat, crisis, health};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Chat (authenticated)
/// - `POST /v1/chat/messages` - Send a message
/// - `GET /v1/chat/sessions` - List sessions
/// - `GET /v1/chat/sessions/:session_id/messages` - Session history
/// - `DELETE /v1/chat/sessions/:session_id` - Delete session
/// - `POST /v1/chat/feedback` - Rate a message
///
/// ## Crisis (authenticated)
/// - `GET /v1/crisis/alerts` - List alerts
/// - `POST /v1/crisis/alerts` - Raise alert
/// - `POST /v1/crisis/alerts/:alert_id/status` - Resolve or escalate
/// - `GET /v1/crisis/contacts` - List emergency contacts
/// - `POST /v1/crisis/contacts` - Add emergency contact
/// - `GET /v1/crisis/safety-plan` - Get safety plan
/// - `PUT /v1/crisis/safety-plan` - Create or update safety plan
pub fn create_router<C, V>(state: GatewayState<C, V>) -> Router
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let cors = build_cors_layer(&state.config.cors_origins);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(TimeoutLayer::new(state.config.request_timeout()));

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Chat
        .route("/v1/chat/messages", post(chat::send_message::<C, V>))
        .route("/v1/chat/sessions", get(chat::list_sessions::<C, V>))
        .route(
            "/v1/chat/sessions/:session_id",
            axum::routing::delete(chat::delete_session::<C, V>),
        )
        .route(
            "/v1/chat/sessions/:session_id/messages",
            get(chat::get_history::<C, V>),
        )
        .route("/v1/chat/feedback", post(chat::submit_feedback::<C, V>))
        // Crisis
        .route(
            "/v1/crisis/alerts",
            get(crisis::list_alerts::<C, V>).post(crisis::create_alert::<C, V>),
        )
        .route(
            "/v1/crisis/alerts/:alert_id/status",
            post(crisis::update_alert_status::<C, V>),
        )
        .route(
            "/v1/crisis/contacts",
            get(crisis::list_contacts::<C, V>).post(crisis::add_contact::<C, V>),
        )
        .route(
            "/v1/crisis/safety-plan",
            get(crisis::get_safety_plan::<C, V>).put(crisis::upsert_safety_plan::<C, V>),
        )
        .layer(middleware)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
