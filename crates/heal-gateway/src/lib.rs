//! HTTP gateway for the heal companion service.
//!
//! This crate is the public face of the service. It handles:
//!
//! - Bearer token authentication
//! - REST endpoints for conversations and crisis support
//! - Mapping pipeline errors onto a uniform JSON error body
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       heal-gateway                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │   Auth      │ │   Router    │ │    Error            │   │
//! │  │  Extractor  │ │  + Handlers │ │    Mapping          │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                    ┌──────────────────┐
//!                    │ CompanionService │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use heal_auth::{AuthConfig, HmacValidator};
//! use heal_chat::{CannedResponder, CompanionService};
//! use heal_gateway::{create_router, GatewayConfig, GatewayState};
//! use heal_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/heal")?);
//! let companion = Arc::new(CompanionService::with_defaults(store, Arc::new(CannedResponder)));
//! let validator = Arc::new(HmacValidator::new(&AuthConfig::new("change-me"))?);
//!
//! let state = GatewayState::new(companion, validator, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::AuthUser;
pub use config::{GatewayConfig, ResponderMode, Settings};
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
