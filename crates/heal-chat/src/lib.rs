//! Conversation pipeline and crisis support for the heal companion service.
//!
//! This crate holds the business logic behind every public operation: it
//! resolves sessions, persists turns, builds the bounded context handed to the
//! responder, and manages crisis alerts, emergency contacts and safety plans.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Gateway (HTTP)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CompanionService                         │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────────────┐   │
//! │  │ Session  │ │ History  │ │ Context  │ │ Crisis / Risk │   │
//! │  └──────────┘ └──────────┘ └──────────┘ └───────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                     │                         │
//!                     ▼                         ▼
//!              ┌──────────────┐         ┌──────────────┐
//!              │    Store     │         │  Responder   │
//!              │  (RocksDB)   │         │ (Gemini/...) │
//!              └──────────────┘         └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use heal_chat::{CannedResponder, Companion, CompanionService, SendMessageRequest};
//! use heal_core::UserId;
//! use heal_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/heal")?);
//! let companion = CompanionService::with_defaults(store, Arc::new(CannedResponder));
//!
//! let user_id = UserId::generate();
//! let turn = companion
//!     .send_message(&user_id, SendMessageRequest::text(None, "I feel anxious today"))
//!     .await?;
//!
//! println!("{}", turn.assistant_message.content);
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Semantics
//!
//! A turn persists the user message before calling the responder. If the
//! responder fails or exceeds the configured timeout the turn returns
//! `ChatError::ResponderUnavailable`, the user message stays in history and
//! no assistant message is written.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod crisis;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod responder;
pub mod risk;
pub mod service;
pub mod session;
pub mod types;

pub use error::{ChatError, Result};
pub use responder::{
    CannedResponder, GeminiResponder, Reply, Responder, ResponderConfig, ResponderError,
    UnconfiguredResponder, COMPANION_PERSONA,
};
pub use service::{Companion, CompanionService};
pub use types::{
    CompanionConfig, FeedbackRequest, NewAlert, NewContact, Page, SafetyPlanUpdate,
    SendMessageOutcome, SendMessageRequest,
};
