//! Core types for the heal companion service.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - **Identifiers**: Strongly-typed UUID ids for users, sessions, messages,
//!   crisis alerts, emergency contacts and safety plans
//! - **Id errors**: The parse failure shared by every identifier
//!
//! # Example
//!
//! ```
//! use heal_core::{SessionId, UserId};
//!
//! let user_id: UserId = "6f1c2a0e-8d7b-4c55-9a21-3e4f5b6c7d8e".parse().unwrap();
//! let session_id = SessionId::generate();
//! assert_ne!(user_id.to_string(), session_id.to_string());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{AlertId, ContactId, IdError, MessageId, PlanId, SessionId, UserId};
