//! `RocksDB` storage layer for the heal companion service.
//!
//! This crate persists sessions, their message logs, and the crisis support
//! records (alerts, emergency contacts, safety plans) using `RocksDB` column
//! families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `sessions` / `sessions_by_user`: Session records and their owner index
//! - `messages`: Per-session message log, keyed by `session_id || seq`
//! - `messages_by_id`: Message id to log key
//! - `alerts` / `alerts_by_user`: Crisis alerts and their owner index
//! - `contacts` / `contacts_by_user`: Emergency contacts and their owner index
//! - `safety_plans`: One plan per user, keyed by `user_id`
//!
//! Mutations that touch several keys are written as one atomic `WriteBatch`
//! and serialized behind a store-wide write lock.
//!
//! # Example
//!
//! ```no_run
//! use heal_core::UserId;
//! use heal_store::{RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/heal-db").unwrap();
//! let sessions = store.list_sessions_by_user(&UserId::generate()).unwrap();
//! assert!(sessions.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{
    AlertSeverity, AlertStatus, ContentKind, CrisisAlert, EmergencyContact, Feedback, Message,
    MessageMetadata, PlanContact, SafetyPlan, SenderKind, Session, UnknownSeverity,
};

use chrono::{DateTime, Utc};
use heal_core::{AlertId, MessageId, SessionId, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer so the conversation pipeline can be
/// exercised against any backing implementation.
pub trait Store: Send + Sync {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Insert a new session record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a session with the same id is
    /// already stored; the existing record is left untouched.
    fn create_session(&self, session: &Session) -> Result<()>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// List all sessions belonging to a user, in no particular order.
    ///
    /// # Errors
    ///
    /// Fails if RocksDB or CBOR decoding fails.
    fn list_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<Session>>;

    /// Advance a session's `updated_at` to `at`.
    ///
    /// Older timestamps are ignored so the value never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist.
    fn touch_session(&self, session_id: &SessionId, at: DateTime<Utc>) -> Result<()>;

    /// Delete a session together with its whole message log.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist.
    fn delete_session(&self, session_id: &SessionId) -> Result<()>;

    // =========================================================================
    // Message Operations
    // =========================================================================

    /// Append a message to its session's log and return the stored copy.
    ///
    /// `created_at` is raised if needed so it is strictly later than both the
    /// previous message in the same session and the session's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session no longer exists.
    fn append_message(&self, message: Message) -> Result<Message>;

    /// Get a message by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_message(&self, message_id: &MessageId) -> Result<Option<Message>>;

    /// List a window of a session's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Fails if RocksDB or CBOR decoding fails.
    fn list_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>>;

    /// Return the latest `count` messages of a session, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates database failures.
    fn recent_messages(&self, session_id: &SessionId, count: usize) -> Result<Vec<Message>>;

    /// Replace the feedback attached to a message.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the message doesn't exist.
    fn set_message_feedback(
        &self,
        message_id: &MessageId,
        feedback: Feedback,
    ) -> Result<Message>;

    // =========================================================================
    // Crisis Alert Operations
    // =========================================================================

    /// Insert or update an alert record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_alert(&self, alert: &CrisisAlert) -> Result<()>;

    /// Get an alert by ID.
    ///
    /// # Errors
    ///
    /// Fails if RocksDB or CBOR decoding fails.
    fn get_alert(&self, alert_id: &AlertId) -> Result<Option<CrisisAlert>>;

    /// List all alerts for a user, newest first.
    ///
    /// # Errors
    ///
    /// Propagates database failures.
    fn list_alerts_by_user(&self, user_id: &UserId) -> Result<Vec<CrisisAlert>>;

    /// Move an alert from `from` to `to`, stamping `resolved_at` if unset.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the alert doesn't exist, or
    /// `StoreError::Conflict` if its status is no longer `from`.
    fn transition_alert(
        &self,
        alert_id: &AlertId,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<CrisisAlert>;

    // =========================================================================
    // Emergency Contact Operations
    // =========================================================================

    /// Insert a contact. A primary contact clears the user's previous
    /// primary in the same atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn add_contact(&self, contact: &EmergencyContact) -> Result<()>;

    /// List a user's contacts, primary first, then oldest first.
    ///
    /// # Errors
    ///
    /// Fails if RocksDB or CBOR decoding fails.
    fn list_contacts_by_user(&self, user_id: &UserId) -> Result<Vec<EmergencyContact>>;

    // =========================================================================
    // Safety Plan Operations
    // =========================================================================

    /// Get a user's safety plan.
    ///
    /// # Errors
    ///
    /// Propagates database failures.
    fn get_safety_plan(&self, user_id: &UserId) -> Result<Option<SafetyPlan>>;

    /// Create or modify the user's safety plan and return the stored copy.
    ///
    /// A missing plan starts out empty with a fresh id and `created_at = now`.
    /// `update` is applied under the write lock, and `updated_at` is set to
    /// `now` or advanced past the previous value, whichever is later.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn upsert_safety_plan(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        update: &dyn Fn(&mut SafetyPlan),
    ) -> Result<SafetyPlan>;
}
