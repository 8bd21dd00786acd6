//! Session management operations.
//!
//! Sessions are conversation threads owned by exactly one user. A session
//! that belongs to someone else is reported as `NotOwner`, which the HTTP
//! layer collapses into the same response as a missing session.

use chrono::{DateTime, Utc};
use heal_core::{SessionId, UserId};
use heal_store::{Session, Store, StoreError};

use crate::error::{ChatError, Result};

/// Default title for a session created at `at`.
#[must_use]
pub fn default_title(at: DateTime<Utc>) -> String {
    format!("Chat Session - {}", at.format("%b %-d, %Y %-I:%M %p"))
}

/// Get a session by ID, verifying ownership.
///
/// # Errors
///
/// Returns an error if:
/// - The session is not found
/// - The user is not the owner
pub fn get_session<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: &SessionId,
) -> Result<Session> {
    let session = store
        .get_session(session_id)?
        .ok_or(ChatError::SessionNotFound(*session_id))?;

    if session.user_id != *user_id {
        return Err(ChatError::NotOwner {
            user_id: *user_id,
            session_id: *session_id,
        });
    }

    Ok(session)
}

/// Return the caller's session, creating it if needed.
///
/// A supplied ID that doesn't exist yet becomes the new session's ID. A
/// supplied ID owned by another user fails without writing anything.
///
/// # Errors
///
/// Returns `ChatError::NotOwner` for a foreign session, or a store error.
pub fn resolve_or_create<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: Option<SessionId>,
) -> Result<Session> {
    if let Some(id) = session_id {
        match get_session(store, user_id, &id) {
            Ok(session) => return Ok(session),
            Err(ChatError::SessionNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    let now = Utc::now();
    let session = Session {
        session_id: session_id.unwrap_or_else(SessionId::generate),
        user_id: *user_id,
        title: default_title(now),
        created_at: now,
        updated_at: now,
    };

    match store.create_session(&session) {
        Ok(()) => {
            tracing::info!(
                session_id = %session.session_id,
                user_id = %user_id,
                "Created session"
            );
            Ok(session)
        }
        // Lost a race with a concurrent creator of the same ID.
        Err(StoreError::AlreadyExists) => get_session(store, user_id, &session.session_id),
        Err(e) => Err(e.into()),
    }
}

/// List a user's sessions, most recently active first.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn list_sessions<S: Store>(
    store: &S,
    user_id: &UserId,
    limit: usize,
    offset: usize,
) -> Result<Vec<Session>> {
    let mut sessions = store.list_sessions_by_user(user_id)?;
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(sessions.into_iter().skip(offset).take(limit).collect())
}

/// Delete a session and every message in it.
///
/// # Errors
///
/// Returns an error if:
/// - The session is not found
/// - The user is not the owner
pub fn delete_session<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: &SessionId,
) -> Result<()> {
    get_session(store, user_id, session_id)?;

    match store.delete_session(session_id) {
        Ok(()) => {
            tracing::info!(session_id = %session_id, "Deleted session");
            Ok(())
        }
        Err(StoreError::NotFound) => Err(ChatError::SessionNotFound(*session_id)),
        Err(e) => Err(e.into()),
    }
}
