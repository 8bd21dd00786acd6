//! Message log operations: appending turns, reading history and recording
//! feedback.

use chrono::Utc;
use heal_core::{MessageId, SessionId, UserId};
use heal_store::{
    ContentKind, Feedback, Message, MessageMetadata, SenderKind, Session, Store, StoreError,
};

use crate::error::{ChatError, Result};
use crate::session;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// Append a message to `session` and advance the session's `updated_at` to
/// the stored message's timestamp.
///
/// The timestamp bump is best effort: if it fails the message is still
/// returned and the failure is only logged.
///
/// # Errors
///
/// Returns `ChatError::SessionNotFound` if the session was deleted after it
/// was resolved, or an error if the message cannot be persisted.
pub fn append<S: Store>(
    store: &S,
    session: &Session,
    content: String,
    sender: SenderKind,
    content_kind: ContentKind,
    metadata: MessageMetadata,
) -> Result<Message> {
    let message = store
        .append_message(Message {
            message_id: MessageId::generate(),
            session_id: session.session_id,
            user_id: session.user_id,
            content,
            sender,
            content_kind,
            metadata,
            created_at: Utc::now(),
        })
        .map_err(|e| match e {
            StoreError::NotFound => ChatError::SessionNotFound(session.session_id),
            other => other.into(),
        })?;

    if let Err(e) = store.touch_session(&session.session_id, message.created_at) {
        tracing::warn!(
            session_id = %session.session_id,
            message_id = %message.message_id,
            error = %e,
            "Failed to advance session timestamp"
        );
    }

    Ok(message)
}

/// Read a window of a session's messages, oldest first.
///
/// # Errors
///
/// Returns an error if the session is missing or not owned by `user_id`.
pub fn history<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: &SessionId,
    limit: usize,
    offset: usize,
) -> Result<Vec<Message>> {
    session::get_session(store, user_id, session_id)?;
    Ok(store.list_messages(session_id, limit, offset)?)
}

/// Record feedback on a message, replacing any earlier feedback.
///
/// # Errors
///
/// Returns an error if:
/// - The rating is outside 1..=5
/// - The session is missing or not owned by `user_id`
/// - The message is not part of the session
pub fn attach_feedback<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: &SessionId,
    message_id: &MessageId,
    rating: u8,
    comment: Option<String>,
) -> Result<Message> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ChatError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }

    session::get_session(store, user_id, session_id)?;

    let message = store
        .get_message(message_id)?
        .ok_or(ChatError::MessageNotFound(*message_id))?;
    if message.session_id != *session_id {
        return Err(ChatError::MessageNotFound(*message_id));
    }

    let feedback = Feedback {
        rating,
        comment: comment.filter(|c| !c.trim().is_empty()),
        submitted_at: Utc::now(),
    };

    match store.set_message_feedback(message_id, feedback) {
        Ok(updated) => {
            tracing::debug!(message_id = %message_id, rating, "Recorded feedback");
            Ok(updated)
        }
        Err(StoreError::NotFound) => Err(ChatError::MessageNotFound(*message_id)),
        Err(e) => Err(e.into()),
    }
}
