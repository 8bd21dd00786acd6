//! Bounded conversation context for the responder.

use heal_core::{MessageId, SessionId, UserId};
use heal_store::Store;

use crate::error::Result;
use crate::session;

/// Contents of the latest `window` messages in a session, oldest first.
///
/// `exclude` drops the message the current turn just appended, since the
/// responder receives it separately. Older turns fall out of the window
/// and are never summarized.
///
/// # Errors
///
/// Returns an error if the session is missing or not owned by `user_id`,
/// or if the store fails.
pub fn build_context<S: Store>(
    store: &S,
    user_id: &UserId,
    session_id: &SessionId,
    window: usize,
    exclude: Option<&MessageId>,
) -> Result<Vec<String>> {
    session::get_session(store, user_id, session_id)?;

    if window == 0 {
        return Ok(Vec::new());
    }

    let fetch = window + usize::from(exclude.is_some());
    let mut contents: Vec<String> = store
        .recent_messages(session_id, fetch)?
        .into_iter()
        .filter(|m| Some(&m.message_id) != exclude)
        .map(|m| m.content)
        .collect();

    if contents.len() > window {
        contents.drain(..contents.len() - window);
    }

    Ok(contents)
}
