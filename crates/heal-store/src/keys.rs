//! Key encoding utilities for `RocksDB`.
//!
//! All ids are 16-byte UUIDs, so composite keys are fixed-width
//! concatenations that sort correctly for prefix scans. Message log keys end
//! in a big-endian sequence number, which makes lexicographic order equal to
//! append order within a session.

use heal_core::{AlertId, ContactId, MessageId, SessionId, UserId};

const ID_LEN: usize = 16;
const SEQ_LEN: usize = 8;

/// Width of a message log key.
pub const MESSAGE_KEY_LEN: usize = ID_LEN + SEQ_LEN;

fn pair(a: &[u8; ID_LEN], b: &[u8; ID_LEN]) -> Vec<u8> {
    let mut key = Vec::with_capacity(ID_LEN * 2);
    key.extend_from_slice(a);
    key.extend_from_slice(b);
    key
}

fn trailing_id(key: &[u8]) -> Option<[u8; ID_LEN]> {
    key.get(ID_LEN..ID_LEN * 2)?.try_into().ok()
}

/// Encode a session key (just the session ID bytes).
#[must_use]
pub fn session_key(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Encode a user-session index key: `user_id || session_id`.
#[must_use]
pub fn user_session_key(user_id: &UserId, session_id: &SessionId) -> Vec<u8> {
    pair(user_id.as_bytes(), session_id.as_bytes())
}

/// Encode a user prefix for scanning any of the per-user indexes.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the session ID from a user-session key.
#[must_use]
pub fn extract_session_id(key: &[u8]) -> Option<SessionId> {
    trailing_id(key).map(SessionId::from_bytes)
}

/// Encode a message log key: `session_id || seq`.
#[must_use]
pub fn message_key(session_id: &SessionId, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(MESSAGE_KEY_LEN);
    key.extend_from_slice(session_id.as_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Encode a session prefix for scanning a message log.
#[must_use]
pub fn session_prefix(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Extract the sequence number from a message log key.
#[must_use]
pub fn extract_seq(key: &[u8]) -> Option<u64> {
    let bytes: [u8; SEQ_LEN] = key.get(ID_LEN..MESSAGE_KEY_LEN)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Encode a message-id index key.
#[must_use]
pub fn message_id_key(message_id: &MessageId) -> Vec<u8> {
    message_id.as_bytes().to_vec()
}

/// Encode an alert key.
#[must_use]
pub fn alert_key(alert_id: &AlertId) -> Vec<u8> {
    alert_id.as_bytes().to_vec()
}

/// Encode a user-alert index key: `user_id || alert_id`.
#[must_use]
pub fn user_alert_key(user_id: &UserId, alert_id: &AlertId) -> Vec<u8> {
    pair(user_id.as_bytes(), alert_id.as_bytes())
}

/// Extract the alert ID from a user-alert key.
#[must_use]
pub fn extract_alert_id(key: &[u8]) -> Option<AlertId> {
    trailing_id(key).map(AlertId::from_bytes)
}

/// Encode a contact key.
#[must_use]
pub fn contact_key(contact_id: &ContactId) -> Vec<u8> {
    contact_id.as_bytes().to_vec()
}

/// Encode a user-contact index key: `user_id || contact_id`.
#[must_use]
pub fn user_contact_key(user_id: &UserId, contact_id: &ContactId) -> Vec<u8> {
    pair(user_id.as_bytes(), contact_id.as_bytes())
}

/// Extract the contact ID from a user-contact key.
#[must_use]
pub fn extract_contact_id(key: &[u8]) -> Option<ContactId> {
    trailing_id(key).map(ContactId::from_bytes)
}

/// Encode a safety plan key (the owning user's ID bytes).
#[must_use]
pub fn safety_plan_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}
