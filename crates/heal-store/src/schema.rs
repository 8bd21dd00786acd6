//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary session records, keyed by `session_id`.
    pub const SESSIONS: &str = "sessions";

    /// Index: sessions by user, keyed by `user_id || session_id`.
    pub const SESSIONS_BY_USER: &str = "sessions_by_user";

    /// Message log, keyed by `session_id || seq` with a big-endian sequence.
    pub const MESSAGES: &str = "messages";

    /// Index: `message_id` to its message log key.
    pub const MESSAGES_BY_ID: &str = "messages_by_id";

    /// Primary crisis alert records, keyed by `alert_id`.
    pub const ALERTS: &str = "alerts";

    /// Index: alerts by user, keyed by `user_id || alert_id`.
    pub const ALERTS_BY_USER: &str = "alerts_by_user";

    /// Primary emergency contact records, keyed by `contact_id`.
    pub const CONTACTS: &str = "contacts";

    /// Index: contacts by user, keyed by `user_id || contact_id`.
    pub const CONTACTS_BY_USER: &str = "contacts_by_user";

    /// Safety plans, keyed by `user_id` (one per user).
    pub const SAFETY_PLANS: &str = "safety_plans";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::SESSIONS,
        cf::SESSIONS_BY_USER,
        cf::MESSAGES,
        cf::MESSAGES_BY_ID,
        cf::ALERTS,
        cf::ALERTS_BY_USER,
        cf::CONTACTS,
        cf::CONTACTS_BY_USER,
        cf::SAFETY_PLANS,
    ]
}
