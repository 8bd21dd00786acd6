//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use heal_core::{AlertId, MessageId, SessionId, UserId};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{
    AlertStatus, CrisisAlert, EmergencyContact, Feedback, Message, SafetyPlan, Session,
};
use crate::Store;

/// Returns `candidate` if it is later than `previous`, otherwise the
/// smallest representable step after `previous`.
fn strictly_after(previous: DateTime<Utc>, candidate: DateTime<Utc>) -> DateTime<Utc> {
    if candidate > previous {
        candidate
    } else {
        previous + Duration::microseconds(1)
    }
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-modify-write mutations.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect every key in `cf_name` that starts with `prefix`.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Newest entry in a session's log, with its sequence number.
    fn last_message(&self, session_id: &SessionId) -> Result<Option<(u64, Message)>> {
        let cf = self.cf(cf::MESSAGES)?;
        let prefix = keys::session_prefix(session_id);
        let upper = keys::message_key(session_id, u64::MAX);

        let mut iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));

        let Some(item) = iter.next() else {
            return Ok(None);
        };
        let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
        if !key.starts_with(&prefix) {
            return Ok(None);
        }
        let seq = keys::extract_seq(&key)
            .ok_or_else(|| StoreError::Database("malformed message key".to_string()))?;
        Ok(Some((seq, Self::deserialize(&value)?)))
    }

    fn message_log_key(&self, message_id: &MessageId) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf::MESSAGES_BY_ID)?;
        self.db
            .get_cf(&cf, keys::message_id_key(message_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    fn create_session(&self, session: &Session) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_user = self.cf(cf::SESSIONS_BY_USER)?;

        let session_key = keys::session_key(&session.session_id);
        let user_session_key = keys::user_session_key(&session.user_id, &session.session_id);
        let value = Self::serialize(session)?;

        let _guard = self.write_lock.lock();
        if self.get_session(&session.session_id)?.is_some() {
            return Err(StoreError::AlreadyExists);
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_sessions, &session_key, &value);
        batch.put_cf(&cf_by_user, &user_session_key, b"");

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.get_value(cf::SESSIONS, &keys::session_key(session_id))
    }

    fn list_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<Session>> {
        let prefix = keys::user_prefix(user_id);

        let mut sessions = Vec::new();
        for (key, _) in self.scan_prefix(cf::SESSIONS_BY_USER, &prefix)? {
            let Some(session_id) = keys::extract_session_id(&key) else {
                continue;
            };
            if let Some(session) = self.get_session(&session_id)? {
                sessions.push(session);
            }
        }

        Ok(sessions)
    }

    fn touch_session(&self, session_id: &SessionId, at: DateTime<Utc>) -> Result<()> {
        let cf = self.cf(cf::SESSIONS)?;

        let _guard = self.write_lock.lock();
        let mut session = self.get_session(session_id)?.ok_or(StoreError::NotFound)?;
        if at <= session.updated_at {
            return Ok(());
        }
        session.updated_at = at;

        self.db
            .put_cf(&cf, keys::session_key(session_id), Self::serialize(&session)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_user = self.cf(cf::SESSIONS_BY_USER)?;
        let cf_messages = self.cf(cf::MESSAGES)?;
        let cf_by_id = self.cf(cf::MESSAGES_BY_ID)?;

        let _guard = self.write_lock.lock();
        let session = self.get_session(session_id)?.ok_or(StoreError::NotFound)?;

        let log = self.scan_prefix(cf::MESSAGES, &keys::session_prefix(session_id))?;
        let message_count = log.len();

        let mut batch = WriteBatch::default();
        for (key, value) in log {
            let message: Message = Self::deserialize(&value)?;
            batch.delete_cf(&cf_by_id, keys::message_id_key(&message.message_id));
            batch.delete_cf(&cf_messages, &key);
        }
        batch.delete_cf(&cf_sessions, keys::session_key(session_id));
        batch.delete_cf(&cf_by_user, keys::user_session_key(&session.user_id, session_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(session_id = %session_id, message_count, "Deleted session log");

        Ok(())
    }

    // =========================================================================
    // Message Operations
    // =========================================================================

    fn append_message(&self, mut message: Message) -> Result<Message> {
        let cf_messages = self.cf(cf::MESSAGES)?;
        let cf_by_id = self.cf(cf::MESSAGES_BY_ID)?;

        let _guard = self.write_lock.lock();
        let session = self
            .get_session(&message.session_id)?
            .ok_or(StoreError::NotFound)?;
        message.created_at = strictly_after(session.updated_at, message.created_at);

        let seq = match self.last_message(&message.session_id)? {
            Some((last_seq, last)) => {
                message.created_at = strictly_after(last.created_at, message.created_at);
                last_seq + 1
            }
            None => 0,
        };

        let log_key = keys::message_key(&message.session_id, seq);
        let value = Self::serialize(&message)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_messages, &log_key, &value);
        batch.put_cf(&cf_by_id, keys::message_id_key(&message.message_id), &log_key);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(message)
    }

    fn get_message(&self, message_id: &MessageId) -> Result<Option<Message>> {
        match self.message_log_key(message_id)? {
            Some(log_key) => self.get_value(cf::MESSAGES, &log_key),
            None => Ok(None),
        }
    }

    fn list_messages(
        &self,
        session_id: &SessionId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>> {
        let cf = self.cf(cf::MESSAGES)?;
        let prefix = keys::session_prefix(session_id);

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut messages = Vec::new();
        for item in iter.skip(offset) {
            if messages.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            messages.push(Self::deserialize(&value)?);
        }

        Ok(messages)
    }

    fn recent_messages(&self, session_id: &SessionId, count: usize) -> Result<Vec<Message>> {
        let cf = self.cf(cf::MESSAGES)?;
        let prefix = keys::session_prefix(session_id);
        let upper = keys::message_key(session_id, u64::MAX);

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));

        let mut messages: Vec<Message> = Vec::with_capacity(count);
        for item in iter {
            if messages.len() >= count {
                break;
            }
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            messages.push(Self::deserialize(&value)?);
        }
        messages.reverse();

        Ok(messages)
    }

    fn set_message_feedback(
        &self,
        message_id: &MessageId,
        feedback: Feedback,
    ) -> Result<Message> {
        let cf = self.cf(cf::MESSAGES)?;

        let _guard = self.write_lock.lock();
        let log_key = self.message_log_key(message_id)?.ok_or(StoreError::NotFound)?;
        let mut message: Message = self
            .get_value(cf::MESSAGES, &log_key)?
            .ok_or(StoreError::NotFound)?;
        message.metadata.feedback = Some(feedback);

        self.db
            .put_cf(&cf, &log_key, Self::serialize(&message)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(message)
    }

    // =========================================================================
    // Crisis Alert Operations
    // =========================================================================

    fn put_alert(&self, alert: &CrisisAlert) -> Result<()> {
        let cf_alerts = self.cf(cf::ALERTS)?;
        let cf_by_user = self.cf(cf::ALERTS_BY_USER)?;

        let value = Self::serialize(alert)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_alerts, keys::alert_key(&alert.alert_id), &value);
        batch.put_cf(&cf_by_user, keys::user_alert_key(&alert.user_id, &alert.alert_id), b"");

        let _guard = self.write_lock.lock();
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_alert(&self, alert_id: &AlertId) -> Result<Option<CrisisAlert>> {
        self.get_value(cf::ALERTS, &keys::alert_key(alert_id))
    }

    fn list_alerts_by_user(&self, user_id: &UserId) -> Result<Vec<CrisisAlert>> {
        let prefix = keys::user_prefix(user_id);

        let mut alerts = Vec::new();
        for (key, _) in self.scan_prefix(cf::ALERTS_BY_USER, &prefix)? {
            let Some(alert_id) = keys::extract_alert_id(&key) else {
                continue;
            };
            if let Some(alert) = self.get_alert(&alert_id)? {
                alerts.push(alert);
            }
        }
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(alerts)
    }

    fn transition_alert(
        &self,
        alert_id: &AlertId,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
    ) -> Result<CrisisAlert> {
        let cf = self.cf(cf::ALERTS)?;

        let _guard = self.write_lock.lock();
        let mut alert = self.get_alert(alert_id)?.ok_or(StoreError::NotFound)?;
        if alert.status != from {
            return Err(StoreError::Conflict);
        }
        alert.status = to;
        alert.resolved_at.get_or_insert(at);

        self.db
            .put_cf(&cf, keys::alert_key(alert_id), Self::serialize(&alert)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(alert)
    }

    // =========================================================================
    // Emergency Contact Operations
    // =========================================================================

    fn add_contact(&self, contact: &EmergencyContact) -> Result<()> {
        let cf_contacts = self.cf(cf::CONTACTS)?;
        let cf_by_user = self.cf(cf::CONTACTS_BY_USER)?;

        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::default();

        if contact.is_primary {
            for mut previous in self.list_contacts_by_user(&contact.user_id)? {
                if previous.is_primary {
                    previous.is_primary = false;
                    batch.put_cf(
                        &cf_contacts,
                        keys::contact_key(&previous.contact_id),
                        Self::serialize(&previous)?,
                    );
                }
            }
        }

        batch.put_cf(
            &cf_contacts,
            keys::contact_key(&contact.contact_id),
            Self::serialize(contact)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_contact_key(&contact.user_id, &contact.contact_id),
            b"",
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_contacts_by_user(&self, user_id: &UserId) -> Result<Vec<EmergencyContact>> {
        let prefix = keys::user_prefix(user_id);

        let mut contacts: Vec<EmergencyContact> = Vec::new();
        for (key, _) in self.scan_prefix(cf::CONTACTS_BY_USER, &prefix)? {
            let Some(contact_id) = keys::extract_contact_id(&key) else {
                continue;
            };
            if let Some(contact) = self.get_value(cf::CONTACTS, &keys::contact_key(&contact_id))? {
                contacts.push(contact);
            }
        }
        contacts.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.created_at.cmp(&b.created_at))
        });

        Ok(contacts)
    }

    // =========================================================================
    // Safety Plan Operations
    // =========================================================================

    fn get_safety_plan(&self, user_id: &UserId) -> Result<Option<SafetyPlan>> {
        self.get_value(cf::SAFETY_PLANS, &keys::safety_plan_key(user_id))
    }

    fn upsert_safety_plan(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        update: &dyn Fn(&mut SafetyPlan),
    ) -> Result<SafetyPlan> {
        let cf = self.cf(cf::SAFETY_PLANS)?;

        let _guard = self.write_lock.lock();
        let mut plan = match self.get_safety_plan(user_id)? {
            Some(mut previous) => {
                previous.updated_at = strictly_after(previous.updated_at, now);
                previous
            }
            None => SafetyPlan::empty(*user_id, now),
        };
        update(&mut plan);

        self.db
            .put_cf(&cf, keys::safety_plan_key(user_id), Self::serialize(&plan)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertSeverity, ContentKind, MessageMetadata, SenderKind};
    use heal_core::ContactId;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn create_test_session(store: &RocksStore, user_id: UserId) -> Session {
        let now = Utc::now();
        let session = Session {
            session_id: SessionId::generate(),
            user_id,
            title: "Chat Session".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.create_session(&session).unwrap();
        session
    }

    fn message(session: &Session, content: &str, created_at: DateTime<Utc>) -> Message {
        Message {
            message_id: MessageId::generate(),
            session_id: session.session_id,
            user_id: session.user_id,
            content: content.to_string(),
            sender: SenderKind::User,
            content_kind: ContentKind::Text,
            metadata: MessageMetadata::default(),
            created_at,
        }
    }

    fn contact(user_id: UserId, name: &str, is_primary: bool) -> EmergencyContact {
        EmergencyContact {
            contact_id: ContactId::generate(),
            user_id,
            name: name.to_string(),
            phone: "0700000000".to_string(),
            relationship: None,
            is_primary,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn session_create_is_insert_if_absent() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());

        let mut hijack = session.clone();
        hijack.user_id = UserId::generate();
        assert!(matches!(
            store.create_session(&hijack),
            Err(StoreError::AlreadyExists)
        ));

        let stored = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(stored.user_id, session.user_id);
    }

    #[test]
    fn list_sessions_by_user_is_scoped() {
        let (store, _dir) = create_test_store();
        let user1 = UserId::generate();
        let user2 = UserId::generate();

        create_test_session(&store, user1);
        create_test_session(&store, user1);
        create_test_session(&store, user2);

        assert_eq!(store.list_sessions_by_user(&user1).unwrap().len(), 2);
        assert_eq!(store.list_sessions_by_user(&user2).unwrap().len(), 1);
    }

    #[test]
    fn append_clamps_timestamps_strictly_increasing() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        let fixed = Utc::now();

        let first = store.append_message(message(&session, "one", fixed)).unwrap();
        let second = store.append_message(message(&session, "two", fixed)).unwrap();
        let third = store
            .append_message(message(&session, "three", fixed - Duration::seconds(5)))
            .unwrap();

        assert_eq!(first.created_at, fixed);
        assert!(second.created_at > first.created_at);
        assert!(third.created_at > second.created_at);

        let history = store.list_messages(&session.session_id, 10, 0).unwrap();
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn list_messages_windows_and_isolates_sessions() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let session = create_test_session(&store, user_id);
        let other = create_test_session(&store, user_id);

        for i in 0..5 {
            store
                .append_message(message(&session, &format!("m{i}"), Utc::now()))
                .unwrap();
        }
        store
            .append_message(message(&other, "elsewhere", Utc::now()))
            .unwrap();

        let page = store.list_messages(&session.session_id, 2, 1).unwrap();
        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m1", "m2"]);

        let tail = store.list_messages(&session.session_id, 10, 4).unwrap();
        assert_eq!(tail.len(), 1);

        assert!(store.list_messages(&session.session_id, 10, 9).unwrap().is_empty());
    }

    #[test]
    fn recent_messages_returns_tail_in_order() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());

        for i in 0..5 {
            store
                .append_message(message(&session, &format!("m{i}"), Utc::now()))
                .unwrap();
        }

        let recent = store.recent_messages(&session.session_id, 3).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);

        let all = store.recent_messages(&session.session_id, 50).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn feedback_is_last_write_wins() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        let stored = store
            .append_message(message(&session, "hello", Utc::now()))
            .unwrap();

        for (rating, comment) in [(2, "meh"), (5, "great")] {
            store
                .set_message_feedback(
                    &stored.message_id,
                    Feedback {
                        rating,
                        comment: Some(comment.to_string()),
                        submitted_at: Utc::now(),
                    },
                )
                .unwrap();
        }

        let reread = store.get_message(&stored.message_id).unwrap().unwrap();
        let feedback = reread.metadata.feedback.unwrap();
        assert_eq!(feedback.rating, 5);
        assert_eq!(feedback.comment.as_deref(), Some("great"));
        assert_eq!(reread.content, "hello");
    }

    #[test]
    fn feedback_on_missing_message_is_not_found() {
        let (store, _dir) = create_test_store();
        let result = store.set_message_feedback(
            &MessageId::generate(),
            Feedback {
                rating: 3,
                comment: None,
                submitted_at: Utc::now(),
            },
        );
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn touch_session_never_moves_backwards() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        let later = session.updated_at + Duration::seconds(10);

        store.touch_session(&session.session_id, later).unwrap();
        store
            .touch_session(&session.session_id, session.updated_at)
            .unwrap();

        let stored = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(stored.updated_at, later);
    }

    #[test]
    fn delete_session_cascades_to_messages() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let session = create_test_session(&store, user_id);
        let stored = store
            .append_message(message(&session, "bye", Utc::now()))
            .unwrap();

        store.delete_session(&session.session_id).unwrap();

        assert!(store.get_session(&session.session_id).unwrap().is_none());
        assert!(store.get_message(&stored.message_id).unwrap().is_none());
        assert!(store.list_messages(&session.session_id, 10, 0).unwrap().is_empty());
        assert!(store.list_sessions_by_user(&user_id).unwrap().is_empty());
        assert!(matches!(
            store.delete_session(&session.session_id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn append_to_deleted_session_is_rejected() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        store.delete_session(&session.session_id).unwrap();

        let late = store.append_message(message(&session, "too late", Utc::now()));
        assert!(matches!(late, Err(StoreError::NotFound)));

        let mut reused = session.clone();
        reused.user_id = UserId::generate();
        store.create_session(&reused).unwrap();
        assert!(store
            .list_messages(&session.session_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn first_append_lands_after_session_timestamp() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        let ahead = session.updated_at + Duration::seconds(30);
        store.touch_session(&session.session_id, ahead).unwrap();

        let stored = store
            .append_message(message(&session, "clock stepped back", Utc::now()))
            .unwrap();

        assert!(stored.created_at > ahead);
    }

    #[test]
    fn parallel_appends_keep_one_total_order() {
        let (store, _dir) = create_test_store();
        let session = create_test_session(&store, UserId::generate());
        let stamp = Utc::now();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let store = &store;
                let session = &session;
                scope.spawn(move || {
                    for i in 0..25 {
                        store
                            .append_message(message(session, &format!("w{worker}-{i}"), stamp))
                            .unwrap();
                    }
                });
            }
        });

        let log = store.list_messages(&session.session_id, 200, 0).unwrap();
        assert_eq!(log.len(), 100);
        assert!(log.windows(2).all(|w| w[0].created_at < w[1].created_at));

        for worker in 0..4 {
            let mine: Vec<_> = log
                .iter()
                .filter_map(|m| m.content.strip_prefix(&format!("w{worker}-")))
                .map(|n| n.parse::<u32>().unwrap())
                .collect();
            assert_eq!(mine, (0..25).collect::<Vec<_>>());
        }
    }

    #[test]
    fn parallel_primary_contacts_leave_one_primary() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    store
                        .add_contact(&contact(user_id, &format!("c{i}"), true))
                        .unwrap();
                });
            }
        });

        let contacts = store.list_contacts_by_user(&user_id).unwrap();
        assert_eq!(contacts.len(), 8);
        assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
    }

    #[test]
    fn alert_transition_is_compare_and_set() {
        let (store, _dir) = create_test_store();
        let alert = CrisisAlert {
            alert_id: AlertId::generate(),
            user_id: UserId::generate(),
            severity: AlertSeverity::High,
            message: "help".to_string(),
            location: None,
            status: AlertStatus::Active,
            created_at: Utc::now(),
            resolved_at: None,
        };
        store.put_alert(&alert).unwrap();

        let at = Utc::now();
        let resolved = store
            .transition_alert(&alert.alert_id, AlertStatus::Active, AlertStatus::Resolved, at)
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_at, Some(at));

        let second = store.transition_alert(
            &alert.alert_id,
            AlertStatus::Active,
            AlertStatus::Escalated,
            Utc::now(),
        );
        assert!(matches!(second, Err(StoreError::Conflict)));

        let stored = store.get_alert(&alert.alert_id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Resolved);
        assert_eq!(store.list_alerts_by_user(&alert.user_id).unwrap().len(), 1);
    }

    #[test]
    fn primary_contact_swaps_atomically() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        store.add_contact(&contact(user_id, "Amina", true)).unwrap();
        store.add_contact(&contact(user_id, "Brian", false)).unwrap();
        store.add_contact(&contact(user_id, "Chebet", true)).unwrap();

        let contacts = store.list_contacts_by_user(&user_id).unwrap();
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
        assert_eq!(contacts[0].name, "Chebet");
        assert_eq!(contacts[1].name, "Amina");
        assert_eq!(contacts[2].name, "Brian");
    }

    #[test]
    fn safety_plan_upsert_keeps_identity() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let now = Utc::now();

        let first = store
            .upsert_safety_plan(&user_id, now, &|plan| {
                plan.warning_signs = vec!["isolation".to_string()];
                plan.coping_strategies = vec!["walk".to_string()];
            })
            .unwrap();
        let second = store
            .upsert_safety_plan(&user_id, now, &|plan| {
                plan.warning_signs = vec!["not sleeping".to_string()];
            })
            .unwrap();

        assert_eq!(second.plan_id, first.plan_id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);

        let stored = store.get_safety_plan(&user_id).unwrap().unwrap();
        assert_eq!(stored.warning_signs, vec!["not sleeping".to_string()]);
        assert_eq!(stored.coping_strategies, vec!["walk".to_string()]);
    }
}
