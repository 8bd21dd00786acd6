//! Companion service implementation.
//!
//! This module provides the `Companion` trait and `CompanionService`
//! implementation that runs a conversational turn end to end and exposes the
//! crisis support operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use heal_core::{AlertId, SessionId, UserId};
use heal_store::{
    AlertStatus, CrisisAlert, EmergencyContact, Message, MessageMetadata, SafetyPlan, SenderKind,
    Session, Store,
};

use crate::context;
use crate::crisis;
use crate::error::{ChatError, Result};
use crate::history;
use crate::responder::{Reply, Responder, ResponderError, COMPANION_PERSONA};
use crate::risk;
use crate::session;
use crate::types::{
    CompanionConfig, FeedbackRequest, NewAlert, NewContact, Page, SafetyPlanUpdate,
    SendMessageOutcome, SendMessageRequest,
};

/// Trait defining the companion operations.
///
/// Every operation is scoped to the authenticated `user_id`; records owned by
/// other users behave as if they did not exist.
#[async_trait]
pub trait Companion: Send + Sync {
    // =========================================================================
    // Conversation Operations
    // =========================================================================

    /// Run one turn: persist the user message, ask the responder, persist the
    /// reply.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` for empty or oversized content,
    /// `ChatError::NotOwner` for a foreign session, and
    /// `ChatError::ResponderUnavailable` if no reply could be produced. In
    /// the last case the user message stays persisted.
    async fn send_message(
        &self,
        user_id: &UserId,
        request: SendMessageRequest,
    ) -> Result<SendMessageOutcome>;

    /// Read a window of a session's messages, oldest first.
    async fn history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        page: Page,
    ) -> Result<Vec<Message>>;

    /// List the user's sessions, most recently active first.
    async fn list_sessions(&self, user_id: &UserId, page: Page) -> Result<Vec<Session>>;

    /// Delete a session and its messages.
    async fn delete_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<()>;

    /// Rate a message in one of the user's sessions.
    async fn submit_feedback(&self, user_id: &UserId, request: FeedbackRequest) -> Result<Message>;

    // =========================================================================
    // Crisis Operations
    // =========================================================================

    /// Raise a crisis alert.
    async fn create_alert(&self, user_id: &UserId, request: NewAlert) -> Result<CrisisAlert>;

    /// List the user's alerts, newest first.
    async fn list_alerts(&self, user_id: &UserId) -> Result<Vec<CrisisAlert>>;

    /// Resolve or escalate an active alert.
    async fn update_alert_status(
        &self,
        user_id: &UserId,
        alert_id: &AlertId,
        status: AlertStatus,
    ) -> Result<CrisisAlert>;

    /// Add an emergency contact.
    async fn add_contact(&self, user_id: &UserId, request: NewContact)
        -> Result<EmergencyContact>;

    /// List emergency contacts, primary first.
    async fn list_contacts(&self, user_id: &UserId) -> Result<Vec<EmergencyContact>>;

    /// Get the user's safety plan.
    async fn get_safety_plan(&self, user_id: &UserId) -> Result<SafetyPlan>;

    /// Create or update the user's safety plan.
    async fn upsert_safety_plan(
        &self,
        user_id: &UserId,
        update: SafetyPlanUpdate,
    ) -> Result<SafetyPlan>;
}

/// The main companion service implementation.
///
/// `R` may be unsized, so a runtime-selected `Arc<dyn Responder>` works as
/// well as a concrete responder.
pub struct CompanionService<S: Store, R: Responder + ?Sized> {
    store: Arc<S>,
    responder: Arc<R>,
    config: CompanionConfig,
}

impl<S: Store, R: Responder + ?Sized> CompanionService<S, R> {
    /// Create a new companion service.
    #[must_use]
    pub fn new(store: Arc<S>, responder: Arc<R>, config: CompanionConfig) -> Self {
        Self {
            store,
            responder,
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>, responder: Arc<R>) -> Self {
        Self::new(store, responder, CompanionConfig::default())
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompanionConfig {
        &self.config
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ChatError::validation("message content is required"));
        }
        if content.chars().count() > self.config.max_content_chars {
            return Err(ChatError::validation(format!(
                "message content exceeds {} characters",
                self.config.max_content_chars
            )));
        }
        Ok(())
    }

    /// Raise an alert when the message reads as risky enough. Never fails
    /// the turn.
    fn flag_risk(&self, message: &Message) {
        let Some(severity) = risk::assess(&message.content) else {
            return;
        };
        if !risk::meets_threshold(severity, self.config.auto_alert_threshold) {
            return;
        }
        if let Err(e) = crisis::raise_detected_alert(&*self.store, &message.user_id, severity) {
            tracing::error!(
                session_id = %message.session_id,
                severity = %severity,
                error = %e,
                "Failed to raise detected alert"
            );
        }
    }

    async fn ask_responder(
        &self,
        history: &[String],
        message: &str,
    ) -> std::result::Result<Reply, ResponderError> {
        let timeout = Duration::from_secs(self.config.responder_timeout_seconds);
        tokio::time::timeout(
            timeout,
            self.responder.generate(COMPANION_PERSONA, history, message),
        )
        .await
        .unwrap_or(Err(ResponderError::TimedOut(timeout)))
    }
}

#[async_trait]
impl<S, R> Companion for CompanionService<S, R>
where
    S: Store + 'static,
    R: Responder + ?Sized + 'static,
{
    // =========================================================================
    // Conversation Operations
    // =========================================================================

    async fn send_message(
        &self,
        user_id: &UserId,
        request: SendMessageRequest,
    ) -> Result<SendMessageOutcome> {
        self.validate_content(&request.content)?;

        let store = &*self.store;
        let session = session::resolve_or_create(store, user_id, request.session_id)?;

        let user_message = history::append(
            store,
            &session,
            request.content,
            SenderKind::User,
            request.content_kind,
            MessageMetadata::default(),
        )?;

        self.flag_risk(&user_message);

        let context = context::build_context(
            store,
            user_id,
            &session.session_id,
            self.config.context_window,
            Some(&user_message.message_id),
        )?;

        let reply = match self.ask_responder(&context, &user_message.content).await {
            Ok(reply) => reply,
            Err(source) => {
                tracing::warn!(
                    session_id = %session.session_id,
                    error = %source,
                    "Responder failed, user message kept"
                );
                return Err(ChatError::ResponderUnavailable {
                    session_id: session.session_id,
                    source,
                });
            }
        };

        let assistant_message = history::append(
            store,
            &session,
            reply.text,
            SenderKind::Assistant,
            user_message.content_kind,
            MessageMetadata {
                feedback: None,
                responder: Some(reply.model),
                reply_to: Some(user_message.message_id),
            },
        )?;

        let session = store
            .get_session(&session.session_id)?
            .ok_or(ChatError::SessionNotFound(session.session_id))?;

        tracing::info!(
            session_id = %session.session_id,
            user_message_id = %user_message.message_id,
            assistant_message_id = %assistant_message.message_id,
            context_len = context.len(),
            "Completed turn"
        );

        Ok(SendMessageOutcome {
            session,
            user_message,
            assistant_message,
        })
    }

    async fn history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        page: Page,
    ) -> Result<Vec<Message>> {
        let (limit, offset) = page.resolve(
            self.config.default_history_limit,
            self.config.max_history_limit,
        );
        history::history(&*self.store, user_id, session_id, limit, offset)
    }

    async fn list_sessions(&self, user_id: &UserId, page: Page) -> Result<Vec<Session>> {
        let (limit, offset) = page.resolve(
            self.config.default_session_limit,
            self.config.max_history_limit,
        );
        session::list_sessions(&*self.store, user_id, limit, offset)
    }

    async fn delete_session(&self, user_id: &UserId, session_id: &SessionId) -> Result<()> {
        session::delete_session(&*self.store, user_id, session_id)
    }

    async fn submit_feedback(&self, user_id: &UserId, request: FeedbackRequest) -> Result<Message> {
        history::attach_feedback(
            &*self.store,
            user_id,
            &request.session_id,
            &request.message_id,
            request.rating,
            request.comment,
        )
    }

    // =========================================================================
    // Crisis Operations
    // =========================================================================

    async fn create_alert(&self, user_id: &UserId, request: NewAlert) -> Result<CrisisAlert> {
        crisis::create_alert(&*self.store, user_id, request)
    }

    async fn list_alerts(&self, user_id: &UserId) -> Result<Vec<CrisisAlert>> {
        crisis::list_alerts(&*self.store, user_id)
    }

    async fn update_alert_status(
        &self,
        user_id: &UserId,
        alert_id: &AlertId,
        status: AlertStatus,
    ) -> Result<CrisisAlert> {
        crisis::update_alert_status(&*self.store, user_id, alert_id, status)
    }

    async fn add_contact(
        &self,
        user_id: &UserId,
        request: NewContact,
    ) -> Result<EmergencyContact> {
        crisis::add_contact(&*self.store, user_id, request)
    }

    async fn list_contacts(&self, user_id: &UserId) -> Result<Vec<EmergencyContact>> {
        crisis::list_contacts(&*self.store, user_id)
    }

    async fn get_safety_plan(&self, user_id: &UserId) -> Result<SafetyPlan> {
        crisis::get_safety_plan(&*self.store, user_id)
    }

    async fn upsert_safety_plan(
        &self,
        user_id: &UserId,
        update: SafetyPlanUpdate,
    ) -> Result<SafetyPlan> {
        crisis::upsert_safety_plan(&*self.store, user_id, &update)
    }
}
