//! Request, outcome and configuration types for pipeline operations.

use heal_core::{MessageId, SessionId};
use heal_store::{AlertSeverity, ContentKind, Message, PlanContact, SafetyPlan, Session};
use serde::{Deserialize, Serialize};

/// Configuration for the companion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanionConfig {
    /// Number of prior messages handed to the responder.
    #[serde(default = "CompanionConfig::default_context_window")]
    pub context_window: usize,
    /// Page size for history when the caller gives none.
    #[serde(default = "CompanionConfig::default_history_limit")]
    pub default_history_limit: usize,
    /// Largest history page a caller may request.
    #[serde(default = "CompanionConfig::default_max_history_limit")]
    pub max_history_limit: usize,
    /// Page size for session listings when the caller gives none.
    #[serde(default = "CompanionConfig::default_session_limit")]
    pub default_session_limit: usize,
    /// Maximum message length in characters.
    #[serde(default = "CompanionConfig::default_max_content_chars")]
    pub max_content_chars: usize,
    /// Upper bound on one responder call (seconds).
    #[serde(default = "CompanionConfig::default_responder_timeout_seconds")]
    pub responder_timeout_seconds: u64,
    /// Detected risk at or above this severity raises an alert automatically.
    /// `None` disables automatic alerts.
    #[serde(default = "CompanionConfig::default_auto_alert_threshold")]
    pub auto_alert_threshold: Option<AlertSeverity>,
}

impl CompanionConfig {
    const fn default_context_window() -> usize {
        10
    }

    const fn default_history_limit() -> usize {
        50
    }

    const fn default_max_history_limit() -> usize {
        200
    }

    const fn default_session_limit() -> usize {
        20
    }

    const fn default_max_content_chars() -> usize {
        4000
    }

    const fn default_responder_timeout_seconds() -> u64 {
        20
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_auto_alert_threshold() -> Option<AlertSeverity> {
        Some(AlertSeverity::High)
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            context_window: Self::default_context_window(),
            default_history_limit: Self::default_history_limit(),
            max_history_limit: Self::default_max_history_limit(),
            default_session_limit: Self::default_session_limit(),
            max_content_chars: Self::default_max_content_chars(),
            responder_timeout_seconds: Self::default_responder_timeout_seconds(),
            auto_alert_threshold: Self::default_auto_alert_threshold(),
        }
    }
}

/// A limit/offset window over an ordered listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of items. `None` uses the operation's default.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: Option<usize>,
}

impl Page {
    /// A page with explicit bounds.
    #[must_use]
    pub const fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Resolve to concrete `(limit, offset)`, clamping the limit to `max`.
    #[must_use]
    pub fn resolve(self, default_limit: usize, max: usize) -> (usize, usize) {
        let limit = self.limit.unwrap_or(default_limit).min(max);
        (limit, self.offset.unwrap_or(0))
    }
}

/// Input for one conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Existing session to continue. `None` starts a new one.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Message body.
    pub content: String,
    /// Media kind of `content`.
    #[serde(default)]
    pub content_kind: ContentKind,
}

impl SendMessageRequest {
    /// A text message, optionally continuing `session_id`.
    #[must_use]
    pub fn text(session_id: Option<SessionId>, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
            content_kind: ContentKind::Text,
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageOutcome {
    /// The session after the turn.
    pub session: Session,
    /// The persisted user message.
    pub user_message: Message,
    /// The persisted assistant reply.
    pub assistant_message: Message,
}

/// Input for submitting feedback on a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Session containing the message.
    pub session_id: SessionId,
    /// Message being rated.
    pub message_id: MessageId,
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Input for raising a crisis alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    /// Reported severity.
    pub severity: AlertSeverity,
    /// Free-text description.
    #[serde(default)]
    pub message: String,
    /// Opaque location payload.
    #[serde(default)]
    pub location: Option<String>,
}

/// Input for adding an emergency contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    /// Contact name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship to the user.
    #[serde(default)]
    pub relationship: Option<String>,
    /// Make this the primary contact.
    #[serde(default)]
    pub is_primary: bool,
}

/// Partial update to a safety plan. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyPlanUpdate {
    /// Replacement warning signs.
    #[serde(default)]
    pub warning_signs: Option<Vec<String>>,
    /// Replacement coping strategies.
    #[serde(default)]
    pub coping_strategies: Option<Vec<String>>,
    /// Replacement personal support contacts.
    #[serde(default)]
    pub support_contacts: Option<Vec<PlanContact>>,
    /// Replacement professional contacts.
    #[serde(default)]
    pub professional_contacts: Option<Vec<PlanContact>>,
    /// Replacement environment safety steps.
    #[serde(default)]
    pub environment_safety: Option<Vec<String>>,
}

impl SafetyPlanUpdate {
    /// Copy every supplied field onto `plan`.
    pub fn apply_to(&self, plan: &mut SafetyPlan) {
        if let Some(v) = &self.warning_signs {
            plan.warning_signs.clone_from(v);
        }
        if let Some(v) = &self.coping_strategies {
            plan.coping_strategies.clone_from(v);
        }
        if let Some(v) = &self.support_contacts {
            plan.support_contacts.clone_from(v);
        }
        if let Some(v) = &self.professional_contacts {
            plan.professional_contacts.clone_from(v);
        }
        if let Some(v) = &self.environment_safety {
            plan.environment_safety.clone_from(v);
        }
    }
}
