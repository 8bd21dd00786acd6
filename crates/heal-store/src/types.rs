//! Domain types stored in the database.
//!
//! These types represent the persisted state of conversations and the crisis
//! support records that hang off a user.

use chrono::{DateTime, Utc};
use heal_core::{AlertId, ContactId, MessageId, PlanId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Conversation
// =============================================================================

/// A conversation thread owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session.
    pub session_id: SessionId,
    /// User who owns this session.
    pub user_id: UserId,
    /// Display title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the latest appended message.
    pub updated_at: DateTime<Utc>,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// The human user.
    User,
    /// The automated responder.
    Assistant,
}

/// Media kind of a message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text.
    #[default]
    Text,
    /// Reference to an audio recording.
    Audio,
    /// Reference to a video recording.
    Video,
}

/// A user's rating of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional free-text comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the feedback was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Mutable annotations on a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Latest feedback for this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// Name of the responder that produced an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder: Option<String>,
    /// User message an assistant message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

/// One turn in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message.
    pub message_id: MessageId,
    /// Session the message belongs to.
    pub session_id: SessionId,
    /// Owner of the session.
    pub user_id: UserId,
    /// Message body.
    pub content: String,
    /// Author.
    pub sender: SenderKind,
    /// Media kind of `content`.
    pub content_kind: ContentKind,
    /// Feedback and provenance annotations.
    #[serde(default)]
    pub metadata: MessageMetadata,
    /// Ordering key, strictly increasing within a session.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Crisis Support
// =============================================================================

/// Severity of a crisis alert, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
    /// Immediate danger.
    Critical,
}

impl AlertSeverity {
    /// Lowercase name, as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for AlertSeverity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Lifecycle status of a crisis alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Newly raised.
    Active,
    /// Closed without escalation.
    Resolved,
    /// Handed to outside help.
    Escalated,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
        };
        f.write_str(s)
    }
}

/// A recorded risk event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisAlert {
    /// Unique identifier for the alert.
    pub alert_id: AlertId,
    /// User the alert concerns.
    pub user_id: UserId,
    /// Reported severity.
    pub severity: AlertSeverity,
    /// Free-text description.
    pub message: String,
    /// Opaque location payload supplied by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Current status.
    pub status: AlertStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once, when the alert leaves `Active`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A person to reach in an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Unique identifier for the contact.
    pub contact_id: ContactId,
    /// Owner.
    pub user_id: UserId,
    /// Contact name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Whether this is the user's first point of contact.
    pub is_primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A contact listed inside a safety plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanContact {
    /// Contact name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship or role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// A user's personal safety plan. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPlan {
    /// Unique identifier for the plan.
    pub plan_id: PlanId,
    /// Owner.
    pub user_id: UserId,
    /// Signs that a crisis may be developing.
    #[serde(default)]
    pub warning_signs: Vec<String>,
    /// Things the user can do on their own.
    #[serde(default)]
    pub coping_strategies: Vec<String>,
    /// Friends and family to reach out to.
    #[serde(default)]
    pub support_contacts: Vec<PlanContact>,
    /// Counsellors, clinics and hotlines.
    #[serde(default)]
    pub professional_contacts: Vec<PlanContact>,
    /// Steps to make the environment safer.
    #[serde(default)]
    pub environment_safety: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SafetyPlan {
    /// A plan with no entries, created at `now`.
    #[must_use]
    pub fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            plan_id: PlanId::generate(),
            user_id,
            warning_signs: Vec::new(),
            coping_strategies: Vec::new(),
            support_contacts: Vec::new(),
            professional_contacts: Vec::new(),
            environment_safety: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_risk() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<AlertSeverity>(), Ok(AlertSeverity::High));
        assert!("severe".parse::<AlertSeverity>().is_err());
    }

    #[test]
    fn content_kind_defaults_to_text() {
        assert_eq!(ContentKind::default(), ContentKind::Text);
    }
}
