//! Conversation endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use heal_auth::JwtValidator;
use heal_chat::{Companion, FeedbackRequest, Page, SendMessageRequest};
use heal_core::SessionId;
use heal_store::{ContentKind, Feedback, Message, SenderKind, Session};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::GatewayState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /v1/chat/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    /// Session to continue. Omit to start a new one.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Message text.
    pub content: String,
    /// Media kind, `text` if omitted.
    #[serde(default)]
    pub message_type: Option<ContentKind>,
}

/// Body of `POST /v1/chat/feedback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    /// Session containing the message.
    pub session_id: String,
    /// Message being rated.
    pub message_id: String,
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional comment.
    #[serde(default)]
    pub feedback: Option<String>,
}

/// `limit` and `offset` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Maximum number of items.
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

impl From<PageQuery> for Page {
    fn from(q: PageQuery) -> Self {
        Self {
            limit: q.limit,
            offset: q.offset,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// A session as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Session ID.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Display title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.session_id.to_string(),
            user_id: session.user_id.to_string(),
            title: session.title,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Feedback attached to a message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            rating: feedback.rating,
            comment: feedback.comment,
            submitted_at: feedback.submitted_at,
        }
    }
}

/// A message as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    /// Message ID.
    pub id: String,
    /// Session ID.
    pub session_id: String,
    /// Session owner.
    pub user_id: String,
    /// Message body.
    pub content: String,
    /// `user` or `assistant`.
    pub sender_type: SenderKind,
    /// Media kind.
    pub message_type: ContentKind,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest feedback, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackResponse>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.message_id.to_string(),
            session_id: message.session_id.to_string(),
            user_id: message.user_id.to_string(),
            content: message.content,
            sender_type: message.sender,
            message_type: message.content_kind,
            created_at: message.created_at,
            feedback: message.metadata.feedback.map(FeedbackResponse::from),
        }
    }
}

/// Response for a completed turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// The session after the turn.
    pub session: SessionResponse,
    /// The stored user message.
    pub user_message: MessageResponse,
    /// The stored assistant reply.
    pub ai_response: MessageResponse,
}

/// Response for a history page.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Messages, oldest first.
    pub messages: Vec<MessageResponse>,
}

/// Response for a session listing.
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    /// Sessions, most recently active first.
    pub sessions: Vec<SessionResponse>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Human-readable confirmation.
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Send a message and receive the companion's reply.
///
/// # Errors
///
/// Returns 400 for empty content, 404 for an unknown or foreign session and
/// 503 if no reply could be produced (the user message is kept).
pub async fn send_message<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiJson(body): ApiJson<SendMessageBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let session_id = body
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_id::<SessionId>("session", s))
        .transpose()?;

    let outcome = state
        .companion
        .send_message(
            &user.user_id,
            SendMessageRequest {
                session_id,
                content: body.content,
                content_kind: body.message_type.unwrap_or_default(),
            },
        )
        .await?;

    let response = SendMessageResponse {
        session: outcome.session.into(),
        user_message: outcome.user_message.into(),
        ai_response: outcome.assistant_message.into(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's sessions.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_sessions<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let sessions = state
        .companion
        .list_sessions(&user.user_id, page.into())
        .await?;

    Ok(Json(ListSessionsResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
    }))
}

/// Read a session's messages, oldest first.
///
/// # Errors
///
/// Returns 404 if the session is unknown or belongs to someone else.
pub async fn get_history<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    Path(session_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;

    let messages = state
        .companion
        .history(&user.user_id, &session_id, page.into())
        .await?;

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

/// Delete a session and its messages.
///
/// # Errors
///
/// Returns 404 if the session is unknown or belongs to someone else.
pub async fn delete_session<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;

    state
        .companion
        .delete_session(&user.user_id, &session_id)
        .await?;

    Ok(Json(AckResponse {
        message: "Session deleted successfully",
    }))
}

/// Rate a message.
///
/// # Errors
///
/// Returns 400 for a rating outside 1..=5 and 404 if the session or message
/// is not the caller's.
pub async fn submit_feedback<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiJson(body): ApiJson<FeedbackBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let request = FeedbackRequest {
        session_id: parse_id("session", &body.session_id)?,
        message_id: parse_id("message", &body.message_id)?,
        rating: body.rating,
        comment: body.feedback,
    };

    let message = state
        .companion
        .submit_feedback(&user.user_id, request)
        .await?;

    Ok(Json(MessageResponse::from(message)))
}
