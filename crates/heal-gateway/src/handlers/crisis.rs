//! Crisis support endpoints: alerts, emergency contacts and the safety plan.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use heal_auth::JwtValidator;
use heal_chat::{Companion, NewAlert, NewContact, SafetyPlanUpdate};
use heal_core::AlertId;
use heal_store::{
    AlertSeverity, AlertStatus, CrisisAlert, EmergencyContact, PlanContact, SafetyPlan,
};

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::GatewayState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /v1/crisis/alerts`.
#[derive(Debug, Deserialize)]
pub struct CreateAlertBody {
    /// `low`, `medium`, `high` or `critical`.
    pub severity: String,
    /// Free-text description.
    #[serde(default)]
    pub message: Option<String>,
    /// Opaque location payload, kept as given.
    #[serde(default)]
    pub location: Option<Value>,
}

/// Body of `POST /v1/crisis/alerts/:alert_id/status`.
#[derive(Debug, Deserialize)]
pub struct AlertStatusBody {
    /// `resolved` or `escalated`.
    pub status: String,
}

/// Body of `POST /v1/crisis/contacts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContactBody {
    /// Contact name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship to the caller.
    #[serde(default)]
    pub relationship: Option<String>,
    /// Make this the primary contact.
    #[serde(default)]
    pub is_primary: bool,
}

/// Body of `PUT /v1/crisis/safety-plan`. Omitted fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyPlanBody {
    /// Warning signs.
    #[serde(default)]
    pub warning_signs: Option<Vec<String>>,
    /// Coping strategies.
    #[serde(default)]
    pub coping_strategies: Option<Vec<String>>,
    /// Friends and family.
    #[serde(default)]
    pub support_contacts: Option<Vec<PlanContact>>,
    /// Professionals and hotlines.
    #[serde(default)]
    pub professional_contacts: Option<Vec<PlanContact>>,
    /// Environment safety steps.
    #[serde(default)]
    pub environment_safety: Option<Vec<String>>,
}

impl From<SafetyPlanBody> for SafetyPlanUpdate {
    fn from(body: SafetyPlanBody) -> Self {
        Self {
            warning_signs: body.warning_signs,
            coping_strategies: body.coping_strategies,
            support_contacts: body.support_contacts,
            professional_contacts: body.professional_contacts,
            environment_safety: body.environment_safety,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// An alert as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    /// Alert ID.
    pub id: String,
    /// Subject of the alert.
    pub user_id: String,
    /// Severity.
    pub severity: AlertSeverity,
    /// Description.
    pub message: String,
    /// Location payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Current status.
    pub status: AlertStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the alert left `active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<CrisisAlert> for AlertResponse {
    fn from(alert: CrisisAlert) -> Self {
        Self {
            id: alert.alert_id.to_string(),
            user_id: alert.user_id.to_string(),
            severity: alert.severity,
            message: alert.message,
            location: alert.location,
            status: alert.status,
            created_at: alert.created_at,
            resolved_at: alert.resolved_at,
        }
    }
}

/// Response for an alert listing.
#[derive(Debug, Serialize)]
pub struct ListAlertsResponse {
    /// Alerts, newest first.
    pub alerts: Vec<AlertResponse>,
}

/// An emergency contact as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    /// Contact ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Primary flag.
    pub is_primary: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<EmergencyContact> for ContactResponse {
    fn from(contact: EmergencyContact) -> Self {
        Self {
            id: contact.contact_id.to_string(),
            name: contact.name,
            phone: contact.phone,
            relationship: contact.relationship,
            is_primary: contact.is_primary,
            created_at: contact.created_at,
        }
    }
}

/// Response for a contact listing.
#[derive(Debug, Serialize)]
pub struct ListContactsResponse {
    /// Contacts, primary first.
    pub contacts: Vec<ContactResponse>,
}

/// A safety plan as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyPlanResponse {
    /// Plan ID.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Warning signs.
    pub warning_signs: Vec<String>,
    /// Coping strategies.
    pub coping_strategies: Vec<String>,
    /// Friends and family.
    pub support_contacts: Vec<PlanContact>,
    /// Professionals and hotlines.
    pub professional_contacts: Vec<PlanContact>,
    /// Environment safety steps.
    pub environment_safety: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<SafetyPlan> for SafetyPlanResponse {
    fn from(plan: SafetyPlan) -> Self {
        Self {
            id: plan.plan_id.to_string(),
            user_id: plan.user_id.to_string(),
            warning_signs: plan.warning_signs,
            coping_strategies: plan.coping_strategies,
            support_contacts: plan.support_contacts,
            professional_contacts: plan.professional_contacts,
            environment_safety: plan.environment_safety,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

// =============================================================================
// Alert Handlers
// =============================================================================

/// Raise a crisis alert.
///
/// # Errors
///
/// Returns 400 for an unknown severity.
pub async fn create_alert<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateAlertBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let severity: AlertSeverity = body
        .severity
        .parse()
        .map_err(|e: heal_store::UnknownSeverity| ApiError::BadRequest(e.to_string()))?;

    let location = body.location.and_then(|value| match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    });

    let alert = state
        .companion
        .create_alert(
            &user.user_id,
            NewAlert {
                severity,
                message: body.message.unwrap_or_default(),
                location,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AlertResponse::from(alert))))
}

/// List the caller's alerts.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_alerts<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let alerts = state.companion.list_alerts(&user.user_id).await?;

    Ok(Json(ListAlertsResponse {
        alerts: alerts.into_iter().map(AlertResponse::from).collect(),
    }))
}

/// Resolve or escalate an alert.
///
/// # Errors
///
/// Returns 404 for an unknown alert and 409 if the alert is no longer active.
pub async fn update_alert_status<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    Path(alert_id): Path<String>,
    ApiJson(body): ApiJson<AlertStatusBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let alert_id: AlertId = parse_id("alert", &alert_id)?;
    let status = parse_status(&body.status)?;

    let alert = state
        .companion
        .update_alert_status(&user.user_id, &alert_id, status)
        .await?;

    Ok(Json(AlertResponse::from(alert)))
}

// =============================================================================
// Contact Handlers
// =============================================================================

/// Add an emergency contact.
///
/// # Errors
///
/// Returns 400 if name or phone is missing.
pub async fn add_contact<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiJson(body): ApiJson<AddContactBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let contact = state
        .companion
        .add_contact(
            &user.user_id,
            NewContact {
                name: body.name,
                phone: body.phone,
                relationship: body.relationship,
                is_primary: body.is_primary,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ContactResponse::from(contact))))
}

/// List the caller's emergency contacts.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_contacts<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let contacts = state.companion.list_contacts(&user.user_id).await?;

    Ok(Json(ListContactsResponse {
        contacts: contacts.into_iter().map(ContactResponse::from).collect(),
    }))
}

// =============================================================================
// Safety Plan Handlers
// =============================================================================

/// Get the caller's safety plan.
///
/// # Errors
///
/// Returns 404 if no plan exists yet.
pub async fn get_safety_plan<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let plan = state.companion.get_safety_plan(&user.user_id).await?;
    Ok(Json(SafetyPlanResponse::from(plan)))
}

/// Create or update the caller's safety plan.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn upsert_safety_plan<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    user: AuthUser,
    ApiJson(body): ApiJson<SafetyPlanBody>,
) -> Result<impl IntoResponse, ApiError>
where
    C: Companion + 'static,
    V: JwtValidator + 'static,
{
    let plan = state
        .companion
        .upsert_safety_plan(&user.user_id, body.into())
        .await?;

    Ok(Json(SafetyPlanResponse::from(plan)))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_status(raw: &str) -> Result<AlertStatus, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "active" => Ok(AlertStatus::Active),
        "resolved" => Ok(AlertStatus::Resolved),
        "escalated" => Ok(AlertStatus::Escalated),
        _ => Err(ApiError::BadRequest(format!("unknown alert status: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(parse_status("Resolved").unwrap(), AlertStatus::Resolved);
        assert_eq!(parse_status(" escalated ").unwrap(), AlertStatus::Escalated);
        assert!(matches!(parse_status("closed"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn plan_body_keeps_omitted_fields_empty() {
        let body: SafetyPlanBody =
            serde_json::from_str(r#"{"copingStrategies": ["call my sister"]}"#).unwrap();
        let update = SafetyPlanUpdate::from(body);

        assert_eq!(
            update.coping_strategies,
            Some(vec!["call my sister".to_string()])
        );
        assert!(update.warning_signs.is_none());
    }
}
