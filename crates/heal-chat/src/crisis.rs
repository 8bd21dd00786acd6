//! Crisis support records: alerts, emergency contacts and safety plans.

use chrono::Utc;
use heal_core::{AlertId, ContactId, UserId};
use heal_store::{
    AlertSeverity, AlertStatus, CrisisAlert, EmergencyContact, SafetyPlan, Store, StoreError,
};

use crate::error::{ChatError, Result};
use crate::lifecycle;
use crate::types::{NewAlert, NewContact, SafetyPlanUpdate};

/// Message recorded on alerts raised by risk detection.
pub const DETECTED_ALERT_MESSAGE: &str = "Detected in conversation";

// =============================================================================
// Alerts
// =============================================================================

/// Record a new alert. Alerts always start `Active`.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn create_alert<S: Store>(store: &S, user_id: &UserId, request: NewAlert) -> Result<CrisisAlert> {
    let alert = CrisisAlert {
        alert_id: AlertId::generate(),
        user_id: *user_id,
        severity: request.severity,
        message: request.message.trim().to_string(),
        location: request.location.filter(|l| !l.trim().is_empty()),
        status: AlertStatus::Active,
        created_at: Utc::now(),
        resolved_at: None,
    };

    store.put_alert(&alert)?;

    tracing::warn!(
        alert_id = %alert.alert_id,
        user_id = %user_id,
        severity = %alert.severity,
        "Crisis alert raised"
    );

    Ok(alert)
}

/// Record an alert for risk detected in a user message.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn raise_detected_alert<S: Store>(
    store: &S,
    user_id: &UserId,
    severity: AlertSeverity,
) -> Result<CrisisAlert> {
    create_alert(
        store,
        user_id,
        NewAlert {
            severity,
            message: DETECTED_ALERT_MESSAGE.to_string(),
            location: None,
        },
    )
}

/// List a user's alerts, newest first.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn list_alerts<S: Store>(store: &S, user_id: &UserId) -> Result<Vec<CrisisAlert>> {
    Ok(store.list_alerts_by_user(user_id)?)
}

/// Move an alert out of `Active`.
///
/// The status check and write happen atomically in the store, so of two
/// concurrent transitions only one succeeds.
///
/// # Errors
///
/// Returns an error if:
/// - The alert is not found or belongs to another user
/// - The transition is not allowed from the alert's current status
pub fn update_alert_status<S: Store>(
    store: &S,
    user_id: &UserId,
    alert_id: &AlertId,
    target: AlertStatus,
) -> Result<CrisisAlert> {
    let alert = store
        .get_alert(alert_id)?
        .filter(|a| a.user_id == *user_id)
        .ok_or(ChatError::AlertNotFound(*alert_id))?;

    lifecycle::validate_transition(alert_id, alert.status, target)?;

    match store.transition_alert(alert_id, alert.status, target, Utc::now()) {
        Ok(updated) => {
            tracing::info!(
                alert_id = %alert_id,
                from = %alert.status,
                to = %target,
                "Alert status changed"
            );
            Ok(updated)
        }
        Err(StoreError::NotFound) => Err(ChatError::AlertNotFound(*alert_id)),
        Err(StoreError::Conflict) => {
            let current = store
                .get_alert(alert_id)?
                .ok_or(ChatError::AlertNotFound(*alert_id))?;
            Err(ChatError::InvalidStateTransition {
                alert_id: *alert_id,
                from: current.status,
                to: target,
            })
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Emergency Contacts
// =============================================================================

/// Add an emergency contact. A primary contact demotes any earlier one.
///
/// # Errors
///
/// Returns `ChatError::Validation` if name or phone is blank, or a store error.
pub fn add_contact<S: Store>(
    store: &S,
    user_id: &UserId,
    request: NewContact,
) -> Result<EmergencyContact> {
    let name = request.name.trim();
    let phone = request.phone.trim();
    if name.is_empty() || phone.is_empty() {
        return Err(ChatError::validation("name and phone are required"));
    }

    let contact = EmergencyContact {
        contact_id: ContactId::generate(),
        user_id: *user_id,
        name: name.to_string(),
        phone: phone.to_string(),
        relationship: request.relationship.filter(|r| !r.trim().is_empty()),
        is_primary: request.is_primary,
        created_at: Utc::now(),
    };

    store.add_contact(&contact)?;

    tracing::debug!(
        contact_id = %contact.contact_id,
        is_primary = contact.is_primary,
        "Added emergency contact"
    );

    Ok(contact)
}

/// List a user's contacts, primary first.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn list_contacts<S: Store>(store: &S, user_id: &UserId) -> Result<Vec<EmergencyContact>> {
    Ok(store.list_contacts_by_user(user_id)?)
}

// =============================================================================
// Safety Plans
// =============================================================================

/// Get the user's safety plan.
///
/// # Errors
///
/// Returns `ChatError::SafetyPlanNotFound` if none exists yet.
pub fn get_safety_plan<S: Store>(store: &S, user_id: &UserId) -> Result<SafetyPlan> {
    store
        .get_safety_plan(user_id)?
        .ok_or(ChatError::SafetyPlanNotFound)
}

/// Create the user's safety plan or update it in place.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn upsert_safety_plan<S: Store>(
    store: &S,
    user_id: &UserId,
    update: &SafetyPlanUpdate,
) -> Result<SafetyPlan> {
    let plan = store.upsert_safety_plan(user_id, Utc::now(), &|plan| update.apply_to(plan))?;

    tracing::debug!(plan_id = %plan.plan_id, user_id = %user_id, "Saved safety plan");

    Ok(plan)
}
