//! Crisis alert state machine.
//!
//! ```text
//!              ┌──────────┐
//!              │  Active  │
//!              └────┬─────┘
//!          (resolve)│(escalate)
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!    ┌──────────┐      ┌───────────┐
//!    │ Resolved │      │ Escalated │
//!    └──────────┘      └───────────┘
//! ```
//!
//! Both outcomes are terminal.

use heal_core::AlertId;
use heal_store::AlertStatus;

use crate::error::{ChatError, Result};

/// Validates a status transition and returns the target status if valid.
///
/// # Errors
///
/// Returns `ChatError::InvalidStateTransition` if the transition is not allowed.
pub fn validate_transition(
    alert_id: &AlertId,
    from: AlertStatus,
    to: AlertStatus,
) -> Result<AlertStatus> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ChatError::InvalidStateTransition {
            alert_id: *alert_id,
            from,
            to,
        })
    }
}

/// Check if a status transition is allowed.
#[must_use]
pub const fn is_valid_transition(from: AlertStatus, to: AlertStatus) -> bool {
    matches!(
        (from, to),
        (AlertStatus::Active, AlertStatus::Resolved | AlertStatus::Escalated)
    )
}

/// Returns true if no further transitions are possible.
#[must_use]
pub const fn is_terminal(status: AlertStatus) -> bool {
    matches!(status, AlertStatus::Resolved | AlertStatus::Escalated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_can_close_either_way() {
        assert!(is_valid_transition(AlertStatus::Active, AlertStatus::Resolved));
        assert!(is_valid_transition(AlertStatus::Active, AlertStatus::Escalated));
    }

    #[test]
    fn terminal_states_stay_put() {
        use AlertStatus::*;

        for from in [Resolved, Escalated] {
            assert!(is_terminal(from));
            for to in [Active, Resolved, Escalated] {
                assert!(!is_valid_transition(from, to));
            }
        }
        assert!(!is_valid_transition(Active, Active));
    }

    #[test]
    fn validate_transition_err() {
        let alert_id = AlertId::generate();
        let result = validate_transition(&alert_id, AlertStatus::Escalated, AlertStatus::Resolved);

        match result {
            Err(ChatError::InvalidStateTransition { from, to, .. }) => {
                assert_eq!(from, AlertStatus::Escalated);
                assert_eq!(to, AlertStatus::Resolved);
            }
            other => panic!("expected InvalidStateTransition, got {other:?}"),
        }
    }
}
