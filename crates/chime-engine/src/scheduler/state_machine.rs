//! Entry state machine with validated transitions.
//!
//! An entry leaves `Scheduled` exactly once:
//! Scheduled -> Fired
//! Scheduled -> Cancelled

use chime_core::types::EntryState;

use crate::error::SchedulerError;

/// Validate that a state transition is allowed.
pub fn validate_transition(from: EntryState, to: EntryState) -> Result<(), SchedulerError> {
    let valid = matches!(
        (from, to),
        (EntryState::Scheduled, EntryState::Fired) | (EntryState::Scheduled, EntryState::Cancelled)
    );

    if valid {
        Ok(())
    } else {
        Err(SchedulerError::InvalidTransition(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_to_fired() {
        assert!(validate_transition(EntryState::Scheduled, EntryState::Fired).is_ok());
    }

    #[test]
    fn test_scheduled_to_cancelled() {
        assert!(validate_transition(EntryState::Scheduled, EntryState::Cancelled).is_ok());
    }

    #[test]
    fn test_terminal_states_never_leave() {
        for from in [EntryState::Fired, EntryState::Cancelled] {
            for to in [EntryState::Scheduled, EntryState::Fired, EntryState::Cancelled] {
                assert!(
                    validate_transition(from, to).is_err(),
                    "{} -> {} should be rejected",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_scheduled_to_scheduled_invalid() {
        let err = validate_transition(EntryState::Scheduled, EntryState::Scheduled).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidTransition(EntryState::Scheduled, EntryState::Scheduled)
        ));
    }
}
