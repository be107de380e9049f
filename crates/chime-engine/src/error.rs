//! Error types for the timer engine.

use chime_core::types::EntryState;

/// Errors from the scheduling engine.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler is shutting down")]
    ShuttingDown,
    #[error("Too many active entries (limit {limit})")]
    CapacityExceeded { limit: usize },
    #[error("Wake-up registration rejected: {0}")]
    Substrate(String),
    #[error("Deadline out of range: {0}")]
    InvalidDeadline(String),
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(EntryState, EntryState),
}

/// Errors returned by fire listeners.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_error_display() {
        assert_eq!(
            SchedulerError::ShuttingDown.to_string(),
            "Scheduler is shutting down"
        );
        assert_eq!(
            SchedulerError::CapacityExceeded { limit: 3 }.to_string(),
            "Too many active entries (limit 3)"
        );
        assert_eq!(
            SchedulerError::Substrate("no runtime".to_string()).to_string(),
            "Wake-up registration rejected: no runtime"
        );

        let err = SchedulerError::InvalidTransition(EntryState::Fired, EntryState::Cancelled);
        assert_eq!(err.to_string(), "Invalid state transition: fired -> cancelled");
    }

    #[test]
    fn test_listener_error_display() {
        let err = ListenerError::Failed("socket closed".to_string());
        assert_eq!(err.to_string(), "Listener failed: socket closed");
    }
}
