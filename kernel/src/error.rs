//! Error types for the safety kernel

use crate::state_machine::ResponsePhase;
use ocp_store::{IncidentId, StoreError};

/// Errors raised by the incident controller.
///
/// Per-action failures inside a playbook are not errors at this level;
/// they are captured in the incident's action list. Only handler-level
/// failures surface here and mark the incident failed.
#[derive(Debug, thiserror::Error)]
pub enum IncidentError {
    /// Unknown incident id
    #[error("incident {0} not found")]
    NotFound(IncidentId),

    /// Playbook attempted a transition the response state machine forbids
    #[error("illegal response transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: ResponsePhase,
        to: ResponsePhase,
    },

    /// Store adapter failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected failure inside an action or handler
    #[error("{0}")]
    HandlerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_transition() {
        let err = IncidentError::IllegalTransition {
            from: ResponsePhase::Resolved,
            to: ResponsePhase::Running,
        };
        assert!(err.to_string().contains("Resolved"));
    }
}
