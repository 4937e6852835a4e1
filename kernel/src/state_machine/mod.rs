use crate::error::IncidentError;
use serde::{Deserialize, Serialize};

/// Response phase an incident moves through while the controller works it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePhase {
    Running,
    Degraded,
    Stopped,
    Monitoring,
    RollingBack,
    Resumed,
    Resolved,
    Failed,
}

/// Validates a response-phase transition.
///
/// Illegal transitions are errors; with the `strict-debug` feature they
/// panic instead so a bad playbook fails fast in development.
pub fn validate_transition(from: ResponsePhase, to: ResponsePhase) -> Result<(), IncidentError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal response transition attempted: {:?} -> {:?}", from, to);

        #[cfg(not(feature = "strict-debug"))]
        Err(IncidentError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: ResponsePhase) -> Vec<ResponsePhase> {
    use ResponsePhase::*;
    match from {
        Running => vec![Stopped, Degraded, Monitoring, Resolved, Failed],
        Stopped => vec![RollingBack, Resumed, Failed],
        Degraded => vec![Stopped, Monitoring, Resolved, Failed],
        Monitoring => vec![Stopped, Degraded, Resolved, Failed],
        RollingBack => vec![Resumed, Failed],
        Resumed => vec![Resolved, Failed],
        Resolved => vec![],
        Failed => vec![],
    }
}

fn allowed(from: ResponsePhase, to: ResponsePhase) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_and_resume_path_is_legal() {
        use ResponsePhase::*;
        assert!(validate_transition(Running, Stopped).is_ok());
        assert!(validate_transition(Stopped, Resumed).is_ok());
        assert!(validate_transition(Resumed, Resolved).is_ok());
    }

    #[test]
    fn rollback_only_from_stopped() {
        use ResponsePhase::*;
        assert!(validate_transition(Stopped, RollingBack).is_ok());
        assert!(validate_transition(Running, RollingBack).is_err());
        assert!(validate_transition(Monitoring, RollingBack).is_err());
    }

    #[test]
    fn terminal_phases_allow_nothing() {
        use ResponsePhase::*;
        assert!(allowed_transitions(Resolved).is_empty());
        assert!(allowed_transitions(Failed).is_empty());
    }

    #[test]
    fn escalation_from_degraded_to_stopped() {
        use ResponsePhase::*;
        assert!(validate_transition(Degraded, Stopped).is_ok());
        assert!(validate_transition(Monitoring, Stopped).is_ok());
    }
}
