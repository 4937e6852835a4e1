//! OCP safety kernel
//!
//! The incident-response side of the control plane: a severity-driven
//! state machine, the incident controller that executes safety actions
//! (emergency stop, soft degrade, rollback, resume) against the store
//! adapter, and the `ops-kernel` CLI.

pub mod artifacts;
pub mod controller;
pub mod error;
pub mod state_machine;

pub use controller::{ControllerConfig, IncidentController, ResumeOutcome};
pub use error::IncidentError;
pub use state_machine::ResponsePhase;

// The kernel's wire types live with the store contracts.
pub use ocp_store::{
    ActionResult, Incident, IncidentId, IncidentLevel, IncidentReport, IncidentStatus, Resolution,
    ResponseAction, SystemStatus,
};
