//! Incident controller
//!
//! A severity-driven state machine that executes safety actions against
//! the store adapter and records every outcome on the incident. Incidents
//! are tracked independently by id; the two actions that mutate the
//! kill-switch flag (emergency stop and resume) are serialized through a
//! single lock so concurrent incidents cannot race the flag.

mod actions;

use crate::error::IncidentError;
use crate::state_machine::{self, ResponsePhase};
use async_trait::async_trait;
use dashmap::DashMap;
use ocp_store::{
    Incident, IncidentId, IncidentLevel, IncidentReport, IncidentSink, IncidentStatus,
    IncidentStore, OpsStore, Resolution,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Timeouts and levers for the controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub emergency_stop_timeout: Duration,
    pub soft_degrade_timeout: Duration,
    pub rollback_timeout: Duration,
    pub resume_timeout: Duration,
    /// Budget for supporting playbook steps (alerts, isolation, notes).
    pub action_timeout: Duration,
    /// Wait after resume writes before verifying, to tolerate eventual
    /// consistency in the external store.
    pub resume_propagation_delay: Duration,
    /// Concurrency ceiling under soft degrade (nominal is 150).
    pub degraded_concurrency: u32,
    /// Service throttle under the high-severity playbook.
    pub degraded_throttle_pct: u8,
    /// Where incident JSON artifacts are written, if anywhere.
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            emergency_stop_timeout: Duration::from_secs(30),
            soft_degrade_timeout: Duration::from_secs(60),
            rollback_timeout: Duration::from_secs(300),
            resume_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(30),
            resume_propagation_delay: Duration::from_secs(2),
            degraded_concurrency: 50,
            degraded_throttle_pct: 50,
            artifacts_dir: None,
        }
    }
}

/// Result of resuming the system after an incident
#[derive(Debug, Clone, Serialize)]
pub struct ResumeOutcome {
    pub success: bool,
    pub duration_ms: u64,
    pub system_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The incident controller
pub struct IncidentController {
    store: Arc<dyn OpsStore>,
    config: ControllerConfig,
    active: DashMap<IncidentId, Incident>,
    phases: DashMap<IncidentId, ResponsePhase>,
    /// Serializes the flag-mutating actions (stop and resume).
    kill_switch: tokio::sync::Mutex<()>,
}

impl IncidentController {
    #[must_use]
    pub fn new(store: Arc<dyn OpsStore>) -> Self {
        Self::with_config(store, ControllerConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn OpsStore>, config: ControllerConfig) -> Self {
        Self {
            store,
            config,
            active: DashMap::new(),
            phases: DashMap::new(),
            kill_switch: tokio::sync::Mutex::new(()),
        }
    }

    /// Handle one reported incident: select the playbook for its level,
    /// execute it, and persist the resulting record.
    ///
    /// Per-action failures are captured on the incident and do not abort
    /// handling; only a handler-level failure marks the incident failed
    /// and propagates.
    pub async fn handle_incident(&self, report: IncidentReport) -> Result<Incident, IncidentError> {
        let mut incident = Incident::from_report(report);
        tracing::info!(
            id = %incident.id,
            level = %incident.level,
            kind = %incident.kind,
            "incident detected"
        );

        self.phases.insert(incident.id, ResponsePhase::Running);
        self.active.insert(incident.id, incident.clone());
        // Persist the active record up front so playbook steps can
        // reference it (notes, alerts).
        self.store.save_incident(&incident).await?;

        let outcome = match incident.level {
            IncidentLevel::Critical => self.respond_critical(&mut incident).await,
            IncidentLevel::High => self.respond_high(&mut incident).await,
            IncidentLevel::Medium => self.respond_medium(&mut incident).await,
            IncidentLevel::Low => self.respond_low(&mut incident).await,
        };

        match outcome {
            Ok(()) => {
                self.persist(&incident).await?;
                self.active.insert(incident.id, incident.clone());
                tracing::info!(id = %incident.id, "incident response recorded");
                Ok(incident)
            }
            Err(e) => {
                tracing::error!(id = %incident.id, error = %e, "incident handling failed");
                incident.status = IncidentStatus::Failed;
                incident.error = Some(e.to_string());
                self.phases.insert(incident.id, ResponsePhase::Failed);
                // Best effort; the handler error is what propagates.
                let _ = self.persist(&incident).await;
                self.active.insert(incident.id, incident.clone());
                Err(e)
            }
        }
    }

    /// Bring the system back after an incident: clear the kill-switch,
    /// restart stopped units, wait out store propagation, verify, and mark
    /// the incident resolved.
    pub async fn resume(&self, incident_id: IncidentId) -> Result<ResumeOutcome, IncidentError> {
        let mut incident = self.lookup(incident_id).await?;
        tracing::info!(id = %incident_id, "resuming system");

        let result = self.resume_action().await;
        let duration_ms = result.duration_ms;
        let success = result.success;
        let error = result.error.clone();
        incident.actions.push(result);

        if success {
            let phase = self.current_phase(incident_id);
            if matches!(phase, ResponsePhase::Stopped | ResponsePhase::RollingBack) {
                self.transition(incident_id, ResponsePhase::Resumed)?;
            }
            self.transition(incident_id, ResponsePhase::Resolved)?;

            let total_ms =
                (chrono::Utc::now() - incident.timestamp).num_milliseconds().max(0) as u64;
            incident.status = IncidentStatus::Resolved;
            incident.resolution = Some(Resolution {
                timestamp: chrono::Utc::now(),
                method: "manual_resume".to_string(),
                duration_ms: total_ms,
            });
        }

        self.persist(&incident).await?;
        self.active.insert(incident.id, incident.clone());

        Ok(ResumeOutcome {
            success,
            duration_ms,
            system_running: success,
            error,
        })
    }

    /// Operator-invoked rollback to the last known-good deployment.
    /// Requires the system to be stopped first.
    pub async fn rollback(&self, incident_id: IncidentId) -> Result<ocp_store::ActionResult, IncidentError> {
        let mut incident = self.lookup(incident_id).await?;
        self.transition(incident_id, ResponsePhase::RollingBack)?;

        let result = self.rollback_action(&incident).await;
        incident.actions.push(result.clone());
        self.persist(&incident).await?;
        self.active.insert(incident.id, incident);
        Ok(result)
    }

    /// Incidents currently tracked in this process.
    #[must_use]
    pub fn active_incidents(&self) -> Vec<Incident> {
        let mut incidents: Vec<_> = self.active.iter().map(|e| e.value().clone()).collect();
        incidents.sort_by_key(|i| i.timestamp);
        incidents
    }

    /// Response phase of one tracked incident.
    #[must_use]
    pub fn phase(&self, incident_id: IncidentId) -> Option<ResponsePhase> {
        self.phases.get(&incident_id).map(|p| *p)
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    async fn lookup(&self, incident_id: IncidentId) -> Result<Incident, IncidentError> {
        if let Some(incident) = self.active.get(&incident_id) {
            return Ok(incident.clone());
        }
        self.store
            .incident(incident_id)
            .await?
            .ok_or(IncidentError::NotFound(incident_id))
    }

    fn current_phase(&self, incident_id: IncidentId) -> ResponsePhase {
        self.phases
            .get(&incident_id)
            .map(|p| *p)
            .unwrap_or(ResponsePhase::Running)
    }

    fn transition(&self, incident_id: IncidentId, to: ResponsePhase) -> Result<(), IncidentError> {
        let mut entry = self
            .phases
            .entry(incident_id)
            .or_insert(ResponsePhase::Running);
        state_machine::validate_transition(*entry, to)?;
        tracing::debug!(id = %incident_id, from = ?*entry, to = ?to, "response phase transition");
        *entry = to;
        Ok(())
    }

    async fn persist(&self, incident: &Incident) -> Result<(), IncidentError> {
        self.store.save_incident(incident).await?;
        if let Some(dir) = &self.config.artifacts_dir {
            if let Err(e) = crate::artifacts::write_incident_artifact(dir, incident) {
                // The store is the source of truth; a missing artifact file
                // is an operator inconvenience, not a handler failure.
                tracing::warn!(id = %incident.id, error = %e, "failed to write incident artifact");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl IncidentSink for IncidentController {
    async fn raise(&self, report: IncidentReport) {
        if let Err(e) = self.handle_incident(report).await {
            tracing::error!(error = %e, "failed to handle raised incident");
        }
    }
}

impl std::fmt::Debug for IncidentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentController")
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}
