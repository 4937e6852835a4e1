//! Playbooks and safety actions
//!
//! Each incident level maps to a fixed action sequence. Every action runs
//! under its timeout and is recorded as an `ActionResult` on the incident;
//! an action failure never aborts the surrounding playbook.

use super::IncidentController;
use crate::error::IncidentError;
use crate::state_machine::ResponsePhase;
use ocp_store::{
    ActionResult, CiStore, ControlStore, FlagStore, HealthStore, Incident, IncidentLevel,
    IncidentStore, MonitoringLevel, NotificationRecord, NotificationStore, ResourceAllocation,
    ResponseAction, RunState, StatusStore, TraceStore, EMERGENCY_STOP_FLAG,
};
use serde_json::json;
use std::future::Future;
use std::time::{Duration, Instant};

impl IncidentController {
    /// Critical: emergency stop, isolate, alert, investigate.
    pub(super) async fn respond_critical(
        &self,
        incident: &mut Incident,
    ) -> Result<(), IncidentError> {
        tracing::warn!(id = %incident.id, "critical incident, engaging emergency procedures");

        let stop = self.emergency_stop_action().await;
        let stopped = stop.success;
        incident.actions.push(stop);
        if stopped {
            self.transition(incident.id, ResponsePhase::Stopped)?;
        }

        let isolation = self.isolate_action(incident).await;
        incident.actions.push(isolation);

        let alert = self.alert_action(incident).await;
        incident.actions.push(alert);

        let investigation = self.investigate_action(incident).await;
        incident.actions.push(investigation);
        Ok(())
    }

    /// High: soft degrade, throttle, watch for escalation, alert.
    pub(super) async fn respond_high(&self, incident: &mut Incident) -> Result<(), IncidentError> {
        tracing::warn!(id = %incident.id, "high incident, degrading gracefully");

        let degrade = self.soft_degrade_action().await;
        let degraded = degrade.success;
        incident.actions.push(degrade);
        if degraded {
            self.transition(incident.id, ResponsePhase::Degraded)?;
        }

        let throttle = self.throttle_action().await;
        incident.actions.push(throttle);

        let monitor = self.monitor_action(MonitoringLevel::Elevated).await;
        incident.actions.push(monitor);

        let alert = self.alert_action(incident).await;
        incident.actions.push(alert);
        Ok(())
    }

    /// Medium: raise monitoring, stage a rollback, alert.
    pub(super) async fn respond_medium(
        &self,
        incident: &mut Incident,
    ) -> Result<(), IncidentError> {
        tracing::info!(id = %incident.id, "medium incident, raising monitoring");

        let monitor = self.monitor_action(MonitoringLevel::Intensive).await;
        let monitoring = monitor.success;
        incident.actions.push(monitor);
        if monitoring {
            self.transition(incident.id, ResponsePhase::Monitoring)?;
        }

        let prep = self.prepare_rollback_action().await;
        incident.actions.push(prep);

        let alert = self.alert_action(incident).await;
        incident.actions.push(alert);
        Ok(())
    }

    /// Low: log it, watch for escalation.
    pub(super) async fn respond_low(&self, incident: &mut Incident) -> Result<(), IncidentError> {
        tracing::info!(id = %incident.id, "low incident, logging");

        let log = self.log_incident_action(incident).await;
        let logged = log.success;
        incident.actions.push(log);
        if logged {
            self.transition(incident.id, ResponsePhase::Monitoring)?;
        }

        let monitor = self.monitor_action(MonitoringLevel::Elevated).await;
        incident.actions.push(monitor);
        Ok(())
    }

    /// Emergency stop, the big red button. Serialized with resume through
    /// the kill-switch lock. Sub-steps run in order and the first failure
    /// fails the whole action; partial state changes are kept, not
    /// reverted (a half-stopped system is safer than a revived one).
    pub(super) async fn emergency_stop_action(&self) -> ActionResult {
        let _guard = self.kill_switch.lock().await;
        tracing::warn!("triggering emergency stop");

        self.run_action(
            ResponseAction::EmergencyStop,
            self.config.emergency_stop_timeout,
            async {
                self.set_kill_switch(true).await?;
                self.store.set_autonomous_writes(false).await?;
                let agents_stopped = self
                    .store
                    .transition_agents(RunState::Running, RunState::Stopped)
                    .await?;
                let workflows_paused = self
                    .store
                    .transition_workflows(RunState::Running, RunState::Paused)
                    .await?;

                let running_agents = self.store.count_agents(RunState::Running).await?;
                let running_workflows = self.store.count_workflows(RunState::Running).await?;
                let flag_set = self.store.emergency_stop_active().await?;
                if running_agents != 0 || running_workflows != 0 || !flag_set {
                    return Err(IncidentError::HandlerFailed(format!(
                        "emergency stop verification failed: {running_agents} agents and \
                         {running_workflows} workflows still running, flag={flag_set}"
                    )));
                }

                Ok(json!({
                    "emergency_stop_active": true,
                    "autonomous_writes_halted": true,
                    "agents_stopped": agents_stopped,
                    "workflows_paused": workflows_paused,
                    "system_verified": true,
                }))
            },
        )
        .await
    }

    /// Soft degrade. All four levers are attempted independently and their
    /// individual outcomes reported; the action succeeds only when every
    /// lever landed. Partial degrade is an accepted terminal state left
    /// for operator review.
    pub(super) async fn soft_degrade_action(&self) -> ActionResult {
        tracing::warn!("triggering soft degrade");
        let started = Instant::now();
        let budget = self.config.soft_degrade_timeout;

        let outcome = tokio::time::timeout(budget, async {
            let concurrency = self
                .store
                .set_max_concurrency(self.config.degraded_concurrency)
                .await;
            let dlq = self.store.set_dlq_processing(false).await;
            let canary = self.store.set_canary_flags_safe().await;
            let resources = self
                .store
                .set_resource_allocation(ResourceAllocation::Minimal)
                .await;

            let details = json!({
                "concurrency_reduced": concurrency.is_ok(),
                "dlq_paused": dlq.is_ok(),
                "canary_flags_safe": canary.is_ok(),
                "resources_reduced": resources.is_ok(),
            });
            let errors: Vec<String> = [concurrency, dlq, canary, resources]
                .into_iter()
                .filter_map(|r| r.err().map(|e| e.to_string()))
                .collect();
            (details, errors)
        })
        .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok((details, errors)) if errors.is_empty() => {
                ActionResult::succeeded(ResponseAction::SoftDegrade, duration_ms, details)
            }
            Ok((details, errors)) => {
                tracing::error!(errors = ?errors, "soft degrade partially failed");
                ActionResult {
                    details,
                    ..ActionResult::failed(
                        ResponseAction::SoftDegrade,
                        duration_ms,
                        errors.join("; "),
                    )
                }
            }
            Err(_) => ActionResult::failed(
                ResponseAction::SoftDegrade,
                duration_ms,
                format!("soft degrade timed out after {}s", budget.as_secs()),
            ),
        }
    }

    /// Rollback through the CI self-heal path, verified by health and SLO
    /// checks. Fails loudly when no successful deployment exists.
    pub(super) async fn rollback_action(&self, incident: &Incident) -> ActionResult {
        tracing::warn!(id = %incident.id, "triggering rollback");
        let incident_id = incident.id;

        self.run_action(ResponseAction::Rollback, self.config.rollback_timeout, async {
            let workflow = self
                .store
                .trigger_workflow("rollback", "incident_response")
                .await?;

            let deployment = self
                .store
                .latest_successful_deployment()
                .await?
                .ok_or_else(|| {
                    IncidentError::HandlerFailed(
                        "no last known good deployment found".to_string(),
                    )
                })?;
            self.store
                .request_rollback(&deployment.id, "incident_response")
                .await?;

            let traces = self.store.recent_trace_links(5).await?;
            self.store
                .post_notification(
                    NotificationRecord::new("rollback_completed", "#ops-alerts")
                        .for_incident(incident_id)
                        .with_payload(json!({
                            "deployment_id": deployment.id,
                            "trace_links": traces.iter().map(|t| t.deep_link.clone()).collect::<Vec<_>>(),
                        })),
                )
                .await?;

            let health = self.store.health_check().await?;
            let slo = self.store.slo_compliance().await?;
            if !health.healthy || !slo.compliant {
                return Err(IncidentError::HandlerFailed(format!(
                    "rollback verification failed: healthy={}, slo_compliant={}",
                    health.healthy, slo.compliant
                )));
            }

            Ok(json!({
                "ci_rollback_triggered": true,
                "ci_workflow": workflow.id,
                "reverted_to": deployment.id,
                "audit_posted": true,
                "rollback_verified": true,
            }))
        })
        .await
    }

    /// Resume. Serialized with emergency stop; waits the propagation delay
    /// before verifying so eventual consistency cannot fake a failure.
    pub(super) async fn resume_action(&self) -> ActionResult {
        let _guard = self.kill_switch.lock().await;
        tracing::info!("resuming autonomous operations");

        let budget = self.config.resume_timeout + self.config.resume_propagation_delay;
        self.run_action(ResponseAction::Resume, budget, async {
            self.set_kill_switch(false).await?;
            self.store.set_autonomous_writes(true).await?;
            let agents_restarted = self
                .store
                .transition_agents(RunState::Stopped, RunState::Running)
                .await?;
            let workflows_resumed = self
                .store
                .transition_workflows(RunState::Paused, RunState::Running)
                .await?;

            // Let the writes propagate before trusting a read-back.
            tokio::time::sleep(self.config.resume_propagation_delay).await;

            let status = self.store.system_status().await?;
            if !status.is_running {
                return Err(IncidentError::HandlerFailed(
                    "system did not report running after resume".to_string(),
                ));
            }

            Ok(json!({
                "system_running": true,
                "agents_restarted": agents_restarted,
                "workflows_resumed": workflows_resumed,
            }))
        })
        .await
    }

    pub(super) async fn isolate_action(&self, incident: &Incident) -> ActionResult {
        let component = incident
            .source
            .clone()
            .unwrap_or_else(|| incident.kind.clone());
        self.run_action(ResponseAction::Isolate, self.config.action_timeout, async {
            let outcome = self.store.isolate_component(&component).await?;
            Ok(json!({
                "component": component,
                "agents_isolated": outcome.agents_isolated,
                "workflows_isolated": outcome.workflows_isolated,
            }))
        })
        .await
    }

    pub(super) async fn alert_action(&self, incident: &Incident) -> ActionResult {
        let channel = match incident.level {
            IncidentLevel::Critical => "#ops-critical",
            _ => "#ops-alerts",
        };
        let record = NotificationRecord::new("incident_alert", channel)
            .for_incident(incident.id)
            .with_payload(json!({
                "level": incident.level,
                "type": incident.kind,
                "description": incident.description,
            }));
        self.run_action(ResponseAction::Alert, self.config.action_timeout, async {
            self.store.post_notification(record).await?;
            Ok(json!({ "channel": channel, "stakeholders_alerted": true }))
        })
        .await
    }

    pub(super) async fn investigate_action(&self, incident: &Incident) -> ActionResult {
        let id = incident.id;
        self.run_action(
            ResponseAction::Investigate,
            self.config.action_timeout,
            async {
                self.store
                    .append_incident_note(id, "investigation opened")
                    .await?;
                Ok(json!({ "investigation_opened": true }))
            },
        )
        .await
    }

    pub(super) async fn throttle_action(&self) -> ActionResult {
        let pct = self.config.degraded_throttle_pct;
        self.run_action(ResponseAction::Throttle, self.config.action_timeout, async {
            self.store.set_service_throttle(pct).await?;
            Ok(json!({ "service_throttle_pct": pct }))
        })
        .await
    }

    pub(super) async fn monitor_action(&self, level: MonitoringLevel) -> ActionResult {
        self.run_action(ResponseAction::Monitor, self.config.action_timeout, async {
            self.store.set_monitoring_level(level).await?;
            Ok(json!({ "monitoring_level": level }))
        })
        .await
    }

    pub(super) async fn prepare_rollback_action(&self) -> ActionResult {
        self.run_action(
            ResponseAction::PrepareRollback,
            self.config.action_timeout,
            async {
                let deployment = self
                    .store
                    .latest_successful_deployment()
                    .await?
                    .ok_or_else(|| {
                        IncidentError::HandlerFailed(
                            "no successful deployment to stage".to_string(),
                        )
                    })?;
                self.store.stage_rollback(&deployment.id).await?;
                Ok(json!({ "staged_deployment": deployment.id }))
            },
        )
        .await
    }

    pub(super) async fn log_incident_action(&self, incident: &Incident) -> ActionResult {
        let id = incident.id;
        let note = format!("logged: {}", incident.description);
        self.run_action(
            ResponseAction::LogIncident,
            self.config.action_timeout,
            async {
                self.store.append_incident_note(id, &note).await?;
                Ok(json!({ "logged": true }))
            },
        )
        .await
    }

    /// Flip the kill-switch flag with a compare-and-swap against the
    /// store. Under the kill-switch lock this controller cannot race
    /// itself; the CAS guards against out-of-process writers.
    async fn set_kill_switch(&self, engage: bool) -> Result<(), IncidentError> {
        let desired = json!(engage);
        let prior = json!(!engage);

        if self
            .store
            .compare_and_swap_flag(EMERGENCY_STOP_FLAG, &prior, desired.clone())
            .await?
        {
            return Ok(());
        }
        // The flag may be unset, or already where we want it.
        if self
            .store
            .compare_and_swap_flag(EMERGENCY_STOP_FLAG, &serde_json::Value::Null, desired.clone())
            .await?
        {
            return Ok(());
        }
        let current = self.store.flag(EMERGENCY_STOP_FLAG).await?;
        if current.as_ref() == Some(&desired) {
            return Ok(());
        }
        Err(IncidentError::HandlerFailed(format!(
            "kill-switch flag contention: expected {prior}, found {current:?}"
        )))
    }

    /// Run one action under its budget, capturing success, failure, and
    /// timeout into an `ActionResult`.
    async fn run_action<F>(
        &self,
        kind: ResponseAction,
        budget: Duration,
        fut: F,
    ) -> ActionResult
    where
        F: Future<Output = Result<serde_json::Value, IncidentError>>,
    {
        let started = Instant::now();
        match tokio::time::timeout(budget, fut).await {
            Ok(Ok(details)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::info!(action = %kind, duration_ms, "action completed");
                ActionResult::succeeded(kind, duration_ms, details)
            }
            Ok(Err(e)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::error!(action = %kind, error = %e, "action failed");
                ActionResult::failed(kind, duration_ms, e.to_string())
            }
            Err(_) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::error!(action = %kind, budget_secs = budget.as_secs(), "action timed out");
                ActionResult::failed(
                    kind,
                    duration_ms,
                    format!("{kind} timed out after {}s", budget.as_secs()),
                )
            }
        }
    }
}
