//! In-memory store adapter
//!
//! `MemoryStore` implements every store contract over guarded in-process
//! registries. It stands in for the hosted backend in tests, the acceptance
//! harness, and local runs, and emulates the platform projections a real
//! deployment provides (task lifecycle events, the error pipeline's fan-out
//! to notifications, traces and the DLQ).
//!
//! Fault-injection knobs let the harness exercise failure paths: individual
//! operations can be forced to fail, the error pipeline can be suppressed,
//! and tenant scoping can be deliberately broken.

use crate::audit::DecisionAuditLog;
use crate::error::{StoreError, StoreResult};
use crate::records::*;
use crate::traits::*;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    flags: RwLock<HashMap<String, serde_json::Value>>,
    base_running: AtomicBool,
    agents: RwLock<HashMap<String, AgentStatus>>,
    workflows: RwLock<HashMap<String, WorkflowStatus>>,
    control: RwLock<ControlSettings>,
    incidents: RwLock<Vec<Incident>>,
    incident_notes: RwLock<HashMap<IncidentId, Vec<String>>>,
    decision_log: DecisionAuditLog,
    acceptance_runs: RwLock<Vec<AcceptanceSummary>>,
    ci_workflows: RwLock<Vec<CiWorkflowRecord>>,
    deployments: RwLock<Vec<DeploymentRecord>>,
    rollback_requests: RwLock<Vec<RollbackRequest>>,
    notifications: RwLock<Vec<NotificationRecord>>,
    spans: RwLock<HashMap<TaskId, TraceSpan>>,
    trace_links: RwLock<HashMap<ErrorId, TraceLink>>,
    dlq: RwLock<Vec<DlqEntry>>,
    forced_errors: RwLock<Vec<ForcedError>>,
    tenant_data: RwLock<Vec<TenantRow>>,
    tasks: RwLock<HashMap<TaskId, SyntheticTask>>,
    live_feed: RwLock<Vec<LiveFeedEntry>>,
    task_events: RwLock<Vec<AuditEvent>>,
    history: RwLock<Vec<HistoryEntry>>,
    carriers: RwLock<HashMap<String, CarrierMetrics>>,
    customers: RwLock<HashMap<String, CustomerPrefs>>,
    integrity_checks: RwLock<Vec<IntegrityCheck>>,
    // fault-injection knobs
    failing_ops: RwLock<HashSet<String>>,
    op_delays: RwLock<HashMap<String, Duration>>,
    error_pipeline_enabled: AtomicBool,
    tenant_isolation_enforced: AtomicBool,
    slo_compliant: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let store = Self::default();
        store.base_running.store(true, Ordering::SeqCst);
        store.error_pipeline_enabled.store(true, Ordering::SeqCst);
        store.tenant_isolation_enforced.store(true, Ordering::SeqCst);
        store.slo_compliant.store(true, Ordering::SeqCst);
        store
    }

    /// Register an agent in the running state.
    pub fn add_agent(&self, agent_id: impl Into<String>) {
        let agent_id = agent_id.into();
        self.agents.write().insert(
            agent_id.clone(),
            AgentStatus {
                agent_id,
                state: RunState::Running,
                changed_at: Utc::now(),
            },
        );
    }

    /// Register a workflow in the running state.
    pub fn add_workflow(&self, workflow_id: impl Into<String>) {
        let workflow_id = workflow_id.into();
        self.workflows.write().insert(
            workflow_id.clone(),
            WorkflowStatus {
                workflow_id,
                state: RunState::Running,
                changed_at: Utc::now(),
            },
        );
    }

    pub fn add_deployment(&self, deployment: DeploymentRecord) {
        self.deployments.write().push(deployment);
    }

    pub fn add_carrier(&self, carrier_id: impl Into<String>, metrics: CarrierMetrics) {
        self.carriers.write().insert(carrier_id.into(), metrics);
    }

    pub fn add_customer(&self, customer_id: impl Into<String>, prefs: CustomerPrefs) {
        self.customers.write().insert(customer_id.into(), prefs);
    }

    /// Force the named operation to fail with a backend error until cleared.
    pub fn fail_on(&self, op: &str) {
        self.failing_ops.write().insert(op.to_string());
    }

    pub fn clear_fault(&self, op: &str) {
        self.failing_ops.write().remove(op);
    }

    /// Add artificial latency to the named operation, for exercising
    /// timeout paths deterministically.
    pub fn delay_op(&self, op: &str, delay: Duration) {
        self.op_delays.write().insert(op.to_string(), delay);
    }

    pub fn clear_delay(&self, op: &str) {
        self.op_delays.write().remove(op);
    }

    /// Suppress the error pipeline's fan-out for injected errors.
    pub fn set_error_pipeline(&self, enabled: bool) {
        self.error_pipeline_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Break row-level tenant scoping. Cross-tenant probes will see rows.
    pub fn set_tenant_isolation(&self, enforced: bool) {
        self.tenant_isolation_enforced
            .store(enforced, Ordering::SeqCst);
    }

    pub fn set_slo_compliant(&self, compliant: bool) {
        self.slo_compliant.store(compliant, Ordering::SeqCst);
    }

    async fn gate(&self, op: &str) -> StoreResult<()> {
        let delay = self.op_delays.read().get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_ops.read().contains(op) {
            tracing::warn!(op, "injected fault firing");
            return Err(StoreError::Backend(format!("injected fault in {op}")));
        }
        Ok(())
    }

    fn push_task_event(&self, task_id: TaskId, event: TaskEvent) {
        self.task_events.write().push(AuditEvent {
            task_id,
            event,
            at: Utc::now(),
        });
    }
}

#[async_trait]
impl FlagStore for MemoryStore {
    async fn flag(&self, key: &str) -> StoreResult<Option<serde_json::Value>> {
        self.gate("flag").await?;
        Ok(self.flags.read().get(key).cloned())
    }

    async fn set_flag(&self, key: &str, value: serde_json::Value) -> StoreResult<()> {
        self.gate("set_flag").await?;
        self.flags.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn compare_and_swap_flag(
        &self,
        key: &str,
        expected: &serde_json::Value,
        new: serde_json::Value,
    ) -> StoreResult<bool> {
        self.gate("compare_and_swap_flag").await?;
        let mut flags = self.flags.write();
        let current = flags.get(key).cloned().unwrap_or(serde_json::Value::Null);
        if &current == expected {
            flags.insert(key.to_string(), new);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn emergency_stop_active(&self) -> StoreResult<bool> {
        self.gate("emergency_stop_active").await?;
        Ok(self
            .flags
            .read()
            .get(EMERGENCY_STOP_FLAG)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    async fn set_canary_flags_safe(&self) -> StoreResult<()> {
        self.gate("set_canary_flags_safe").await?;
        let mut flags = self.flags.write();
        for key in CANARY_FLAGS {
            flags.insert(key.to_string(), serde_json::json!("SAFE"));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn system_status(&self) -> StoreResult<SystemStatus> {
        self.gate("system_status").await?;
        let stop = self
            .flags
            .read()
            .get(EMERGENCY_STOP_FLAG)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let base = self.base_running.load(Ordering::SeqCst);
        Ok(SystemStatus {
            is_running: base && !stop,
            emergency_stop_active: stop,
        })
    }

    async fn set_base_running(&self, running: bool) -> StoreResult<()> {
        self.gate("set_base_running").await?;
        self.base_running.store(running, Ordering::SeqCst);
        Ok(())
    }

    async fn transition_agents(&self, from: RunState, to: RunState) -> StoreResult<usize> {
        self.gate("transition_agents").await?;
        let mut agents = self.agents.write();
        let mut moved = 0;
        for agent in agents.values_mut() {
            if agent.state == from {
                agent.state = to;
                agent.changed_at = Utc::now();
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn transition_workflows(&self, from: RunState, to: RunState) -> StoreResult<usize> {
        self.gate("transition_workflows").await?;
        let mut workflows = self.workflows.write();
        let mut moved = 0;
        for workflow in workflows.values_mut() {
            if workflow.state == from {
                workflow.state = to;
                workflow.changed_at = Utc::now();
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn count_agents(&self, state: RunState) -> StoreResult<usize> {
        self.gate("count_agents").await?;
        Ok(self
            .agents
            .read()
            .values()
            .filter(|a| a.state == state)
            .count())
    }

    async fn count_workflows(&self, state: RunState) -> StoreResult<usize> {
        self.gate("count_workflows").await?;
        Ok(self
            .workflows
            .read()
            .values()
            .filter(|w| w.state == state)
            .count())
    }

    async fn isolate_component(&self, component: &str) -> StoreResult<IsolationOutcome> {
        self.gate("isolate_component").await?;
        let mut agents_isolated = 0;
        let mut workflows_isolated = 0;
        for agent in self.agents.write().values_mut() {
            if agent.agent_id.contains(component) && agent.state == RunState::Running {
                agent.state = RunState::Paused;
                agent.changed_at = Utc::now();
                agents_isolated += 1;
            }
        }
        for workflow in self.workflows.write().values_mut() {
            if workflow.workflow_id.contains(component) && workflow.state == RunState::Running {
                workflow.state = RunState::Paused;
                workflow.changed_at = Utc::now();
                workflows_isolated += 1;
            }
        }
        Ok(IsolationOutcome {
            agents_isolated,
            workflows_isolated,
        })
    }
}

#[async_trait]
impl ControlStore for MemoryStore {
    async fn control_settings(&self) -> StoreResult<ControlSettings> {
        self.gate("control_settings").await?;
        Ok(self.control.read().clone())
    }

    async fn set_autonomous_writes(&self, enabled: bool) -> StoreResult<()> {
        self.gate("set_autonomous_writes").await?;
        self.control.write().autonomous_writes_enabled = enabled;
        Ok(())
    }

    async fn set_max_concurrency(&self, ceiling: u32) -> StoreResult<()> {
        self.gate("set_max_concurrency").await?;
        self.control.write().max_concurrency = ceiling;
        Ok(())
    }

    async fn set_dlq_processing(&self, enabled: bool) -> StoreResult<()> {
        self.gate("set_dlq_processing").await?;
        self.control.write().dlq_processing_enabled = enabled;
        Ok(())
    }

    async fn set_resource_allocation(&self, allocation: ResourceAllocation) -> StoreResult<()> {
        self.gate("set_resource_allocation").await?;
        self.control.write().resource_allocation = allocation;
        Ok(())
    }

    async fn set_service_throttle(&self, pct: u8) -> StoreResult<()> {
        self.gate("set_service_throttle").await?;
        self.control.write().service_throttle_pct = pct.min(100);
        Ok(())
    }

    async fn set_monitoring_level(&self, level: MonitoringLevel) -> StoreResult<()> {
        self.gate("set_monitoring_level").await?;
        self.control.write().monitoring_level = level;
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn save_incident(&self, incident: &Incident) -> StoreResult<()> {
        self.gate("save_incident").await?;
        let mut incidents = self.incidents.write();
        if let Some(existing) = incidents.iter_mut().find(|i| i.id == incident.id) {
            *existing = incident.clone();
        } else {
            incidents.push(incident.clone());
        }
        Ok(())
    }

    async fn incident(&self, id: IncidentId) -> StoreResult<Option<Incident>> {
        self.gate("incident").await?;
        Ok(self.incidents.read().iter().find(|i| i.id == id).cloned())
    }

    async fn incidents(&self) -> StoreResult<Vec<Incident>> {
        self.gate("incidents").await?;
        Ok(self.incidents.read().clone())
    }

    async fn append_incident_note(&self, id: IncidentId, note: &str) -> StoreResult<()> {
        self.gate("append_incident_note").await?;
        if !self.incidents.read().iter().any(|i| i.id == id) {
            return Err(StoreError::NotFound(format!("incident {id}")));
        }
        self.incident_notes
            .write()
            .entry(id)
            .or_default()
            .push(note.to_string());
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_decision(&self, record: DecisionRecord) -> StoreResult<()> {
        self.gate("append_decision").await?;
        self.decision_log.append(record);
        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> StoreResult<Vec<DecisionRecord>> {
        self.gate("recent_decisions").await?;
        Ok(self.decision_log.recent(limit))
    }

    async fn verify_decision_log(&self) -> StoreResult<()> {
        self.gate("verify_decision_log").await?;
        self.decision_log.verify_integrity()
    }

    async fn save_acceptance_summary(&self, summary: AcceptanceSummary) -> StoreResult<()> {
        self.gate("save_acceptance_summary").await?;
        self.acceptance_runs.write().push(summary);
        Ok(())
    }

    async fn acceptance_summaries(&self) -> StoreResult<Vec<AcceptanceSummary>> {
        self.gate("acceptance_summaries").await?;
        Ok(self.acceptance_runs.read().clone())
    }
}

#[async_trait]
impl CiStore for MemoryStore {
    async fn trigger_workflow(&self, kind: &str, reason: &str) -> StoreResult<CiWorkflowRecord> {
        self.gate("trigger_workflow").await?;
        let record = CiWorkflowRecord {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            status: "triggered".to_string(),
            reason: reason.to_string(),
            triggered_at: Utc::now(),
        };
        self.ci_workflows.write().push(record.clone());
        Ok(record)
    }

    async fn latest_successful_deployment(&self) -> StoreResult<Option<DeploymentRecord>> {
        self.gate("latest_successful_deployment").await?;
        Ok(self
            .deployments
            .read()
            .iter()
            .filter(|d| d.status == DeployState::Successful)
            .max_by_key(|d| d.deployed_at)
            .cloned())
    }

    async fn request_rollback(
        &self,
        deployment_id: &str,
        reason: &str,
    ) -> StoreResult<RollbackRequest> {
        self.gate("request_rollback").await?;
        let request = RollbackRequest {
            deployment_id: deployment_id.to_string(),
            reason: reason.to_string(),
            requested_at: Utc::now(),
            staged: false,
        };
        self.rollback_requests.write().push(request.clone());
        Ok(request)
    }

    async fn stage_rollback(&self, deployment_id: &str) -> StoreResult<()> {
        self.gate("stage_rollback").await?;
        self.rollback_requests.write().push(RollbackRequest {
            deployment_id: deployment_id.to_string(),
            reason: "staged".to_string(),
            requested_at: Utc::now(),
            staged: true,
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn post_notification(&self, record: NotificationRecord) -> StoreResult<()> {
        self.gate("post_notification").await?;
        self.notifications.write().push(record);
        Ok(())
    }

    async fn notifications_for_error(
        &self,
        error_id: ErrorId,
    ) -> StoreResult<Vec<NotificationRecord>> {
        self.gate("notifications_for_error").await?;
        Ok(self
            .notifications
            .read()
            .iter()
            .filter(|n| n.error_id == Some(error_id))
            .cloned()
            .collect())
    }

    async fn notifications_of_kind(&self, kind: &str) -> StoreResult<Vec<NotificationRecord>> {
        self.gate("notifications_of_kind").await?;
        Ok(self
            .notifications
            .read()
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TraceStore for MemoryStore {
    async fn record_span(&self, span: TraceSpan) -> StoreResult<()> {
        self.gate("record_span").await?;
        self.spans.write().insert(span.task_id, span);
        Ok(())
    }

    async fn span_for_task(&self, task_id: TaskId) -> StoreResult<Option<TraceSpan>> {
        self.gate("span_for_task").await?;
        Ok(self.spans.read().get(&task_id).cloned())
    }

    async fn trace_link_for_error(&self, error_id: ErrorId) -> StoreResult<Option<TraceLink>> {
        self.gate("trace_link_for_error").await?;
        Ok(self.trace_links.read().get(&error_id).cloned())
    }

    async fn recent_trace_links(&self, limit: usize) -> StoreResult<Vec<TraceLink>> {
        self.gate("recent_trace_links").await?;
        let links = self.trace_links.read();
        Ok(links.values().take(limit).cloned().collect())
    }
}

#[async_trait]
impl DlqStore for MemoryStore {
    async fn push_dlq(&self, entry: DlqEntry) -> StoreResult<()> {
        self.gate("push_dlq").await?;
        self.dlq.write().push(entry);
        Ok(())
    }

    async fn dlq_entry_for_error(&self, error_id: ErrorId) -> StoreResult<Option<DlqEntry>> {
        self.gate("dlq_entry_for_error").await?;
        Ok(self
            .dlq
            .read()
            .iter()
            .find(|e| e.error_id == error_id)
            .cloned())
    }
}

#[async_trait]
impl FaultStore for MemoryStore {
    async fn record_forced_error(&self, error: ForcedError) -> StoreResult<()> {
        self.gate("record_forced_error").await?;
        let error_id = error.id;
        self.forced_errors.write().push(error);

        // Error pipeline fan-out, as the platform would do on ingestion.
        if self.error_pipeline_enabled.load(Ordering::SeqCst) {
            let trace_id = Uuid::new_v4();
            self.notifications.write().push(
                NotificationRecord::new("error_alert", "#ops-alerts")
                    .for_error(error_id)
                    .with_payload(serde_json::json!({ "trace_id": trace_id })),
            );
            self.trace_links.write().insert(
                error_id,
                TraceLink {
                    error_id,
                    trace_id,
                    deep_link: format!("https://traces.example.com/{trace_id}"),
                },
            );
            self.dlq.write().push(DlqEntry {
                error_id,
                queue: "ops-dlq".to_string(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn tenant_rows(
        &self,
        tenant_ctx: &str,
        data_owner: &str,
    ) -> StoreResult<Vec<TenantRow>> {
        self.gate("tenant_rows").await?;
        let enforced = self.tenant_isolation_enforced.load(Ordering::SeqCst);
        Ok(self
            .tenant_data
            .read()
            .iter()
            .filter(|row| row.data_owner == data_owner)
            .filter(|row| !enforced || row.tenant_id == tenant_ctx)
            .cloned()
            .collect())
    }

    async fn insert_tenant_row(&self, row: TenantRow) -> StoreResult<()> {
        self.gate("insert_tenant_row").await?;
        self.tenant_data.write().push(row);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: SyntheticTask) -> StoreResult<()> {
        self.gate("create_task").await?;
        let task_id = task.id;
        self.tasks.write().insert(task_id, task);
        self.live_feed.write().push(LiveFeedEntry {
            task_id,
            timestamp: Utc::now(),
        });
        self.push_task_event(task_id, TaskEvent::TaskCreated);
        Ok(())
    }

    async fn start_task(&self, id: TaskId) -> StoreResult<()> {
        self.gate("start_task").await?;
        if !self.tasks.read().contains_key(&id) {
            return Err(StoreError::NotFound(format!("task {id}")));
        }
        self.push_task_event(id, TaskEvent::TaskStarted);
        Ok(())
    }

    async fn complete_task(&self, id: TaskId) -> StoreResult<()> {
        self.gate("complete_task").await?;
        let created_at = {
            let mut tasks = self.tasks.write();
            let task = tasks
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("task {id}")))?;
            task.status = TaskState::Completed;
            task.completed_at = Some(Utc::now());
            task.created_at
        };
        self.push_task_event(id, TaskEvent::TaskCompleted);
        let duration_ms = (Utc::now() - created_at).num_milliseconds().max(0) as u64;
        self.spans.write().insert(
            id,
            TraceSpan {
                task_id: id,
                span_id: Uuid::new_v4(),
                duration_ms: Some(duration_ms),
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn task(&self, id: TaskId) -> StoreResult<Option<SyntheticTask>> {
        self.gate("task").await?;
        Ok(self.tasks.read().get(&id).cloned())
    }

    async fn live_feed_entry(&self, task_id: TaskId) -> StoreResult<Option<LiveFeedEntry>> {
        self.gate("live_feed_entry").await?;
        Ok(self
            .live_feed
            .read()
            .iter()
            .find(|e| e.task_id == task_id)
            .cloned())
    }

    async fn audit_trail(&self, task_id: TaskId) -> StoreResult<Vec<AuditEvent>> {
        self.gate("audit_trail").await?;
        Ok(self
            .task_events
            .read()
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn recent_history(&self, limit: usize) -> StoreResult<Vec<HistoryEntry>> {
        self.gate("recent_history").await?;
        let history = self.history.read();
        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    async fn push_history(&self, entry: HistoryEntry) -> StoreResult<()> {
        self.gate("push_history").await?;
        self.history.write().push(entry);
        Ok(())
    }

    async fn carrier_performance(&self) -> StoreResult<HashMap<String, CarrierMetrics>> {
        self.gate("carrier_performance").await?;
        Ok(self.carriers.read().clone())
    }

    async fn customer_preferences(&self) -> StoreResult<HashMap<String, CustomerPrefs>> {
        self.gate("customer_preferences").await?;
        Ok(self.customers.read().clone())
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<HealthCheck> {
        self.gate("health_check").await?;
        let consistent = self
            .integrity_checks
            .read()
            .iter()
            .max_by_key(|c| c.timestamp)
            .map(|c| c.is_consistent)
            .unwrap_or(true);
        Ok(HealthCheck {
            healthy: self.base_running.load(Ordering::SeqCst) && consistent,
        })
    }

    async fn slo_compliance(&self) -> StoreResult<SloCompliance> {
        self.gate("slo_compliance").await?;
        Ok(SloCompliance {
            compliant: self.slo_compliant.load(Ordering::SeqCst),
        })
    }

    async fn latest_integrity_check(&self) -> StoreResult<Option<IntegrityCheck>> {
        self.gate("latest_integrity_check").await?;
        Ok(self
            .integrity_checks
            .read()
            .iter()
            .max_by_key(|c| c.timestamp)
            .cloned())
    }

    async fn record_integrity_check(&self, check: IntegrityCheck) -> StoreResult<()> {
        self.gate("record_integrity_check").await?;
        self.integrity_checks.write().push(check);
        Ok(())
    }
}
