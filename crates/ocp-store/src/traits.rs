//! Store adapter contracts
//!
//! The control plane never talks to a concrete driver. Each operational
//! concern gets a small async trait; a real backend (or the in-memory
//! adapter) implements them all and is consumed as `Arc<dyn OpsStore>`.

use crate::error::StoreResult;
use crate::records::*;
use async_trait::async_trait;
use std::collections::HashMap;

/// Feature flags, including the kill-switch
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn flag(&self, key: &str) -> StoreResult<Option<serde_json::Value>>;

    async fn set_flag(&self, key: &str, value: serde_json::Value) -> StoreResult<()>;

    /// Atomically replace `key`'s value only if it currently equals
    /// `expected` (an absent flag matches `Value::Null`). Returns whether
    /// the swap happened.
    async fn compare_and_swap_flag(
        &self,
        key: &str,
        expected: &serde_json::Value,
        new: serde_json::Value,
    ) -> StoreResult<bool>;

    async fn emergency_stop_active(&self) -> StoreResult<bool>;

    /// Force every canary flag to its safe value.
    async fn set_canary_flags_safe(&self) -> StoreResult<()>;
}

/// Agent/workflow run states and the system-status record
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn system_status(&self) -> StoreResult<SystemStatus>;

    /// Base running bit; the effective `is_running` also requires the
    /// kill-switch to be clear.
    async fn set_base_running(&self, running: bool) -> StoreResult<()>;

    /// Move every agent in `from` to `to`; returns how many moved.
    async fn transition_agents(&self, from: RunState, to: RunState) -> StoreResult<usize>;

    async fn transition_workflows(&self, from: RunState, to: RunState) -> StoreResult<usize>;

    async fn count_agents(&self, state: RunState) -> StoreResult<usize>;

    async fn count_workflows(&self, state: RunState) -> StoreResult<usize>;

    /// Pause every agent and workflow belonging to one component.
    async fn isolate_component(&self, component: &str) -> StoreResult<IsolationOutcome>;
}

/// Control-plane settings the incident controller manipulates
#[async_trait]
pub trait ControlStore: Send + Sync {
    async fn control_settings(&self) -> StoreResult<ControlSettings>;

    async fn set_autonomous_writes(&self, enabled: bool) -> StoreResult<()>;

    async fn set_max_concurrency(&self, ceiling: u32) -> StoreResult<()>;

    async fn set_dlq_processing(&self, enabled: bool) -> StoreResult<()>;

    async fn set_resource_allocation(&self, allocation: ResourceAllocation) -> StoreResult<()>;

    async fn set_service_throttle(&self, pct: u8) -> StoreResult<()>;

    async fn set_monitoring_level(&self, level: MonitoringLevel) -> StoreResult<()>;
}

/// Incident record persistence
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn save_incident(&self, incident: &Incident) -> StoreResult<()>;

    async fn incident(&self, id: IncidentId) -> StoreResult<Option<Incident>>;

    /// All known incidents, oldest first.
    async fn incidents(&self) -> StoreResult<Vec<Incident>>;

    async fn append_incident_note(&self, id: IncidentId, note: &str) -> StoreResult<()>;
}

/// Decision audit log and acceptance-run summaries
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_decision(&self, record: DecisionRecord) -> StoreResult<()>;

    async fn recent_decisions(&self, limit: usize) -> StoreResult<Vec<DecisionRecord>>;

    /// Verify the decision log's hash chain.
    async fn verify_decision_log(&self) -> StoreResult<()>;

    async fn save_acceptance_summary(&self, summary: AcceptanceSummary) -> StoreResult<()>;

    async fn acceptance_summaries(&self) -> StoreResult<Vec<AcceptanceSummary>>;
}

/// CI workflows, deployments, rollback requests
#[async_trait]
pub trait CiStore: Send + Sync {
    async fn trigger_workflow(&self, kind: &str, reason: &str) -> StoreResult<CiWorkflowRecord>;

    async fn latest_successful_deployment(&self) -> StoreResult<Option<DeploymentRecord>>;

    async fn request_rollback(
        &self,
        deployment_id: &str,
        reason: &str,
    ) -> StoreResult<RollbackRequest>;

    /// Prepare a rollback request without executing it.
    async fn stage_rollback(&self, deployment_id: &str) -> StoreResult<()>;
}

/// Outbound notification channel
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn post_notification(&self, record: NotificationRecord) -> StoreResult<()>;

    async fn notifications_for_error(&self, error_id: ErrorId)
        -> StoreResult<Vec<NotificationRecord>>;

    async fn notifications_of_kind(&self, kind: &str) -> StoreResult<Vec<NotificationRecord>>;
}

/// Trace spans and error trace links
#[async_trait]
pub trait TraceStore: Send + Sync {
    async fn record_span(&self, span: TraceSpan) -> StoreResult<()>;

    async fn span_for_task(&self, task_id: TaskId) -> StoreResult<Option<TraceSpan>>;

    async fn trace_link_for_error(&self, error_id: ErrorId) -> StoreResult<Option<TraceLink>>;

    async fn recent_trace_links(&self, limit: usize) -> StoreResult<Vec<TraceLink>>;
}

/// Dead-letter queue
#[async_trait]
pub trait DlqStore: Send + Sync {
    async fn push_dlq(&self, entry: DlqEntry) -> StoreResult<()>;

    async fn dlq_entry_for_error(&self, error_id: ErrorId) -> StoreResult<Option<DlqEntry>>;
}

/// Synthetic error injection
#[async_trait]
pub trait FaultStore: Send + Sync {
    /// Record an injected error. The platform's error pipeline fans this
    /// out into a notification, a trace link, and a DLQ entry.
    async fn record_forced_error(&self, error: ForcedError) -> StoreResult<()>;
}

/// Tenant-scoped data access, the isolation probe's seam
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Rows owned by `data_owner`, visible under `tenant_ctx`'s row-level
    /// scope. With isolation intact, a cross-tenant query returns nothing.
    async fn tenant_rows(&self, tenant_ctx: &str, data_owner: &str)
        -> StoreResult<Vec<TenantRow>>;

    async fn insert_tenant_row(&self, row: TenantRow) -> StoreResult<()>;
}

/// Synthetic task records and their lifecycle projections
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: SyntheticTask) -> StoreResult<()>;

    async fn start_task(&self, id: TaskId) -> StoreResult<()>;

    async fn complete_task(&self, id: TaskId) -> StoreResult<()>;

    async fn task(&self, id: TaskId) -> StoreResult<Option<SyntheticTask>>;

    async fn live_feed_entry(&self, task_id: TaskId) -> StoreResult<Option<LiveFeedEntry>>;

    async fn audit_trail(&self, task_id: TaskId) -> StoreResult<Vec<AuditEvent>>;
}

/// Seed data for the decision context
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn recent_history(&self, limit: usize) -> StoreResult<Vec<HistoryEntry>>;

    async fn push_history(&self, entry: HistoryEntry) -> StoreResult<()>;

    async fn carrier_performance(&self) -> StoreResult<HashMap<String, CarrierMetrics>>;

    async fn customer_preferences(&self) -> StoreResult<HashMap<String, CustomerPrefs>>;
}

/// Health, SLO, and data-integrity probes
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<HealthCheck>;

    async fn slo_compliance(&self) -> StoreResult<SloCompliance>;

    async fn latest_integrity_check(&self) -> StoreResult<Option<IntegrityCheck>>;

    async fn record_integrity_check(&self, check: IntegrityCheck) -> StoreResult<()>;
}

/// Sink for incident signals raised outside the controller (for example by
/// the decision engine when it falls back on an internal error).
#[async_trait]
pub trait IncidentSink: Send + Sync {
    async fn raise(&self, report: IncidentReport);
}

/// The full store surface the control plane is wired against.
pub trait OpsStore:
    FlagStore
    + StatusStore
    + ControlStore
    + IncidentStore
    + AuditStore
    + CiStore
    + NotificationStore
    + TraceStore
    + DlqStore
    + FaultStore
    + TenantStore
    + TaskStore
    + ContextStore
    + HealthStore
{
}

impl<T> OpsStore for T where
    T: FlagStore
        + StatusStore
        + ControlStore
        + IncidentStore
        + AuditStore
        + CiStore
        + NotificationStore
        + TraceStore
        + DlqStore
        + FaultStore
        + TenantStore
        + TaskStore
        + ContextStore
        + HealthStore
{
}
