//! Operational records
//!
//! Typed shapes for every logical collection the control plane reads or
//! writes through the store adapter: flags, run states, incidents,
//! CI/deployment records, notification and trace records, synthetic task
//! projections, tenant rows, and SLO evidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key of the global kill-switch flag.
pub const EMERGENCY_STOP_FLAG: &str = "autonomy.emergencyStop";

/// Canary flags forced to a safe value during soft degrade.
pub const CANARY_FLAGS: [&str; 3] = [
    "canary.rollout_percentage",
    "canary.auto_rollback",
    "canary.health_threshold",
];

/// Unique incident identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(pub Uuid);

impl IncidentId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IncidentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IncidentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a single response action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique synthetic-task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique injected-error identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorId(pub Uuid);

impl ErrorId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ErrorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Run state of an agent or workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Stopped,
    Paused,
}

/// Status record for a single autonomous agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_id: String,
    pub state: RunState,
    pub changed_at: DateTime<Utc>,
}

/// Status record for a single workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub workflow_id: String,
    pub state: RunState,
    pub changed_at: DateTime<Utc>,
}

/// The single logical system-status record.
///
/// `is_running` is derived on read: the system reports running only while
/// the base flag is set and the kill-switch is clear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemStatus {
    pub is_running: bool,
    pub emergency_stop_active: bool,
}

/// Outcome of isolating one component's agents and workflows
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IsolationOutcome {
    pub agents_isolated: usize,
    pub workflows_isolated: usize,
}

/// Resource allocation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAllocation {
    Normal,
    Minimal,
}

/// Monitoring intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringLevel {
    Normal,
    Elevated,
    Intensive,
}

/// Mutable control-plane settings the incident controller manipulates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSettings {
    pub autonomous_writes_enabled: bool,
    pub max_concurrency: u32,
    pub dlq_processing_enabled: bool,
    pub resource_allocation: ResourceAllocation,
    /// Percentage of nominal service throughput, 100 = unthrottled.
    pub service_throttle_pct: u8,
    pub monitoring_level: MonitoringLevel,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            autonomous_writes_enabled: true,
            max_concurrency: 150,
            dlq_processing_enabled: true,
            resource_allocation: ResourceAllocation::Normal,
            service_throttle_pct: 100,
            monitoring_level: MonitoringLevel::Normal,
        }
    }
}

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for IncidentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IncidentLevel::Critical => "critical",
            IncidentLevel::High => "high",
            IncidentLevel::Medium => "medium",
            IncidentLevel::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status of an incident record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Failed,
}

/// Kinds of response action a playbook can record.
///
/// The four primary levers plus the supporting playbook steps, so every
/// step of a response is auditable in the incident's action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    EmergencyStop,
    SoftDegrade,
    Rollback,
    Resume,
    Isolate,
    Throttle,
    Monitor,
    PrepareRollback,
    Investigate,
    Alert,
    LogIncident,
}

impl std::fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResponseAction::EmergencyStop => "emergency_stop",
            ResponseAction::SoftDegrade => "soft_degrade",
            ResponseAction::Rollback => "rollback",
            ResponseAction::Resume => "resume",
            ResponseAction::Isolate => "isolate",
            ResponseAction::Throttle => "throttle",
            ResponseAction::Monitor => "monitor",
            ResponseAction::PrepareRollback => "prepare_rollback",
            ResponseAction::Investigate => "investigate",
            ResponseAction::Alert => "alert",
            ResponseAction::LogIncident => "log_incident",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a single executed response action, append-only per incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: ActionId,
    pub kind: ResponseAction,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    /// Successful action with structured details.
    #[must_use]
    pub fn succeeded(kind: ResponseAction, duration_ms: u64, details: serde_json::Value) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            timestamp: Utc::now(),
            duration_ms,
            success: true,
            details,
            error: None,
        }
    }

    /// Failed action carrying the causing error text.
    #[must_use]
    pub fn failed(kind: ResponseAction, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            timestamp: Utc::now(),
            duration_ms,
            success: false,
            details: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Inbound description of a detected incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    pub level: IncidentLevel,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// How and when an incident was closed out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub duration_ms: u64,
}

/// A tracked incident and everything done in response to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub timestamp: DateTime<Utc>,
    pub level: IncidentLevel,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub status: IncidentStatus,
    pub actions: Vec<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Incident {
    /// New active incident from an inbound report.
    #[must_use]
    pub fn from_report(report: IncidentReport) -> Self {
        Self {
            id: IncidentId::new(),
            timestamp: Utc::now(),
            level: report.level,
            kind: report.kind,
            description: report.description,
            source: report.source,
            status: IncidentStatus::Active,
            actions: Vec::new(),
            resolution: None,
            error: None,
        }
    }
}

/// Deployment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Successful,
    Failed,
    InProgress,
}

/// A recorded deployment, rollback target candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub status: DeployState,
    pub deployed_at: DateTime<Utc>,
}

/// A triggered CI workflow (self-heal, rollback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiWorkflowRecord {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub reason: String,
    pub triggered_at: DateTime<Utc>,
}

/// Request to revert to a known-good deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub deployment_id: String,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    /// Staged requests are prepared ahead of time and not yet executed.
    #[serde(default)]
    pub staged: bool,
}

/// An outbound notification delivery record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub kind: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_id: Option<ErrorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<IncidentId>,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl NotificationRecord {
    #[must_use]
    pub fn new(kind: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            channel: channel.into(),
            error_id: None,
            incident_id: None,
            payload: serde_json::Value::Null,
            sent_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn for_error(mut self, error_id: ErrorId) -> Self {
        self.error_id = Some(error_id);
        self
    }

    #[must_use]
    pub fn for_incident(mut self, incident_id: IncidentId) -> Self {
        self.incident_id = Some(incident_id);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A trace span recorded for a task's execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    pub task_id: TaskId,
    pub span_id: Uuid,
    pub duration_ms: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

/// A deep link into the trace store for an injected error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLink {
    pub error_id: ErrorId,
    pub trace_id: Uuid,
    pub deep_link: String,
}

/// Dead-letter-queue entry awaiting reprocessing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    pub error_id: ErrorId,
    pub queue: String,
    pub created_at: DateTime<Utc>,
}

/// A synthetically injected error record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcedError {
    pub id: ErrorId,
    pub error_number: u32,
    pub kind: String,
    pub severity: String,
    pub created_at: DateTime<Utc>,
}

/// A tenant-scoped data row used by the isolation probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRow {
    pub tenant_id: String,
    pub data_owner: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Synthetic task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Running,
    Completed,
}

/// A synthetic task driven end-to-end by the harness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticTask {
    pub id: TaskId,
    pub task_number: u32,
    pub kind: String,
    pub status: TaskState,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyntheticTask {
    #[must_use]
    pub fn new(task_number: u32, kind: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            task_number,
            kind: kind.into(),
            status: TaskState::Running,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Live-feed projection entry for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveFeedEntry {
    pub task_id: TaskId,
    pub timestamp: DateTime<Utc>,
}

/// Task lifecycle events captured in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEvent {
    TaskCreated,
    TaskStarted,
    TaskCompleted,
    TaskFailed,
}

/// One audit-trail entry for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub task_id: TaskId,
    pub event: TaskEvent,
    pub at: DateTime<Utc>,
}

/// Data-integrity check outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityCheck {
    pub is_consistent: bool,
    pub timestamp: DateTime<Utc>,
}

/// Health probe outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthCheck {
    pub healthy: bool,
}

/// SLO compliance probe outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SloCompliance {
    pub compliant: bool,
}

/// Daily SLO evidence snapshot produced by the observability pipeline.
///
/// Field names follow the pipeline's JSON: `uptime`, `successRate`,
/// `p95ResponseTime` (milliseconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePack {
    pub uptime: f64,
    pub success_rate: f64,
    pub p95_response_time: f64,
}

/// Audited record of one decision, keyed by timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    pub action: String,
    pub confidence: f64,
    pub reasoning: String,
    pub impact: String,
    pub requires_review: bool,
    pub timestamp: DateTime<Utc>,
}

/// One remembered operational event in the decision context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: String,
    pub priority: String,
    pub at: DateTime<Utc>,
}

/// Rolling performance metrics for one carrier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarrierMetrics {
    pub on_time_rate: f64,
    pub acceptance_rate: f64,
    pub avg_cost_per_mile: f64,
}

/// Stored preferences for one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPrefs {
    pub preferred_carriers: Vec<String>,
    pub notify_on_exception: bool,
}

/// Persisted summary of one acceptance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceSummary {
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_report_round_trips_with_type_field() {
        let json = r#"{"level":"critical","type":"db_outage","description":"primary down"}"#;
        let report: IncidentReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.level, IncidentLevel::Critical);
        assert_eq!(report.kind, "db_outage");

        let back = serde_json::to_value(&report).unwrap();
        assert_eq!(back["type"], "db_outage");
    }

    #[test]
    fn evidence_pack_uses_pipeline_field_names() {
        let json = r#"{"uptime":0.9996,"successRate":0.99,"p95ResponseTime":1200.0}"#;
        let pack: EvidencePack = serde_json::from_str(json).unwrap();
        assert!(pack.uptime > 0.9995);
        assert!((pack.p95_response_time - 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn action_result_failed_carries_error() {
        let result = ActionResult::failed(ResponseAction::Rollback, 12, "no deployment");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no deployment"));
    }

    #[test]
    fn control_settings_defaults_are_nominal() {
        let settings = ControlSettings::default();
        assert!(settings.autonomous_writes_enabled);
        assert_eq!(settings.max_concurrency, 150);
        assert_eq!(settings.resource_allocation, ResourceAllocation::Normal);
    }
}
