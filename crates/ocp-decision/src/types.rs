//! Core types for the decision engine
//!
//! Inputs, candidate options, and the decision the engine hands back to
//! its caller.

use chrono::{DateTime, Utc};
use ocp_store::DecisionRecord;
use serde::{Deserialize, Serialize};

/// Kind of operational event a decision is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Shipment,
    CustomerService,
    Financial,
    Analytics,
}

impl InputKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Shipment => "shipment",
            InputKind::CustomerService => "customer_service",
            InputKind::Financial => "financial",
            InputKind::Analytics => "analytics",
        }
    }

    /// Shipment events arrive at much higher volume than the rest; scoring
    /// discourages escalation-heavy defaults for them.
    #[must_use]
    pub fn is_high_volume(self) -> bool {
        matches!(self, InputKind::Shipment)
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Score multiplier applied during option ranking.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Priority::Critical => 1.2,
            Priority::High => 1.1,
            Priority::Medium | Priority::Low => 1.0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One decision request. Immutable, created per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionInput {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub priority: Priority,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl DecisionInput {
    #[must_use]
    pub fn new(kind: InputKind, priority: Priority) -> Self {
        Self {
            kind,
            priority,
            data: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }
}

/// Estimated blast radius of executing an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

/// Automated actions the engine can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    AutoAssignCarrier,
    OptimizeRoute,
    AutoRespond,
    RouteToSpecialist,
    AutoReconcile,
    HoldForReview,
    GenerateReport,
    ScheduleDeepAnalysis,
    EscalateToHuman,
}

impl DecisionAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionAction::AutoAssignCarrier => "auto_assign_carrier",
            DecisionAction::OptimizeRoute => "optimize_route",
            DecisionAction::AutoRespond => "auto_respond",
            DecisionAction::RouteToSpecialist => "route_to_specialist",
            DecisionAction::AutoReconcile => "auto_reconcile",
            DecisionAction::HoldForReview => "hold_for_review",
            DecisionAction::GenerateReport => "generate_report",
            DecisionAction::ScheduleDeepAnalysis => "schedule_deep_analysis",
            DecisionAction::EscalateToHuman => "escalate_to_human",
        }
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate action with its pre-seeded base confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOption {
    pub action: DecisionAction,
    pub confidence: f64,
    pub reasoning: String,
    pub estimated_impact: Impact,
    pub requires_human_review: bool,
}

impl ActionOption {
    #[must_use]
    pub fn new(
        action: DecisionAction,
        confidence: f64,
        reasoning: impl Into<String>,
        estimated_impact: Impact,
    ) -> Self {
        Self {
            action,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            estimated_impact,
            requires_human_review: false,
        }
    }

    /// Mark the option as needing operator sign-off regardless of score.
    #[must_use]
    pub fn review_flagged(mut self) -> Self {
        self.requires_human_review = true;
        self
    }
}

/// Coarse signal level derived during analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    Low,
    Medium,
    High,
}

impl SignalLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalLevel::Low => "low",
            SignalLevel::Medium => "medium",
            SignalLevel::High => "high",
        }
    }
}

/// What the engine saw before in events of the same kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatternSummary {
    pub occurrences: usize,
    pub last_seen: DateTime<Utc>,
}

/// Derived view of one input used for scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub risk_level: SignalLevel,
    pub cost_impact: SignalLevel,
    pub time_sensitivity: SignalLevel,
    pub complexity: SignalLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_pattern: Option<PatternSummary>,
}

impl Analysis {
    /// Priority is the only strong signal today; cost and complexity stay
    /// at medium until richer inputs feed the analysis.
    #[must_use]
    pub fn from_priority(priority: Priority, historical_pattern: Option<PatternSummary>) -> Self {
        let urgency = match priority {
            Priority::Critical => SignalLevel::High,
            Priority::High => SignalLevel::Medium,
            Priority::Medium | Priority::Low => SignalLevel::Low,
        };
        Self {
            risk_level: urgency,
            cost_impact: SignalLevel::Medium,
            time_sensitivity: urgency,
            complexity: SignalLevel::Medium,
            historical_pattern,
        }
    }
}

/// The engine's answer for one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub priority: Priority,
    pub action: DecisionAction,
    pub confidence: f64,
    pub reasoning: String,
    pub estimated_impact: Impact,
    pub requires_human_review: bool,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// The safe decision returned when no options exist or the engine hits
    /// an internal error: escalate, zero confidence, review required.
    #[must_use]
    pub fn fallback(kind: InputKind, priority: Priority, reasoning: impl Into<String>) -> Self {
        Self {
            kind,
            priority,
            action: DecisionAction::EscalateToHuman,
            confidence: 0.0,
            reasoning: reasoning.into(),
            estimated_impact: Impact::Low,
            requires_human_review: true,
            decided_at: Utc::now(),
        }
    }

    /// Audit-log shape of this decision.
    #[must_use]
    pub fn to_record(&self) -> DecisionRecord {
        DecisionRecord {
            kind: self.kind.as_str().to_string(),
            priority: self.priority.as_str().to_string(),
            action: self.action.as_str().to_string(),
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
            impact: self.estimated_impact.as_str().to_string(),
            requires_review: self.requires_human_review,
            timestamp: self.decided_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_multipliers() {
        assert!((Priority::Critical.multiplier() - 1.2).abs() < f64::EPSILON);
        assert!((Priority::High.multiplier() - 1.1).abs() < f64::EPSILON);
        assert!((Priority::Low.multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn option_confidence_is_clamped() {
        let opt = ActionOption::new(
            DecisionAction::OptimizeRoute,
            1.7,
            "over-confident",
            Impact::Low,
        );
        assert!((opt.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_shape() {
        let d = Decision::fallback(InputKind::Shipment, Priority::Medium, "no options");
        assert_eq!(d.action, DecisionAction::EscalateToHuman);
        assert_eq!(d.confidence, 0.0);
        assert!(d.requires_human_review);
    }

    #[test]
    fn decision_input_accepts_wire_shape() {
        let json = r#"{"type":"shipment","priority":"critical","data":{}}"#;
        let input: DecisionInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.kind, InputKind::Shipment);
        assert_eq!(input.priority, Priority::Critical);
    }
}
