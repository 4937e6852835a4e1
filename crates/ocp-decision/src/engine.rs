//! Decision engine
//!
//! Consumes an operational event plus cached context and produces a scored
//! decision with a human-review gate. The engine never surfaces an error
//! to its caller: every internal failure becomes the fallback escalation
//! decision with the error text embedded in the reasoning.

use crate::context::DecisionContext;
use crate::error::DecisionError;
use crate::history::LearningState;
use crate::options::GeneratorRegistry;
use crate::types::{ActionOption, Analysis, Decision, DecisionInput, Priority};
use ocp_store::{
    AuditStore, ContextStore, IncidentLevel, IncidentReport, IncidentSink, OpsStore,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Confidence below which a decision always requires operator sign-off.
pub const REVIEW_CONFIDENCE_FLOOR: f64 = 0.7;

/// Score penalty for review-flagged options on high-volume input kinds.
const HIGH_VOLUME_REVIEW_PENALTY: f64 = 0.8;

/// One option with its computed rank score
#[derive(Debug, Clone)]
struct ScoredOption {
    option: ActionOption,
    score: f64,
}

/// The decision engine.
///
/// Safe to share and call concurrently; the cached context and the
/// decision ledger sit behind mutexes.
pub struct DecisionEngine {
    store: Arc<dyn OpsStore>,
    registry: GeneratorRegistry,
    context: Mutex<DecisionContext>,
    learning: Mutex<LearningState>,
    incident_sink: Option<Arc<dyn IncidentSink>>,
}

impl DecisionEngine {
    /// Engine with the default option generators and an empty context.
    #[must_use]
    pub fn new(store: Arc<dyn OpsStore>) -> Self {
        Self::with_registry(store, GeneratorRegistry::with_defaults())
    }

    #[must_use]
    pub fn with_registry(store: Arc<dyn OpsStore>, registry: GeneratorRegistry) -> Self {
        Self {
            store,
            registry,
            context: Mutex::new(DecisionContext::new()),
            learning: Mutex::new(LearningState::new()),
            incident_sink: None,
        }
    }

    /// Wire a sink that receives an incident signal whenever the engine
    /// falls back on an internal error.
    #[must_use]
    pub fn with_incident_sink(mut self, sink: Arc<dyn IncidentSink>) -> Self {
        self.incident_sink = Some(sink);
        self
    }

    /// Engine with its context refreshed from the store.
    pub async fn bootstrap(store: Arc<dyn OpsStore>) -> Result<Self, DecisionError> {
        let engine = Self::new(store);
        engine.refresh_context().await?;
        Ok(engine)
    }

    /// Reload the cached context from the store adapter.
    pub async fn refresh_context(&self) -> Result<(), DecisionError> {
        let history = self
            .store
            .recent_history(crate::context::CONTEXT_HISTORY_CAP)
            .await?;
        let carriers = self.store.carrier_performance().await?;
        let customers = self.store.customer_preferences().await?;

        let mut ctx = self.context.lock();
        ctx.reload(history, carriers, customers);
        tracing::debug!(history = ctx.history_len(), "decision context refreshed");
        Ok(())
    }

    /// Produce a decision for one operational event.
    ///
    /// Infallible by contract: internal errors yield the fallback
    /// escalation decision and, when a sink is wired, an incident signal.
    pub async fn make_decision(&self, input: DecisionInput) -> Decision {
        let kind = input.kind;
        let priority = input.priority;

        match self.decide(&input).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(%kind, %priority, error = %e, "decision pipeline failed, falling back");
                if let Some(sink) = &self.incident_sink {
                    sink.raise(IncidentReport {
                        level: IncidentLevel::Medium,
                        kind: "decision_engine_failure".to_string(),
                        description: format!("decision pipeline error for {kind} event: {e}"),
                        source: Some("decision_engine".to_string()),
                    })
                    .await;
                }
                let decision =
                    Decision::fallback(kind, priority, format!("decision engine error: {e}"));
                // Best effort: the audit trail should show the fallback too.
                let _ = self.store.append_decision(decision.to_record()).await;
                self.learning.lock().record(&decision);
                decision
            }
        }
    }

    async fn decide(&self, input: &DecisionInput) -> Result<Decision, DecisionError> {
        // 1. Context refresh: merge the event into the history bucket.
        let (entry, pattern) = {
            let mut ctx = self.context.lock();
            let entry = ctx.observe(input);
            let pattern = ctx.pattern_for(input.kind.as_str());
            (entry, pattern)
        };
        self.store.push_history(entry).await?;

        // 2. Analysis from priority plus the historical-pattern lookup.
        let analysis = Analysis::from_priority(input.priority, pattern);

        // 3. Option generation; nothing generated means escalate now.
        let options = self.registry.generate(input);
        if options.is_empty() {
            tracing::warn!(kind = %input.kind, "no options generated, escalating");
            let decision = Decision::fallback(
                input.kind,
                input.priority,
                "no options could be generated for this input",
            );
            self.store.append_decision(decision.to_record()).await?;
            self.learning.lock().record(&decision);
            return Ok(decision);
        }

        // 4-6. Score, pick the winner, adjust confidence, gate on review.
        let ranked = rank_options(options, input);
        let winner = ranked
            .into_iter()
            .next()
            .map(|s| s.option)
            .ok_or_else(|| DecisionError::Internal("ranking produced no winner".to_string()))?;

        let adjusted = adjust_confidence(winner.confidence, input.priority);
        let requires_review = adjusted < REVIEW_CONFIDENCE_FLOOR
            || input.priority == Priority::Critical
            || winner.requires_human_review;

        let decision = Decision {
            kind: input.kind,
            priority: input.priority,
            action: winner.action,
            confidence: adjusted,
            reasoning: compose_reasoning(&winner, &analysis),
            estimated_impact: winner.estimated_impact,
            requires_human_review: requires_review,
            decided_at: chrono::Utc::now(),
        };

        // 7. Audit and learning.
        self.store.append_decision(decision.to_record()).await?;
        self.learning.lock().record(&decision);

        tracing::info!(
            kind = %decision.kind,
            action = %decision.action,
            confidence = decision.confidence,
            requires_review = decision.requires_human_review,
            "decision made"
        );
        Ok(decision)
    }

    /// Current learning-rate scalar. Published for scoring tuning, not
    /// consumed by the pipeline itself.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning.lock().learning_rate()
    }

    /// Number of decisions retained in the rolling ledger.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.learning.lock().len()
    }

    /// Number of events in the cached context history.
    #[must_use]
    pub fn context_history_len(&self) -> usize {
        self.context.lock().history_len()
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("history_len", &self.history_len())
            .field("learning_rate", &self.learning_rate())
            .finish_non_exhaustive()
    }
}

/// Score and order options, best first. Ties keep generation order.
fn rank_options(options: Vec<ActionOption>, input: &DecisionInput) -> Vec<ScoredOption> {
    let multiplier = input.priority.multiplier();
    let mut scored: Vec<ScoredOption> = options
        .into_iter()
        .map(|option| {
            let mut score = option.confidence * multiplier;
            if option.requires_human_review && input.kind.is_high_volume() {
                score *= HIGH_VOLUME_REVIEW_PENALTY;
            }
            ScoredOption { option, score }
        })
        .collect();
    // Stable sort keeps the generator's ordering for equal scores.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Cap the winning confidence for urgent work: critical and high priority
/// decisions never claim near-certainty.
fn adjust_confidence(confidence: f64, priority: Priority) -> f64 {
    match priority {
        Priority::Critical => (confidence * 0.9).min(0.95),
        Priority::High => (confidence * 0.95).min(0.90),
        Priority::Medium | Priority::Low => confidence,
    }
}

fn compose_reasoning(option: &ActionOption, analysis: &Analysis) -> String {
    match analysis.historical_pattern {
        Some(pattern) => format!(
            "{} (risk {}, time sensitivity {}, {} similar events seen)",
            option.reasoning,
            analysis.risk_level.as_str(),
            analysis.time_sensitivity.as_str(),
            pattern.occurrences
        ),
        None => format!(
            "{} (risk {}, time sensitivity {})",
            option.reasoning,
            analysis.risk_level.as_str(),
            analysis.time_sensitivity.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecisionAction, Impact, InputKind};

    fn option(action: DecisionAction, confidence: f64) -> ActionOption {
        ActionOption::new(action, confidence, "test", Impact::Low)
    }

    #[test]
    fn ranking_prefers_higher_score() {
        let input = DecisionInput::new(InputKind::Financial, Priority::Low);
        let ranked = rank_options(
            vec![
                option(DecisionAction::HoldForReview, 0.5),
                option(DecisionAction::AutoReconcile, 0.65),
            ],
            &input,
        );
        assert_eq!(ranked[0].option.action, DecisionAction::AutoReconcile);
    }

    #[test]
    fn ranking_penalizes_review_options_for_shipments() {
        let input = DecisionInput::new(InputKind::Shipment, Priority::Low);
        // Review-flagged 0.9 scores 0.72 and loses to a plain 0.8.
        let ranked = rank_options(
            vec![
                option(DecisionAction::EscalateToHuman, 0.9).review_flagged(),
                option(DecisionAction::AutoAssignCarrier, 0.8),
            ],
            &input,
        );
        assert_eq!(ranked[0].option.action, DecisionAction::AutoAssignCarrier);
    }

    #[test]
    fn ranking_keeps_order_on_ties() {
        let input = DecisionInput::new(InputKind::Analytics, Priority::Low);
        let ranked = rank_options(
            vec![
                option(DecisionAction::GenerateReport, 0.6),
                option(DecisionAction::ScheduleDeepAnalysis, 0.6),
            ],
            &input,
        );
        assert_eq!(ranked[0].option.action, DecisionAction::GenerateReport);
    }

    #[test]
    fn critical_confidence_is_capped() {
        assert!((adjust_confidence(1.0, Priority::Critical) - 0.9).abs() < f64::EPSILON);
        assert!(adjust_confidence(1.0, Priority::Critical) <= 0.95);
        assert!((adjust_confidence(0.8, Priority::High) - 0.76).abs() < 1e-9);
        assert!((adjust_confidence(0.8, Priority::Low) - 0.8).abs() < f64::EPSILON);
    }
}
