//! Option generation
//!
//! Candidate actions per input kind live in a registry keyed by
//! `InputKind`, so adding a domain means registering a generator rather
//! than growing a switch.

use crate::types::{ActionOption, DecisionAction, DecisionInput, Impact, InputKind};
use std::collections::HashMap;

/// Produces the candidate set for one input.
pub type OptionGenerator = fn(&DecisionInput) -> Vec<ActionOption>;

/// Registry mapping input kind to its option generator
#[derive(Debug, Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<InputKind, OptionGenerator>,
}

impl GeneratorRegistry {
    /// Empty registry. Every input kind falls through to no options (and
    /// therefore the engine's fallback decision).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Registry with the built-in generator per input kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(InputKind::Shipment, shipment_options);
        registry.register(InputKind::CustomerService, customer_service_options);
        registry.register(InputKind::Financial, financial_options);
        registry.register(InputKind::Analytics, analytics_options);
        registry
    }

    pub fn register(&mut self, kind: InputKind, generator: OptionGenerator) {
        self.generators.insert(kind, generator);
    }

    /// Candidate options for the input, empty when no generator is
    /// registered for its kind.
    #[must_use]
    pub fn generate(&self, input: &DecisionInput) -> Vec<ActionOption> {
        self.generators
            .get(&input.kind)
            .map(|generator| generator(input))
            .unwrap_or_default()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn shipment_options(_input: &DecisionInput) -> Vec<ActionOption> {
    vec![
        ActionOption::new(
            DecisionAction::AutoAssignCarrier,
            0.8,
            "Best-scoring carrier is available for the lane",
            Impact::Medium,
        ),
        ActionOption::new(
            DecisionAction::OptimizeRoute,
            0.7,
            "Route can be re-planned without missing the delivery window",
            Impact::Medium,
        ),
        ActionOption::new(
            DecisionAction::EscalateToHuman,
            0.3,
            "Hand the shipment to a dispatcher",
            Impact::Low,
        )
        .review_flagged(),
    ]
}

fn customer_service_options(_input: &DecisionInput) -> Vec<ActionOption> {
    vec![
        ActionOption::new(
            DecisionAction::AutoRespond,
            0.75,
            "Known request shape with a templated answer",
            Impact::Low,
        ),
        ActionOption::new(
            DecisionAction::RouteToSpecialist,
            0.6,
            "Route to the queue owning this request category",
            Impact::Low,
        ),
        ActionOption::new(
            DecisionAction::EscalateToHuman,
            0.35,
            "Hand the conversation to a support lead",
            Impact::Low,
        )
        .review_flagged(),
    ]
}

fn financial_options(_input: &DecisionInput) -> Vec<ActionOption> {
    vec![
        ActionOption::new(
            DecisionAction::AutoReconcile,
            0.65,
            "Amounts match within tolerance, reconcile automatically",
            Impact::Medium,
        ),
        ActionOption::new(
            DecisionAction::HoldForReview,
            0.5,
            "Park the transaction for the billing team",
            Impact::Low,
        )
        .review_flagged(),
        ActionOption::new(
            DecisionAction::EscalateToHuman,
            0.4,
            "Hand the discrepancy to finance",
            Impact::Low,
        )
        .review_flagged(),
    ]
}

fn analytics_options(_input: &DecisionInput) -> Vec<ActionOption> {
    vec![
        ActionOption::new(
            DecisionAction::GenerateReport,
            0.85,
            "Refresh the requested report from current data",
            Impact::Low,
        ),
        ActionOption::new(
            DecisionAction::ScheduleDeepAnalysis,
            0.6,
            "Queue a full analysis for the next batch window",
            Impact::Low,
        ),
        ActionOption::new(
            DecisionAction::EscalateToHuman,
            0.2,
            "Hand the question to an analyst",
            Impact::Low,
        )
        .review_flagged(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    #[test]
    fn defaults_cover_every_kind() {
        let registry = GeneratorRegistry::with_defaults();
        for kind in [
            InputKind::Shipment,
            InputKind::CustomerService,
            InputKind::Financial,
            InputKind::Analytics,
        ] {
            let input = DecisionInput::new(kind, Priority::Medium);
            assert!(!registry.generate(&input).is_empty(), "no options for {kind}");
        }
    }

    #[test]
    fn shipment_base_confidences() {
        let registry = GeneratorRegistry::with_defaults();
        let options = registry.generate(&DecisionInput::new(InputKind::Shipment, Priority::Low));

        assert_eq!(options[0].action, DecisionAction::AutoAssignCarrier);
        assert!((options[0].confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(options[1].action, DecisionAction::OptimizeRoute);
        assert!((options[1].confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(options[2].action, DecisionAction::EscalateToHuman);
        assert!((options[2].confidence - 0.3).abs() < f64::EPSILON);
        assert!(options[2].requires_human_review);
    }

    #[test]
    fn empty_registry_generates_nothing() {
        let registry = GeneratorRegistry::empty();
        let input = DecisionInput::new(InputKind::Shipment, Priority::Critical);
        assert!(registry.generate(&input).is_empty());
    }

    #[test]
    fn custom_generator_replaces_default() {
        fn single(_input: &DecisionInput) -> Vec<ActionOption> {
            vec![ActionOption::new(
                DecisionAction::GenerateReport,
                0.9,
                "only option",
                Impact::Low,
            )]
        }

        let mut registry = GeneratorRegistry::with_defaults();
        registry.register(InputKind::Analytics, single);
        let options = registry.generate(&DecisionInput::new(InputKind::Analytics, Priority::Low));
        assert_eq!(options.len(), 1);
    }
}
