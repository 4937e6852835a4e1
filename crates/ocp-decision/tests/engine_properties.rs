//! Property tests for the decision invariants

use ocp_decision::{DecisionEngine, DecisionInput, InputKind, Priority};
use ocp_store::MemoryStore;
use proptest::prelude::*;
use std::sync::Arc;

fn kind_strategy() -> impl Strategy<Value = InputKind> {
    prop_oneof![
        Just(InputKind::Shipment),
        Just(InputKind::CustomerService),
        Just(InputKind::Financial),
        Just(InputKind::Analytics),
    ]
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Critical),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn confidence_always_in_unit_range(kind in kind_strategy(), priority in priority_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let decision = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let engine = DecisionEngine::new(store);
            engine.make_decision(DecisionInput::new(kind, priority)).await
        });
        prop_assert!(decision.confidence >= 0.0);
        prop_assert!(decision.confidence <= 1.0);
    }

    #[test]
    fn critical_always_requires_review(kind in kind_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let decision = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let engine = DecisionEngine::new(store);
            engine
                .make_decision(DecisionInput::new(kind, Priority::Critical))
                .await
        });
        prop_assert!(decision.requires_human_review);
    }

    #[test]
    fn low_confidence_always_flagged(kind in kind_strategy(), priority in priority_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let decision = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let engine = DecisionEngine::new(store);
            engine.make_decision(DecisionInput::new(kind, priority)).await
        });
        if decision.confidence < 0.7 {
            prop_assert!(decision.requires_human_review);
        }
    }
}
