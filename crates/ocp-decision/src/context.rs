//! Process-lifetime decision context
//!
//! A bounded cache of recent events plus carrier and customer lookups,
//! refreshed from the store adapter at startup and updated per decision.

use crate::types::{DecisionInput, PatternSummary};
use ocp_store::{CarrierMetrics, CustomerPrefs, HistoryEntry};
use std::collections::{HashMap, VecDeque};

/// Maximum remembered events; oldest evicted first.
pub const CONTEXT_HISTORY_CAP: usize = 100;

#[derive(Debug, Default)]
pub struct DecisionContext {
    recent_history: VecDeque<HistoryEntry>,
    carrier_performance: HashMap<String, CarrierMetrics>,
    customer_preferences: HashMap<String, CustomerPrefs>,
}

impl DecisionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache wholesale from store reads.
    pub fn reload(
        &mut self,
        history: Vec<HistoryEntry>,
        carriers: HashMap<String, CarrierMetrics>,
        customers: HashMap<String, CustomerPrefs>,
    ) {
        self.recent_history = history.into_iter().collect();
        while self.recent_history.len() > CONTEXT_HISTORY_CAP {
            self.recent_history.pop_front();
        }
        self.carrier_performance = carriers;
        self.customer_preferences = customers;
    }

    /// Merge one incoming event into the history bucket.
    pub fn observe(&mut self, input: &DecisionInput) -> HistoryEntry {
        let entry = HistoryEntry {
            kind: input.kind.as_str().to_string(),
            priority: input.priority.as_str().to_string(),
            at: chrono::Utc::now(),
        };
        if self.recent_history.len() == CONTEXT_HISTORY_CAP {
            self.recent_history.pop_front();
        }
        self.recent_history.push_back(entry.clone());
        entry
    }

    /// Historical-pattern lookup for an input kind. Empty history gives
    /// `None`.
    #[must_use]
    pub fn pattern_for(&self, kind: &str) -> Option<PatternSummary> {
        let mut occurrences = 0;
        let mut last_seen = None;
        for entry in &self.recent_history {
            if entry.kind == kind {
                occurrences += 1;
                last_seen = Some(entry.at);
            }
        }
        last_seen.map(|last_seen| PatternSummary {
            occurrences,
            last_seen,
        })
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.recent_history.len()
    }

    #[must_use]
    pub fn carrier(&self, carrier_id: &str) -> Option<&CarrierMetrics> {
        self.carrier_performance.get(carrier_id)
    }

    #[must_use]
    pub fn customer(&self, customer_id: &str) -> Option<&CustomerPrefs> {
        self.customer_preferences.get(customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputKind, Priority};

    #[test]
    fn history_is_capped_fifo() {
        let mut ctx = DecisionContext::new();
        for i in 0..(CONTEXT_HISTORY_CAP + 25) {
            let kind = if i % 2 == 0 {
                InputKind::Shipment
            } else {
                InputKind::Financial
            };
            ctx.observe(&DecisionInput::new(kind, Priority::Low));
        }
        assert_eq!(ctx.history_len(), CONTEXT_HISTORY_CAP);
    }

    #[test]
    fn pattern_lookup_counts_matching_kind() {
        let mut ctx = DecisionContext::new();
        ctx.observe(&DecisionInput::new(InputKind::Shipment, Priority::Low));
        ctx.observe(&DecisionInput::new(InputKind::Shipment, Priority::High));
        ctx.observe(&DecisionInput::new(InputKind::Analytics, Priority::Low));

        let pattern = ctx.pattern_for("shipment").unwrap();
        assert_eq!(pattern.occurrences, 2);
        assert!(ctx.pattern_for("financial").is_none());
    }

    #[test]
    fn reload_trims_oversized_history() {
        let mut ctx = DecisionContext::new();
        let history: Vec<_> = (0..150)
            .map(|_| HistoryEntry {
                kind: "shipment".to_string(),
                priority: "low".to_string(),
                at: chrono::Utc::now(),
            })
            .collect();
        ctx.reload(history, HashMap::new(), HashMap::new());
        assert_eq!(ctx.history_len(), CONTEXT_HISTORY_CAP);
    }
}
