//! Rolling decision history and the learning-rate scalar
//!
//! Every decision lands in a bounded ledger; the rolling average of recent
//! confidences nudges a learning-rate scalar up or down. The scalar is a
//! published tunable for future scoring, not an input to today's pipeline.

use crate::types::{Decision, DecisionAction};
use chrono::{DateTime, Utc};

/// Hard cap on retained decisions.
pub const HISTORY_CAP: usize = 1000;

/// Size the ledger trims down to when the cap is hit.
pub const HISTORY_TRIM_TO: usize = 500;

/// Window for the rolling confidence average.
pub const ROLLING_WINDOW: usize = 100;

const RATE_STEP: f64 = 0.05;
const HIGH_CONFIDENCE_AVG: f64 = 0.8;
const LOW_CONFIDENCE_AVG: f64 = 0.6;

/// Compact ledger entry for one past decision
#[derive(Debug, Clone)]
pub struct RecordedDecision {
    pub action: DecisionAction,
    pub confidence: f64,
    pub at: DateTime<Utc>,
}

/// Bounded decision ledger plus the learning-rate scalar it drives
#[derive(Debug)]
pub struct LearningState {
    entries: Vec<RecordedDecision>,
    learning_rate: f64,
}

impl LearningState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            learning_rate: 1.0,
        }
    }

    /// Record a decision and adjust the learning rate from the rolling
    /// average: consistently confident decisions decay it 5%, consistently
    /// uncertain ones grow it 5%.
    pub fn record(&mut self, decision: &Decision) {
        self.entries.push(RecordedDecision {
            action: decision.action,
            confidence: decision.confidence,
            at: decision.decided_at,
        });
        if self.entries.len() > HISTORY_CAP {
            let excess = self.entries.len() - HISTORY_TRIM_TO;
            self.entries.drain(..excess);
        }

        if let Some(avg) = self.rolling_average(ROLLING_WINDOW) {
            if avg > HIGH_CONFIDENCE_AVG {
                self.learning_rate *= 1.0 - RATE_STEP;
            } else if avg < LOW_CONFIDENCE_AVG {
                self.learning_rate *= 1.0 + RATE_STEP;
            }
        }
    }

    /// Average confidence over the most recent `window` entries.
    #[must_use]
    pub fn rolling_average(&self, window: usize) -> Option<f64> {
        if self.entries.is_empty() || window == 0 {
            return None;
        }
        let skip = self.entries.len().saturating_sub(window);
        let tail = &self.entries[skip..];
        Some(tail.iter().map(|e| e.confidence).sum::<f64>() / tail.len() as f64)
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LearningState {
    fn default() -> Self {
        Self::new()
    }
}
