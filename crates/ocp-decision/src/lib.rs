//! OCP decision engine
//!
//! Scores and selects automated actions for incoming operational events.
//! Every decision carries a confidence in `[0, 1]` and a human-review gate;
//! the engine absorbs its own failures into a safe escalation decision
//! rather than surfacing errors to callers.

pub mod context;
pub mod engine;
pub mod error;
pub mod history;
pub mod options;
pub mod types;

pub use context::{DecisionContext, CONTEXT_HISTORY_CAP};
pub use engine::{DecisionEngine, REVIEW_CONFIDENCE_FLOOR};
pub use error::DecisionError;
pub use history::{LearningState, HISTORY_CAP, HISTORY_TRIM_TO, ROLLING_WINDOW};
pub use options::{GeneratorRegistry, OptionGenerator};
pub use types::*;
