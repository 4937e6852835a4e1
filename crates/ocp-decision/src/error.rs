//! Internal decision-engine errors
//!
//! These never reach the engine's caller; `make_decision` absorbs them
//! into the fallback decision with the error text in `reasoning`.

use ocp_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// Store adapter failure while refreshing context or auditing
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Anything else that went wrong inside the pipeline
    #[error("internal decision failure: {0}")]
    Internal(String),
}
