//! Harness errors
//!
//! Assertion mismatches and unexpected failures alike are folded into
//! failed `TestResult`s; these types carry the message that ends up there.

use ocp_store::StoreError;
use ops_kernel::IncidentError;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// An asserted fact did not hold
    #[error("{0}")]
    Assertion(String),

    /// Evidence pack missing or failing thresholds
    #[error("{0}")]
    Evidence(String),

    /// Store adapter failure during a test
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Incident controller failure during a test
    #[error("incident error: {0}")]
    Incident(#[from] IncidentError),

    /// Report artifact could not be written
    #[error("report io error: {0}")]
    Io(#[from] std::io::Error),
}
