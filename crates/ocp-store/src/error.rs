//! Error types for the store adapter seam

/// Errors surfaced by a persisted-store adapter
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Requested record does not exist
    #[error("record not found: {0}")]
    NotFound(String),

    /// Write conflicted with concurrent state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Append-only log failed its hash-chain verification
    #[error("audit log integrity violation at entry {0}")]
    IntegrityViolation(usize),

    /// Backend failure (network, driver, injected fault)
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Convenience alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound("incident 42".to_string());
        assert!(err.to_string().contains("not found"));

        let err = StoreError::IntegrityViolation(7);
        assert!(err.to_string().contains('7'));
    }
}
