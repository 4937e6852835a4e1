//! Append-only decision audit log
//!
//! Every decision the engine makes is chained into this log with a SHA-256
//! hash over the record plus the previous entry's hash, so tampering or
//! reordering is detectable after the fact.

use crate::error::{StoreError, StoreResult};
use crate::records::DecisionRecord;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One chained entry in the decision audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditChainEntry {
    pub record: DecisionRecord,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// Hash-chained, append-only log of decision records
#[derive(Debug, Default)]
pub struct DecisionAuditLog {
    inner: Mutex<Vec<AuditChainEntry>>,
}

impl DecisionAuditLog {
    /// Append a record, chaining it to the current tail. Returns the new
    /// entry's hash.
    pub fn append(&self, record: DecisionRecord) -> [u8; 32] {
        let mut guard = self.inner.lock();
        let prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        let hash = compute_hash(&record, &prev_hash);
        guard.push(AuditChainEntry {
            record,
            prev_hash,
            hash,
        });
        hash
    }

    /// Most recent records, newest last.
    pub fn recent(&self, limit: usize) -> Vec<DecisionRecord> {
        let guard = self.inner.lock();
        let skip = guard.len().saturating_sub(limit);
        guard.iter().skip(skip).map(|e| e.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Walk the chain and verify every link.
    pub fn verify_integrity(&self) -> StoreResult<()> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for (idx, entry) in guard.iter().enumerate() {
            if entry.prev_hash != prev {
                return Err(StoreError::IntegrityViolation(idx));
            }
            let expected = compute_hash(&entry.record, &entry.prev_hash);
            if entry.hash != expected {
                return Err(StoreError::IntegrityViolation(idx));
            }
            prev = entry.hash;
        }
        Ok(())
    }

}

fn compute_hash(record: &DecisionRecord, prev_hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(record.kind.as_bytes());
    hasher.update([0]);
    hasher.update(record.priority.as_bytes());
    hasher.update([0]);
    hasher.update(record.action.as_bytes());
    hasher.update([0]);
    hasher.update(record.confidence.to_le_bytes());
    hasher.update(record.reasoning.as_bytes());
    hasher.update([0]);
    hasher.update(record.impact.as_bytes());
    hasher.update([record.requires_review as u8]);
    hasher.update(record.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(prev_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(action: &str, confidence: f64) -> DecisionRecord {
        DecisionRecord {
            kind: "shipment".to_string(),
            priority: "high".to_string(),
            action: action.to_string(),
            confidence,
            reasoning: "test".to_string(),
            impact: "medium".to_string(),
            requires_review: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn chain_links_to_previous_entry() {
        let log = DecisionAuditLog::default();
        let first = log.append(record("auto_assign_carrier", 0.8));
        log.append(record("optimize_route", 0.7));

        let entries = log.recent(10);
        assert_eq!(entries.len(), 2);
        assert!(log.verify_integrity().is_ok());

        // Second entry must chain to the first hash.
        let guard = log.inner.lock();
        assert_eq!(guard[1].prev_hash, first);
    }

    #[test]
    fn verify_detects_mutated_record() {
        let log = DecisionAuditLog::default();
        log.append(record("auto_assign_carrier", 0.8));
        log.append(record("optimize_route", 0.7));

        {
            let mut guard = log.inner.lock();
            guard[0].record.action = "something_else".to_string();
        }

        match log.verify_integrity() {
            Err(StoreError::IntegrityViolation(0)) => {}
            other => panic!("expected violation at 0, got {other:?}"),
        }
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let log = DecisionAuditLog::default();
        for i in 0..5 {
            log.append(record(&format!("action_{i}"), 0.5));
        }
        let tail = log.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].action, "action_3");
        assert_eq!(tail[1].action, "action_4");
    }
}
