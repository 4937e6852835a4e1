//! Evidence pack validation
//!
//! The observability pipeline writes a dated SLO snapshot every day; the
//! harness locates today's file, parses it, and checks every threshold,
//! reporting an itemized list of misses.

use crate::config::Thresholds;
use crate::error::HarnessError;
use chrono::Utc;
use ocp_store::EvidencePack;
use std::path::{Path, PathBuf};

/// Path of today's snapshot under the evidence directory.
#[must_use]
pub fn todays_snapshot_path(evidence_dir: &Path) -> PathBuf {
    let date = Utc::now().date_naive().format("%Y-%m-%d");
    evidence_dir.join(date.to_string()).join("slo_snapshot.json")
}

/// Load today's evidence pack, failing when the artifact is absent.
pub fn load_todays_pack(evidence_dir: &Path) -> Result<EvidencePack, HarnessError> {
    let path = todays_snapshot_path(evidence_dir);
    if !path.exists() {
        return Err(HarnessError::Evidence(format!(
            "evidence pack for today does not exist: {}",
            path.display()
        )));
    }
    let body = std::fs::read_to_string(&path)?;
    serde_json::from_str(&body).map_err(|e| {
        HarnessError::Evidence(format!("evidence pack {} is malformed: {e}", path.display()))
    })
}

/// Outcome of comparing a pack against the thresholds
#[derive(Debug, Clone)]
pub struct ThresholdReport {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Compare a pack against the thresholds, itemizing every miss.
#[must_use]
pub fn check_thresholds(pack: &EvidencePack, thresholds: &Thresholds) -> ThresholdReport {
    let mut failures = Vec::new();

    if pack.uptime < thresholds.uptime {
        failures.push(format!("Uptime {} < {}", pack.uptime, thresholds.uptime));
    }
    if pack.success_rate < thresholds.success_rate {
        failures.push(format!(
            "Success rate {} < {}",
            pack.success_rate, thresholds.success_rate
        ));
    }
    if pack.p95_response_time > thresholds.p95_response_time {
        failures.push(format!(
            "Response time {} > {}",
            pack.p95_response_time, thresholds.p95_response_time
        ));
    }

    ThresholdReport {
        passed: failures.is_empty(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(uptime: f64, success_rate: f64, p95: f64) -> EvidencePack {
        EvidencePack {
            uptime,
            success_rate,
            p95_response_time: p95,
        }
    }

    #[test]
    fn passing_pack_has_no_failures() {
        let report = check_thresholds(&pack(0.9999, 0.99, 1200.0), &Thresholds::default());
        assert!(report.passed);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn uptime_miss_is_named() {
        let report = check_thresholds(&pack(0.9994, 0.99, 1200.0), &Thresholds::default());
        assert!(!report.passed);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("Uptime"));
    }

    #[test]
    fn every_miss_is_itemized() {
        let report = check_thresholds(&pack(0.5, 0.5, 9000.0), &Thresholds::default());
        assert_eq!(report.failures.len(), 3);
    }

    #[test]
    fn missing_pack_mentions_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_todays_pack(dir.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn pack_round_trips_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let date_dir = dir
            .path()
            .join(Utc::now().date_naive().format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&date_dir).unwrap();
        std::fs::write(
            date_dir.join("slo_snapshot.json"),
            r#"{"uptime":0.9996,"successRate":0.985,"p95ResponseTime":2100.0}"#,
        )
        .unwrap();

        let pack = load_todays_pack(dir.path()).unwrap();
        assert!(check_thresholds(&pack, &Thresholds::default()).passed);
    }
}
