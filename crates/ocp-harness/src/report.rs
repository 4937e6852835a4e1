//! Acceptance run report

use chrono::{DateTime, Utc};
use ocp_store::AcceptanceSummary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one acceptance test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    #[must_use]
    pub fn passed(name: &str, duration: Duration, details: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            duration_ms: duration.as_millis() as u64,
            details,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(name: &str, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            duration_ms: duration.as_millis() as u64,
            details: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

/// Aggregate counters for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Full report for one acceptance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub tests: Vec<TestResult>,
    pub summary: RunSummary,
}

impl RunReport {
    #[must_use]
    pub fn new(tests: Vec<TestResult>, duration: Duration) -> Self {
        let passed = tests.iter().filter(|t| t.passed).count();
        let failed = tests.len() - passed;
        Self {
            timestamp: Utc::now(),
            summary: RunSummary {
                total: tests.len(),
                passed,
                failed,
                duration_ms: duration.as_millis() as u64,
            },
            tests,
        }
    }

    /// True only when every test passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.total > 0
    }

    /// Console rendering of the report.
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Acceptance Test Summary\n");
        out.push_str("=======================\n");
        out.push_str(&format!("Total duration: {}ms\n", self.summary.duration_ms));
        out.push_str(&format!(
            "Passed: {}/{}\n",
            self.summary.passed, self.summary.total
        ));
        out.push_str(&format!(
            "Failed: {}/{}\n",
            self.summary.failed, self.summary.total
        ));
        for test in &self.tests {
            let status = if test.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "  [{status}] {}: {}ms\n",
                test.name, test.duration_ms
            ));
            if let Some(error) = &test.error {
                out.push_str(&format!("         {error}\n"));
            }
        }
        out
    }

    /// Persisted summary record for the store.
    #[must_use]
    pub fn to_summary(&self) -> AcceptanceSummary {
        AcceptanceSummary {
            timestamp: self.timestamp,
            total: self.summary.total,
            passed: self.summary.passed,
            failed: self.summary.failed,
            duration_ms: self.summary.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_pass_and_fail() {
        let report = RunReport::new(
            vec![
                TestResult::passed("a", Duration::from_millis(5), serde_json::Value::Null),
                TestResult::failed("b", Duration::from_millis(7), "boom"),
            ],
            Duration::from_millis(12),
        );
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 1);
        assert!(!report.passed());
    }

    #[test]
    fn text_rendering_names_failures() {
        let report = RunReport::new(
            vec![TestResult::failed("evidence", Duration::from_millis(1), "missing")],
            Duration::from_millis(1),
        );
        let text = report.generate_text();
        assert!(text.contains("[FAIL] evidence"));
        assert!(text.contains("missing"));
    }

    #[test]
    fn empty_run_does_not_pass() {
        let report = RunReport::new(vec![], Duration::from_millis(0));
        assert!(!report.passed());
    }
}
