//! Harness configuration

use std::path::PathBuf;
use std::time::Duration;

/// SLO thresholds the daily evidence pack must clear
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub uptime: f64,
    pub success_rate: f64,
    /// Milliseconds.
    pub p95_response_time: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            uptime: 0.9995,
            success_rate: 0.98,
            p95_response_time: 2500.0,
        }
    }
}

/// Counts, timeouts, and paths for one acceptance run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub synthetic_task_count: usize,
    /// Synthetic tasks in flight at once.
    pub synthetic_task_parallelism: usize,
    pub error_test_count: usize,
    pub rls_trials: usize,
    pub rls_attempts_per_trial: usize,
    pub kill_switch_cycles: usize,
    pub thresholds: Thresholds,

    pub synthetic_task_timeout: Duration,
    pub error_test_timeout: Duration,
    pub rls_test_timeout: Duration,
    pub kill_switch_timeout: Duration,
    pub evidence_timeout: Duration,
    /// Whole-battery budget; the run reports how much of it was used.
    pub run_budget: Duration,

    /// Simulated execution time per synthetic task, plus random jitter.
    pub task_execution_delay: Duration,
    pub task_execution_jitter: Duration,
    /// Extra wait after resume before re-reading system status.
    pub propagation_wait: Duration,

    pub evidence_dir: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            synthetic_task_count: 3,
            synthetic_task_parallelism: 3,
            error_test_count: 2,
            rls_trials: 5,
            rls_attempts_per_trial: 10,
            kill_switch_cycles: 3,
            thresholds: Thresholds::default(),
            synthetic_task_timeout: Duration::from_secs(60),
            error_test_timeout: Duration::from_secs(30),
            rls_test_timeout: Duration::from_secs(15),
            kill_switch_timeout: Duration::from_secs(30),
            evidence_timeout: Duration::from_secs(10),
            run_budget: Duration::from_secs(600),
            task_execution_delay: Duration::from_millis(200),
            task_execution_jitter: Duration::from_millis(300),
            propagation_wait: Duration::from_millis(500),
            evidence_dir: PathBuf::from("artifacts/green-posture"),
            artifacts_dir: PathBuf::from("artifacts/acceptance"),
        }
    }
}

impl HarnessConfig {
    /// Shrunk delays for test runs where wall-clock time matters.
    #[must_use]
    pub fn fast(evidence_dir: PathBuf, artifacts_dir: PathBuf) -> Self {
        Self {
            task_execution_delay: Duration::from_millis(10),
            task_execution_jitter: Duration::from_millis(10),
            propagation_wait: Duration::from_millis(10),
            evidence_dir,
            artifacts_dir,
            ..Self::default()
        }
    }
}
