//! The acceptance battery
//!
//! Five tests, run sequentially inside a bounded budget, each internally
//! timed and error-absorbed into a failed result: synthetic tasks end to
//! end, forced error handling, tenant isolation probes, kill-switch
//! cycling, and evidence-pack validation.

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::evidence;
use crate::report::{RunReport, TestResult};
use ocp_store::{
    AuditStore, DlqStore, FaultStore, ForcedError, HealthStore, IncidentLevel, IncidentReport,
    NotificationStore, OpsStore, StatusStore, SyntheticTask, TaskEvent, TaskId, TaskStore,
    TenantStore, TraceStore,
};
use ops_kernel::IncidentController;
use rand::Rng;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct TaskRun {
    task_id: TaskId,
    task_number: u32,
    duration_ms: u64,
}

/// Orchestrates the acceptance battery against a store and controller.
pub struct AcceptanceHarness {
    store: Arc<dyn OpsStore>,
    controller: Arc<IncidentController>,
    config: HarnessConfig,
}

impl AcceptanceHarness {
    #[must_use]
    pub fn new(
        store: Arc<dyn OpsStore>,
        controller: Arc<IncidentController>,
        config: HarnessConfig,
    ) -> Self {
        Self {
            store,
            controller,
            config,
        }
    }

    /// Run the full battery. Always returns a report; failures live in the
    /// per-test results, never as errors from this method.
    pub async fn run(&self) -> RunReport {
        tracing::info!(
            budget_secs = self.config.run_budget.as_secs(),
            "starting acceptance run"
        );
        let started = Instant::now();
        let mut tests = Vec::with_capacity(5);

        tests.push(
            self.run_test(
                "synthetic_task_runs",
                self.config.synthetic_task_timeout,
                self.synthetic_task_test(),
            )
            .await,
        );
        tests.push(
            self.run_test(
                "forced_error_test",
                self.config.error_test_timeout,
                self.forced_error_test(),
            )
            .await,
        );
        tests.push(
            self.run_test(
                "rls_verification",
                self.config.rls_test_timeout,
                self.rls_verification_test(),
            )
            .await,
        );
        tests.push(
            self.run_test(
                "kill_switch_test",
                self.config.kill_switch_timeout,
                self.kill_switch_test(),
            )
            .await,
        );
        tests.push(
            self.run_test(
                "evidence_pack_validation",
                self.config.evidence_timeout,
                self.evidence_pack_test(),
            )
            .await,
        );

        let report = RunReport::new(tests, started.elapsed());
        tracing::info!(
            passed = report.summary.passed,
            failed = report.summary.failed,
            duration_ms = report.summary.duration_ms,
            "acceptance run finished"
        );
        report
    }

    /// Write the dated report artifact and persist the summary record.
    /// Returns the artifact path.
    pub async fn persist_report(&self, report: &RunReport) -> Result<PathBuf, HarnessError> {
        std::fs::create_dir_all(&self.config.artifacts_dir)?;
        let date = report.timestamp.format("%Y-%m-%d");
        let path = self
            .config
            .artifacts_dir
            .join(format!("acceptance-test-{date}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(report).map_err(std::io::Error::from)?)?;

        self.store.save_acceptance_summary(report.to_summary()).await?;
        Ok(path)
    }

    async fn run_test<F>(&self, name: &str, budget: Duration, fut: F) -> TestResult
    where
        F: Future<Output = Result<serde_json::Value, HarnessError>>,
    {
        tracing::info!(test = name, "running acceptance test");
        let started = Instant::now();
        match tokio::time::timeout(budget, fut).await {
            Ok(Ok(details)) => {
                let elapsed = started.elapsed();
                tracing::info!(test = name, duration_ms = elapsed.as_millis() as u64, "test passed");
                TestResult::passed(name, elapsed, details)
            }
            Ok(Err(e)) => {
                let elapsed = started.elapsed();
                tracing::warn!(test = name, error = %e, "test failed");
                TestResult::failed(name, elapsed, e.to_string())
            }
            Err(_) => {
                let elapsed = started.elapsed();
                tracing::warn!(test = name, "test timed out");
                TestResult::failed(
                    name,
                    elapsed,
                    format!("{name} timed out after {}s", budget.as_secs()),
                )
            }
        }
    }

    /// Test 1: synthetic tasks run end to end and leave a complete trace:
    /// live-feed projection, trace span, and a full audit trail.
    async fn synthetic_task_test(&self) -> Result<serde_json::Value, HarnessError> {
        let numbers: Vec<u32> = (1..=self.config.synthetic_task_count as u32).collect();
        let mut runs: Vec<TaskRun> = Vec::with_capacity(numbers.len());

        for chunk in numbers.chunks(self.config.synthetic_task_parallelism.max(1)) {
            let batch = futures::future::join_all(
                chunk.iter().map(|&n| self.run_synthetic_task(n)),
            )
            .await;
            for run in batch {
                runs.push(run?);
            }
        }

        for run in &runs {
            let feed = self.store.live_feed_entry(run.task_id).await?.is_some();
            let span = self.store.span_for_task(run.task_id).await?.is_some();
            let events: Vec<TaskEvent> = self
                .store
                .audit_trail(run.task_id)
                .await?
                .into_iter()
                .map(|e| e.event)
                .collect();
            let audit_complete = [
                TaskEvent::TaskCreated,
                TaskEvent::TaskStarted,
                TaskEvent::TaskCompleted,
            ]
            .iter()
            .all(|required| events.contains(required));

            if !feed || !span || !audit_complete {
                return Err(HarnessError::Assertion(format!(
                    "synthetic task {} incomplete trace: live_feed={feed}, span={span}, \
                     audit_complete={audit_complete}",
                    run.task_number
                )));
            }
        }

        let average_ms = if runs.is_empty() {
            0
        } else {
            runs.iter().map(|r| r.duration_ms).sum::<u64>() / runs.len() as u64
        };
        Ok(json!({
            "tasks_run": runs.len(),
            "all_successful": true,
            "average_task_duration_ms": average_ms,
        }))
    }

    async fn run_synthetic_task(&self, task_number: u32) -> Result<TaskRun, HarnessError> {
        let started = Instant::now();
        let task = SyntheticTask::new(task_number, "acceptance_test");
        let task_id = task.id;

        self.store.create_task(task).await?;
        self.store.start_task(task_id).await?;

        // Simulated execution with jitter, in place of real work.
        let jitter_max = self.config.task_execution_jitter.as_millis() as u64;
        let jitter = if jitter_max == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_max)
        };
        tokio::time::sleep(self.config.task_execution_delay + Duration::from_millis(jitter)).await;

        self.store.complete_task(task_id).await?;
        Ok(TaskRun {
            task_id,
            task_number,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Test 2: every injected error produces a notification, a trace link,
    /// and a DLQ entry.
    async fn forced_error_test(&self) -> Result<serde_json::Value, HarnessError> {
        let mut notified = 0;
        for error_number in 1..=self.config.error_test_count as u32 {
            let error = ForcedError {
                id: ocp_store::ErrorId::new(),
                error_number,
                kind: "acceptance_test_error".to_string(),
                severity: "high".to_string(),
                created_at: chrono::Utc::now(),
            };
            let error_id = error.id;
            self.store.record_forced_error(error).await?;

            let notifications = self.store.notifications_for_error(error_id).await?;
            let trace = self.store.trace_link_for_error(error_id).await?;
            let dlq = self.store.dlq_entry_for_error(error_id).await?;

            let notification_ok = notifications.iter().any(|n| !n.channel.is_empty());
            let trace_ok = trace.map(|t| !t.deep_link.is_empty()).unwrap_or(false);
            let dlq_ok = dlq.is_some();
            if !notification_ok || !trace_ok || !dlq_ok {
                return Err(HarnessError::Assertion(format!(
                    "forced error {error_number} missing confirmations: notification={notification_ok}, \
                     trace={trace_ok}, dlq={dlq_ok}"
                )));
            }
            notified += 1;
        }

        Ok(json!({
            "errors_triggered": self.config.error_test_count,
            "all_notified": notified == self.config.error_test_count,
        }))
    }

    /// Test 3: cross-tenant reads scoped under the probing tenant must
    /// return exactly zero rows, every attempt, every trial.
    async fn rls_verification_test(&self) -> Result<serde_json::Value, HarnessError> {
        let mut total_attempts = 0usize;
        for trial in 1..=self.config.rls_trials {
            for attempt in 1..=self.config.rls_attempts_per_trial {
                let rows = self.store.tenant_rows("tenant_a", "tenant_b").await?;
                total_attempts += 1;
                if !rows.is_empty() {
                    return Err(HarnessError::Assertion(format!(
                        "tenant isolation breached: trial {trial} attempt {attempt} read {} \
                         cross-tenant rows",
                        rows.len()
                    )));
                }
            }
        }

        Ok(json!({
            "trials": self.config.rls_trials,
            "attempts": total_attempts,
            "cross_reads_blocked": true,
        }))
    }

    /// Test 4: the kill-switch cycles cleanly: stop drops `is_running`,
    /// resume restores it, and the data-integrity record stays consistent.
    async fn kill_switch_test(&self) -> Result<serde_json::Value, HarnessError> {
        let mut stop_ms = Vec::new();
        let mut resume_ms = Vec::new();

        for cycle in 1..=self.config.kill_switch_cycles {
            let status = self.store.system_status().await?;
            if !status.is_running {
                return Err(HarnessError::Assertion(format!(
                    "system not running before kill-switch cycle {cycle}"
                )));
            }

            let stop_started = Instant::now();
            let incident = self
                .controller
                .handle_incident(IncidentReport {
                    level: IncidentLevel::Critical,
                    kind: "kill_switch_drill".to_string(),
                    description: format!("acceptance kill-switch cycle {cycle}"),
                    source: Some("acceptance_harness".to_string()),
                })
                .await?;
            stop_ms.push(stop_started.elapsed().as_millis() as u64);

            let status = self.store.system_status().await?;
            if status.is_running {
                return Err(HarnessError::Assertion(format!(
                    "system still running after emergency stop in cycle {cycle}"
                )));
            }

            let resume_started = Instant::now();
            let outcome = self.controller.resume(incident.id).await?;
            resume_ms.push(resume_started.elapsed().as_millis() as u64);
            if !outcome.success {
                return Err(HarnessError::Assertion(format!(
                    "resume failed in cycle {cycle}: {}",
                    outcome.error.unwrap_or_else(|| "unknown".to_string())
                )));
            }

            tokio::time::sleep(self.config.propagation_wait).await;
            let status = self.store.system_status().await?;
            if !status.is_running {
                return Err(HarnessError::Assertion(format!(
                    "system not running after resume in cycle {cycle}"
                )));
            }

            let integrity = self
                .store
                .latest_integrity_check()
                .await?
                .map(|c| c.is_consistent)
                .unwrap_or(false);
            if !integrity {
                return Err(HarnessError::Assertion(format!(
                    "data integrity inconsistent after cycle {cycle}"
                )));
            }
        }

        let avg = |values: &[u64]| {
            if values.is_empty() {
                0
            } else {
                values.iter().sum::<u64>() / values.len() as u64
            }
        };
        Ok(json!({
            "cycles_completed": self.config.kill_switch_cycles,
            "all_clean": true,
            "average_stop_ms": avg(&stop_ms),
            "average_resume_ms": avg(&resume_ms),
        }))
    }

    /// Test 5: today's evidence pack exists and clears every threshold.
    async fn evidence_pack_test(&self) -> Result<serde_json::Value, HarnessError> {
        let pack = evidence::load_todays_pack(&self.config.evidence_dir)?;
        let report = evidence::check_thresholds(&pack, &self.config.thresholds);
        if !report.passed {
            return Err(HarnessError::Evidence(format!(
                "evidence thresholds not met: {}",
                report.failures.join(", ")
            )));
        }

        Ok(json!({
            "evidence_exists": true,
            "thresholds_passed": true,
            "uptime": pack.uptime,
            "success_rate": pack.success_rate,
            "p95_response_time_ms": pack.p95_response_time,
        }))
    }
}
