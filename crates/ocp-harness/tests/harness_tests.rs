//! Acceptance harness integration tests
//!
//! The full battery against seeded stores, on both the green path and the
//! fault-injected failure paths.

use ocp_harness::{AcceptanceHarness, HarnessConfig};
use ocp_store::{AuditStore, EvidencePack, MemoryStore};
use ocp_test_utils::{passing_evidence_pack, seeded_store, write_todays_evidence_pack};
use ops_kernel::{ControllerConfig, IncidentController};
use std::sync::Arc;
use std::time::Duration;

fn fast_controller(store: Arc<MemoryStore>) -> Arc<IncidentController> {
    Arc::new(IncidentController::with_config(
        store,
        ControllerConfig {
            resume_propagation_delay: Duration::from_millis(10),
            ..ControllerConfig::default()
        },
    ))
}

async fn harness_with(
    store: Arc<MemoryStore>,
    evidence_dir: &std::path::Path,
    artifacts_dir: &std::path::Path,
) -> AcceptanceHarness {
    let controller = fast_controller(store.clone());
    AcceptanceHarness::new(
        store,
        controller,
        HarnessConfig::fast(evidence_dir.to_path_buf(), artifacts_dir.to_path_buf()),
    )
}

#[tokio::test]
async fn full_battery_passes_on_healthy_system() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(dir.path(), &passing_evidence_pack());

    let harness = harness_with(store.clone(), dir.path(), dir.path()).await;
    let report = harness.run().await;

    assert!(
        report.passed(),
        "expected full pass, got: {}",
        report.generate_text()
    );
    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.passed, 5);

    let names: Vec<&str> = report.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "synthetic_task_runs",
            "forced_error_test",
            "rls_verification",
            "kill_switch_test",
            "evidence_pack_validation",
        ]
    );

    // Report artifact plus persisted summary record.
    let path = harness.persist_report(&report).await.unwrap();
    assert!(path.exists());
    let body = std::fs::read_to_string(path).unwrap();
    assert!(body.contains("synthetic_task_runs"));
}

#[tokio::test]
async fn missing_evidence_pack_fails_with_does_not_exist() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    // No evidence pack written.

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    assert!(!report.passed());
    let evidence = report
        .tests
        .iter()
        .find(|t| t.name == "evidence_pack_validation")
        .unwrap();
    assert!(!evidence.passed);
    assert!(evidence.error.as_deref().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn sub_threshold_uptime_names_the_metric() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(
        dir.path(),
        &EvidencePack {
            uptime: 0.9994,
            success_rate: 0.99,
            p95_response_time: 1200.0,
        },
    );

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    let evidence = report
        .tests
        .iter()
        .find(|t| t.name == "evidence_pack_validation")
        .unwrap();
    assert!(!evidence.passed);
    assert!(evidence.error.as_deref().unwrap().contains("Uptime"));
}

#[tokio::test]
async fn leaky_tenant_store_fails_isolation_probe() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(dir.path(), &passing_evidence_pack());
    store.set_tenant_isolation(false);

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    let rls = report
        .tests
        .iter()
        .find(|t| t.name == "rls_verification")
        .unwrap();
    assert!(!rls.passed);
    assert!(rls
        .error
        .as_deref()
        .unwrap()
        .contains("tenant isolation breached"));
}

#[tokio::test]
async fn suppressed_error_pipeline_fails_forced_error_test() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(dir.path(), &passing_evidence_pack());
    store.set_error_pipeline(false);

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    let forced = report
        .tests
        .iter()
        .find(|t| t.name == "forced_error_test")
        .unwrap();
    assert!(!forced.passed);
    assert!(forced.error.as_deref().unwrap().contains("confirmations"));
}

#[tokio::test]
async fn wedged_kill_switch_fails_cycle_test() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(dir.path(), &passing_evidence_pack());
    // The flag write is wedged, so the stop can never land.
    store.fail_on("compare_and_swap_flag");

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    let kill_switch = report
        .tests
        .iter()
        .find(|t| t.name == "kill_switch_test")
        .unwrap();
    assert!(!kill_switch.passed);
}

#[tokio::test]
async fn one_failed_test_fails_the_whole_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    // Everything healthy except evidence.

    let harness = harness_with(store, dir.path(), dir.path()).await;
    let report = harness.run().await;

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.passed, 4);
    assert!(!report.passed());
}

#[tokio::test]
async fn persisted_summary_reaches_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store().await;
    write_todays_evidence_pack(dir.path(), &passing_evidence_pack());

    let harness = harness_with(store.clone(), dir.path(), dir.path()).await;
    let report = harness.run().await;
    harness.persist_report(&report).await.unwrap();

    let summaries = store.acceptance_summaries().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total, 5);
    assert_eq!(summaries[0].passed, report.summary.passed);
}
