//! Negative tests - failure modes of the incident controller

use ocp_store::{IncidentLevel, StatusStore};
use ocp_test_utils::{critical_report, incident_report, seeded_store};
use ops_kernel::{ControllerConfig, IncidentController};
use std::time::Duration;

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        resume_propagation_delay: Duration::from_millis(10),
        ..ControllerConfig::default()
    }
}

#[tokio::test]
async fn handler_level_store_failure_propagates() {
    let store = seeded_store().await;
    store.fail_on("save_incident");
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let err = controller
        .handle_incident(incident_report(IncidentLevel::Low, "slow_query"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("injected fault"));
}

#[tokio::test]
async fn resume_verification_failure_reports_not_success() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());
    let incident = controller.handle_incident(critical_report()).await.unwrap();

    // The status read-back inside resume fails.
    store.fail_on("system_status");
    let outcome = controller.resume(incident.id).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("injected fault"));
    store.clear_fault("system_status");

    // A later resume attempt still works; stop and resume are idempotent
    // against the store.
    let outcome = controller.resume(incident.id).await.unwrap();
    assert!(outcome.success);
    assert!(store.system_status().await.unwrap().is_running);
}

#[tokio::test]
async fn alert_failure_does_not_abort_playbook() {
    let store = seeded_store().await;
    store.fail_on("post_notification");
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();

    let alert = incident
        .actions
        .iter()
        .find(|a| a.kind == ops_kernel::ResponseAction::Alert)
        .expect("alert attempted");
    assert!(!alert.success);

    // The stop itself still landed.
    assert!(incident.actions[0].success);
    assert!(!store.system_status().await.unwrap().is_running);
}

#[tokio::test]
async fn action_timeout_is_a_failed_action_not_a_hang() {
    let store = seeded_store().await;
    // The note write takes far longer than the action budget allows.
    store.delay_op("append_incident_note", Duration::from_millis(500));
    let config = ControllerConfig {
        action_timeout: Duration::from_millis(50),
        resume_propagation_delay: Duration::from_millis(10),
        ..ControllerConfig::default()
    };
    let controller = IncidentController::with_config(store, config);

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::Low, "slow_query"))
        .await
        .unwrap();

    let log = &incident.actions[0];
    assert!(!log.success);
    assert!(log.error.as_deref().unwrap().contains("timed out"));
}
