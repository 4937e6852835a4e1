//! Incident controller integration tests
//!
//! Full playbook runs against a seeded in-memory store.

use ocp_store::{
    ControlStore, FlagStore, IncidentLevel, IncidentStatus, IncidentStore, MemoryStore,
    MonitoringLevel, NotificationStore, ResourceAllocation, ResponseAction, RunState, StatusStore,
    CANARY_FLAGS,
};
use ocp_test_utils::{critical_report, incident_report, seeded_store};
use ops_kernel::{ControllerConfig, IncidentController, ResponsePhase};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        resume_propagation_delay: Duration::from_millis(10),
        ..ControllerConfig::default()
    }
}

#[tokio::test]
async fn critical_incident_stops_the_system() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();

    assert_eq!(incident.status, IncidentStatus::Active);
    assert_eq!(incident.actions.len(), 4);
    assert_eq!(incident.actions[0].kind, ResponseAction::EmergencyStop);
    assert!(incident.actions[0].success);
    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Stopped));

    let status = store.system_status().await.unwrap();
    assert!(!status.is_running);
    assert!(status.emergency_stop_active);
    assert_eq!(store.count_agents(RunState::Running).await.unwrap(), 0);
    assert_eq!(store.count_workflows(RunState::Running).await.unwrap(), 0);

    let alerts = store.notifications_of_kind("incident_alert").await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].channel, "#ops-critical");
}

#[tokio::test]
async fn high_incident_degrades_gracefully() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::High, "latency_spike"))
        .await
        .unwrap();

    assert_eq!(incident.actions[0].kind, ResponseAction::SoftDegrade);
    assert!(incident.actions[0].success);
    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Degraded));

    let settings = store.control_settings().await.unwrap();
    assert_eq!(settings.max_concurrency, 50);
    assert!(!settings.dlq_processing_enabled);
    assert_eq!(settings.resource_allocation, ResourceAllocation::Minimal);
    assert_eq!(settings.service_throttle_pct, 50);
    assert_eq!(settings.monitoring_level, MonitoringLevel::Elevated);

    for key in CANARY_FLAGS {
        let value = store.flag(key).await.unwrap();
        assert_eq!(value, Some(serde_json::json!("SAFE")), "flag {key}");
    }

    // Soft degrade does not stop the system.
    let status = store.system_status().await.unwrap();
    assert!(status.is_running);
}

#[tokio::test]
async fn medium_incident_raises_monitoring_and_stages_rollback() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::Medium, "error_budget_burn"))
        .await
        .unwrap();

    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Monitoring));
    assert!(incident.actions.iter().all(|a| a.success));
    assert!(incident
        .actions
        .iter()
        .any(|a| a.kind == ResponseAction::PrepareRollback));

    let settings = store.control_settings().await.unwrap();
    assert_eq!(settings.monitoring_level, MonitoringLevel::Intensive);
}

#[tokio::test]
async fn low_incident_logs_and_monitors() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::Low, "slow_query"))
        .await
        .unwrap();

    assert_eq!(incident.actions.len(), 2);
    assert_eq!(incident.actions[0].kind, ResponseAction::LogIncident);
    assert!(incident.actions.iter().all(|a| a.success));
    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Monitoring));
}

#[tokio::test]
async fn failed_emergency_stop_is_recorded_not_thrown() {
    let store = seeded_store().await;
    store.fail_on("transition_agents");
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();

    let stop = &incident.actions[0];
    assert_eq!(stop.kind, ResponseAction::EmergencyStop);
    assert!(!stop.success);
    assert!(stop.error.as_deref().unwrap().contains("injected fault"));

    // The playbook continued past the failed lever.
    assert_eq!(incident.actions.len(), 4);
    // No stop means no phase change.
    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Running));
}

#[tokio::test]
async fn partial_soft_degrade_reports_sub_step_booleans() {
    let store = seeded_store().await;
    store.fail_on("set_canary_flags_safe");
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::High, "latency_spike"))
        .await
        .unwrap();

    let degrade = &incident.actions[0];
    assert!(!degrade.success);
    assert_eq!(degrade.details["concurrency_reduced"], true);
    assert_eq!(degrade.details["canary_flags_safe"], false);
    assert_eq!(degrade.details["resources_reduced"], true);

    // Partial degrade is kept, not reverted.
    let settings = store.control_settings().await.unwrap();
    assert_eq!(settings.max_concurrency, 50);
}

#[tokio::test]
async fn resume_resolves_incident_with_duration() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();
    let outcome = controller.resume(incident.id).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.system_running);

    let resolved = store
        .incident(incident.id)
        .await
        .unwrap()
        .expect("incident persisted");
    assert_eq!(resolved.status, IncidentStatus::Resolved);
    let resolution = resolved.resolution.expect("resolution recorded");
    assert_eq!(resolution.method, "manual_resume");
    assert_eq!(controller.phase(incident.id), Some(ResponsePhase::Resolved));

    let status = store.system_status().await.unwrap();
    assert!(status.is_running);
    assert_eq!(store.count_agents(RunState::Running).await.unwrap(), 4);
}

#[tokio::test]
async fn resume_unknown_incident_is_not_found() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store, fast_config());

    let err = controller
        .resume(ops_kernel::IncidentId::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn rollback_reverts_to_last_good_deployment() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store.clone(), fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();
    let result = controller.rollback(incident.id).await.unwrap();

    assert!(result.success);
    assert_eq!(result.details["reverted_to"], "deploy-042");
    assert_eq!(
        controller.phase(incident.id),
        Some(ResponsePhase::RollingBack)
    );

    let posts = store
        .notifications_of_kind("rollback_completed")
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);

    // The system can resume after a rollback.
    let outcome = controller.resume(incident.id).await.unwrap();
    assert!(outcome.success);
}

#[tokio::test]
async fn rollback_without_good_deployment_fails_loudly() {
    // Unseeded store: no deployments at all.
    let store = Arc::new(MemoryStore::new());
    store.add_agent("agent-1");
    let controller = IncidentController::with_config(store, fast_config());

    let incident = controller.handle_incident(critical_report()).await.unwrap();
    let result = controller.rollback(incident.id).await.unwrap();

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("no last known good deployment"));
}

#[tokio::test]
async fn rollback_requires_stopped_system() {
    let store = seeded_store().await;
    let controller = IncidentController::with_config(store, fast_config());

    let incident = controller
        .handle_incident(incident_report(IncidentLevel::Medium, "error_budget_burn"))
        .await
        .unwrap();

    // Monitoring phase: rollback is not a legal transition.
    let err = controller.rollback(incident.id).await.unwrap_err();
    assert!(err.to_string().contains("illegal response transition"));
}

#[tokio::test]
async fn concurrent_incidents_serialize_the_kill_switch() {
    let store = seeded_store().await;
    let controller = Arc::new(IncidentController::with_config(store.clone(), fast_config()));

    let (a, b) = tokio::join!(
        controller.handle_incident(critical_report()),
        controller.handle_incident(critical_report()),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // Both stops complete without racing the flag.
    assert!(a.actions[0].success);
    assert!(b.actions[0].success);

    let status = store.system_status().await.unwrap();
    assert!(status.emergency_stop_active);
    assert!(!status.is_running);
    assert_eq!(controller.active_incidents().len(), 2);
}
