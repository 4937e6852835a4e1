//! Testing utilities for the OCP workspace
//!
//! Shared fixtures: seeded in-memory stores, evidence-pack files, and
//! canned incident reports and decision inputs.

#![allow(missing_docs)]

use chrono::{NaiveDate, Utc};
use ocp_decision::{DecisionInput, InputKind, Priority};
use ocp_store::{
    CarrierMetrics, CustomerPrefs, DeployState, DeploymentRecord, EvidencePack, HealthStore,
    IncidentLevel, IncidentReport, IntegrityCheck, MemoryStore, TenantRow, TenantStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A store seeded like a healthy running deployment: a small fleet of
/// agents and workflows, a known-good deployment, consistent integrity
/// checks, tenant rows for two tenants, and decision context data.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    for i in 1..=3 {
        store.add_agent(format!("dispatch-agent-{i}"));
    }
    store.add_agent("billing-agent-1");
    for i in 1..=2 {
        store.add_workflow(format!("tender-workflow-{i}"));
    }

    store.add_deployment(DeploymentRecord {
        id: "deploy-042".to_string(),
        status: DeployState::Successful,
        deployed_at: Utc::now(),
    });

    store
        .record_integrity_check(IntegrityCheck {
            is_consistent: true,
            timestamp: Utc::now(),
        })
        .await
        .expect("seed integrity check");

    for tenant in ["tenant_a", "tenant_b"] {
        for i in 0..3 {
            store
                .insert_tenant_row(TenantRow {
                    tenant_id: tenant.to_string(),
                    data_owner: tenant.to_string(),
                    payload: serde_json::json!({ "row": i }),
                })
                .await
                .expect("seed tenant row");
        }
    }

    store.add_carrier(
        "carrier-blue",
        CarrierMetrics {
            on_time_rate: 0.96,
            acceptance_rate: 0.88,
            avg_cost_per_mile: 2.4,
        },
    );
    store.add_customer(
        "customer-acme",
        CustomerPrefs {
            preferred_carriers: vec!["carrier-blue".to_string()],
            notify_on_exception: true,
        },
    );

    store
}

pub fn incident_report(level: IncidentLevel, kind: &str) -> IncidentReport {
    IncidentReport {
        level,
        kind: kind.to_string(),
        description: format!("{kind} raised by test"),
        source: Some("test_fixture".to_string()),
    }
}

pub fn critical_report() -> IncidentReport {
    incident_report(IncidentLevel::Critical, "db_connection_storm")
}

pub fn shipment_input(priority: Priority) -> DecisionInput {
    DecisionInput::new(InputKind::Shipment, priority)
}

/// An evidence pack comfortably above every threshold.
pub fn passing_evidence_pack() -> EvidencePack {
    EvidencePack {
        uptime: 0.9999,
        success_rate: 0.995,
        p95_response_time: 1200.0,
    }
}

/// Write `<dir>/<date>/slo_snapshot.json` and return its path.
pub fn write_evidence_pack(dir: &Path, date: NaiveDate, pack: &EvidencePack) -> PathBuf {
    let day_dir = dir.join(date.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir).expect("create evidence dir");
    let path = day_dir.join("slo_snapshot.json");
    let body = serde_json::to_vec_pretty(pack).expect("serialize evidence pack");
    std::fs::write(&path, body).expect("write evidence pack");
    path
}

/// Today's evidence pack under `dir`.
pub fn write_todays_evidence_pack(dir: &Path, pack: &EvidencePack) -> PathBuf {
    write_evidence_pack(dir, Utc::now().date_naive(), pack)
}
