//! Acceptance-run entry point.
//!
//! No flags by contract: reads its paths from the environment, runs the
//! battery, writes the report artifact and summary record, and exits 0
//! only on a full pass.

use ocp_harness::{AcceptanceHarness, HarnessConfig};
use ocp_store::MemoryStore;
use ops_kernel::{ControllerConfig, IncidentController};
use std::path::PathBuf;
use std::sync::Arc;

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn seed_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for i in 1..=3 {
        store.add_agent(format!("agent-{i}"));
    }
    for i in 1..=2 {
        store.add_workflow(format!("workflow-{i}"));
    }
    store.add_deployment(ocp_store::DeploymentRecord {
        id: "deploy-001".to_string(),
        status: ocp_store::DeployState::Successful,
        deployed_at: chrono::Utc::now(),
    });
    store
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let store = seed_store();
    // Seed the integrity record the kill-switch test verifies against.
    ocp_store::HealthStore::record_integrity_check(
        store.as_ref(),
        ocp_store::IntegrityCheck {
            is_consistent: true,
            timestamp: chrono::Utc::now(),
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to seed integrity record: {e}"))?;

    let controller = Arc::new(IncidentController::with_config(
        store.clone(),
        ControllerConfig::default(),
    ));

    let config = HarnessConfig {
        evidence_dir: env_path("OCP_EVIDENCE_DIR", "artifacts/green-posture"),
        artifacts_dir: env_path("OCP_ARTIFACTS_DIR", "artifacts/acceptance"),
        ..HarnessConfig::default()
    };

    let harness = AcceptanceHarness::new(store, controller, config);
    let report = harness.run().await;

    println!("{}", report.generate_text());

    match harness.persist_report(&report).await {
        Ok(path) => println!("Report saved to {}", path.display()),
        Err(e) => eprintln!("warning: failed to persist report: {e}"),
    }

    if report.passed() {
        println!("ALL ACCEPTANCE TESTS PASSED");
        Ok(())
    } else {
        println!("SOME ACCEPTANCE TESTS FAILED");
        std::process::exit(1);
    }
}
