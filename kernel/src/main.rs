use clap::{Arg, Command};
use ops_kernel::{ControllerConfig, IncidentController, IncidentLevel, IncidentReport};
use ocp_store::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

fn build_controller() -> IncidentController {
    let store = Arc::new(MemoryStore::new());
    // The in-memory adapter stands in for the hosted backend; give it a
    // plausible running fleet so playbooks have something to act on.
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

    let artifacts_dir = std::env::var("OCP_ARTIFACTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("artifacts/incident-response"));

    let config = ControllerConfig {
        artifacts_dir: Some(artifacts_dir),
        ..ControllerConfig::default()
    };
    IncidentController::with_config(store, config)
}

fn print_incident(incident: &ops_kernel::Incident) {
    println!("Incident {}", incident.id);
    println!("  Level: {}", incident.level);
    println!("  Type: {}", incident.kind);
    println!("  Status: {:?}", incident.status);
    for action in &incident.actions {
        let mark = if action.success { "ok" } else { "FAILED" };
        println!("  - {} [{}] {}ms", action.kind, mark, action.duration_ms);
        if let Some(error) = &action.error {
            println!("      error: {error}");
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("ops-kernel")
        .version("0.1.0")
        .about("OCP incident response levers")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("handle")
                .about("Handle an incident described as JSON")
                .arg(
                    Arg::new("incident")
                        .required(true)
                        .help("Incident JSON: {\"level\":..,\"type\":..,\"description\":..}"),
                ),
        )
        .subcommand(
            Command::new("resume")
                .about("Resume the system after an incident")
                .arg(Arg::new("id").required(true).help("Incident ID")),
        )
        .subcommand(Command::new("list").about("List tracked incidents"))
        .subcommand(Command::new("test").about("Handle a canned test incident"));

    let matches = cli.get_matches();
    let controller = build_controller();

    let outcome: anyhow::Result<()> = match matches.subcommand() {
        Some(("handle", args)) => {
            let raw = args.get_one::<String>("incident").expect("required arg");
            match serde_json::from_str::<IncidentReport>(raw) {
                Ok(report) => match controller.handle_incident(report).await {
                    Ok(incident) => {
                        print_incident(&incident);
                        Ok(())
                    }
                    Err(e) => Err(anyhow::anyhow!("incident handling failed: {e}")),
                },
                Err(e) => Err(anyhow::anyhow!("invalid incident JSON: {e}")),
            }
        }
        Some(("resume", args)) => {
            let raw = args.get_one::<String>("id").expect("required arg");
            match raw.parse::<ops_kernel::IncidentId>() {
                Ok(id) => match controller.resume(id).await {
                    Ok(outcome) => {
                        println!(
                            "Resume: success={} running={} ({}ms)",
                            outcome.success, outcome.system_running, outcome.duration_ms
                        );
                        if outcome.success {
                            Ok(())
                        } else {
                            Err(anyhow::anyhow!(
                                outcome.error.unwrap_or_else(|| "resume failed".to_string())
                            ))
                        }
                    }
                    Err(e) => Err(anyhow::anyhow!("resume failed: {e}")),
                },
                Err(e) => Err(anyhow::anyhow!("invalid incident id: {e}")),
            }
        }
        Some(("list", _)) => {
            let incidents = controller.active_incidents();
            println!("Tracked incidents: {}", incidents.len());
            for incident in incidents {
                println!(
                    "  - {}: {} ({}) {:?}",
                    incident.id, incident.kind, incident.level, incident.status
                );
            }
            Ok(())
        }
        Some(("test", _)) => {
            let report = IncidentReport {
                level: IncidentLevel::Medium,
                kind: "test_incident".to_string(),
                description: "Test incident for validation".to_string(),
                source: Some("manual_test".to_string()),
            };
            match controller.handle_incident(report).await {
                Ok(incident) => {
                    print_incident(&incident);
                    println!("Test incident handled");
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!("test incident failed: {e}")),
            }
        }
        _ => Ok(()),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
