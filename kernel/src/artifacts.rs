//! Incident artifact files
//!
//! Alongside the store record, each incident is written as a dated JSON
//! file for operators who work from the filesystem.

use ocp_store::Incident;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `incident-<id>-<date>.json` under `dir`, creating it if needed.
/// Returns the path written.
pub fn write_incident_artifact(dir: &Path, incident: &Incident) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let date = incident.timestamp.format("%Y-%m-%d");
    let path = dir.join(format!("incident-{}-{}.json", incident.id, date));
    let body = serde_json::to_vec_pretty(incident)?;
    fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocp_store::{IncidentLevel, IncidentReport};

    #[test]
    fn artifact_written_and_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let incident = Incident::from_report(IncidentReport {
            level: IncidentLevel::Medium,
            kind: "test_incident".to_string(),
            description: "artifact test".to_string(),
            source: None,
        });

        let path = write_incident_artifact(dir.path(), &incident).unwrap();
        assert!(path.exists());

        let body = std::fs::read_to_string(path).unwrap();
        let parsed: Incident = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.id, incident.id);
        assert_eq!(parsed.kind, "test_incident");
    }
}
