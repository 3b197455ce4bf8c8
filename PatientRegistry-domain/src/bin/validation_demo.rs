use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use patient_registry_domain::entities::profile::{
    insert_patient, sample_profile, update_patient, PatientProfile,
};
use patient_registry_domain::entities::Schema;

/// Validate a patient profile and run the demo insert/update on it.
///
/// With no argument the built-in sample profile is used; otherwise the first
/// argument names a JSON file holding the raw profile.
fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let raw = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            info!("Reading profile from {}", path.display());
            let contents = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_slice::<Value>(&contents)
                .with_context(|| format!("{} is not valid JSON", path.display()))?
        }
        None => sample_profile(),
    };

    let profile = PatientProfile::from_value(raw)
        .map_err(|report| {
            error!("Profile rejected: {}", report);
            report
        })
        .context("profile failed validation")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    insert_patient(&mut out, &profile)?;
    update_patient(&mut out, &profile)?;
    out.flush()?;

    Ok(())
}
