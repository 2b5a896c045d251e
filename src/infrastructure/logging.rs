use crate::infrastructure::error::InfraError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const COMMAND_LOG_FILE: &str = "commands.log";

/// Installs a JSON subscriber appending to `logs/commands.log`. `RUST_LOG` overrides the default
/// `info` filter. A subscriber that is already installed is kept.
pub fn init_tracing(logs_dir: &Path) -> Result<(), InfraError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|error| InfraError::InvalidConfig(format!("invalid RUST_LOG filter: {error}")))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(logs_dir.join(COMMAND_LOG_FILE))?;

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(())
}
