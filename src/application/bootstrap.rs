use crate::infrastructure::config::{AppConfig, ensure_default_configs, load_app_config_from_lookup};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::SqliteKeyValueStore;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "event-calendar.sqlite";

#[derive(Debug)]
pub struct BootstrapResult {
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub config: AppConfig,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    bootstrap_workspace_with_lookup(workspace_root, |key| std::env::var(key).ok())
}

pub fn bootstrap_workspace_with_lookup<F>(
    workspace_root: &Path,
    lookup: F,
) -> Result<BootstrapResult, InfraError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join(DATABASE_FILE);

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_app_config_from_lookup(&config_dir, lookup)?;
    SqliteKeyValueStore::open(&database_path)?;

    Ok(BootstrapResult {
        logs_dir,
        database_path,
        config,
    })
}
