use super::capture::CrabFaceState;
use crate::config::CrabFaceConfig;
use tauri::{command, State};

/// Get the configuration the controller runs with
#[command]
pub async fn get_config(state: State<'_, CrabFaceState>) -> Result<CrabFaceConfig, String> {
    Ok(state.controller.config().clone())
}

/// Validate and persist a configuration. Takes effect on the next start.
#[command]
pub async fn save_config(new_config: CrabFaceConfig) -> Result<(), String> {
    new_config.validate()?;
    new_config
        .save_to_file(CrabFaceConfig::default_path())
        .map_err(|e| e.to_string())
}

/// Persist and return the default configuration
#[command]
pub async fn reset_config() -> Result<CrabFaceConfig, String> {
    let default_config = CrabFaceConfig::default();
    default_config
        .save_to_file(CrabFaceConfig::default_path())
        .map_err(|e| e.to_string())?;
    Ok(default_config)
}
