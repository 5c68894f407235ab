use crate::platform::{list_cameras, CameraDevice};
use tauri::command;

/// List capture devices
#[command]
pub async fn get_available_cameras() -> Result<Vec<CameraDevice>, String> {
    tokio::task::spawn_blocking(list_cameras)
        .await
        .map_err(|e| format!("Camera query task failed: {}", e))?
        .map_err(|e| e.to_string())
}

/// Crate name, version and description
#[command]
pub async fn get_crate_info() -> Result<crate::CrateInfo, String> {
    Ok(crate::get_info())
}
