use serde_json::Value;

use crate::storage;

#[tauri::command]
pub async fn settings_is_configured() -> Result<bool, String> {
    Ok(storage::is_configured())
}

#[tauri::command]
pub async fn settings_get_full_config() -> Result<Value, String> {
    Ok(storage::get_full_config())
}

#[tauri::command]
pub async fn settings_update_terminal(arg0: Option<Value>) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing settings payload")?;
    storage::update_terminal_settings(&payload)
}

#[tauri::command]
pub async fn settings_clear_connection() -> Result<Value, String> {
    storage::clear_connection()
}
