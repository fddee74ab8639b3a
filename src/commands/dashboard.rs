use serde_json::Value;

use crate::dashboard;

#[tauri::command]
pub async fn dashboard_load() -> Result<Value, String> {
    dashboard::load().await
}
