use serde_json::Value;

use super::arg_str;
use crate::inventory::{self, PendingBatchState};

#[tauri::command]
pub async fn inventory_register_single(arg0: Option<Value>) -> Result<Value, String> {
    let code = arg_str(&arg0, &["code", "barcode"]).ok_or("Missing scan code")?;
    inventory::register_single(&code).await
}

#[tauri::command]
pub async fn inventory_preview_scan(
    arg0: Option<Value>,
    state: tauri::State<'_, PendingBatchState>,
) -> Result<Value, String> {
    let code = arg_str(&arg0, &["code", "barcode"]).ok_or("Missing scan code")?;
    let supplier = arg_str(&arg0, &["supplier", "vendor"]).unwrap_or_default();
    inventory::preview_scan(&state, &code, &supplier).await
}

#[tauri::command]
pub async fn inventory_batch_rows(
    state: tauri::State<'_, PendingBatchState>,
) -> Result<Value, String> {
    Ok(serde_json::json!({ "rows": state.rows() }))
}

#[tauri::command]
pub async fn inventory_batch_remove(
    arg0: Option<Value>,
    state: tauri::State<'_, PendingBatchState>,
) -> Result<Value, String> {
    let index = arg0
        .as_ref()
        .and_then(|v| v.as_u64().or_else(|| v.get("index").and_then(Value::as_u64)))
        .ok_or("Missing row index")? as usize;
    let rows = state.remove(index)?;
    Ok(serde_json::json!({ "success": true, "rows": rows }))
}

#[tauri::command]
pub async fn inventory_batch_clear(
    state: tauri::State<'_, PendingBatchState>,
) -> Result<Value, String> {
    Ok(serde_json::json!({ "success": true, "rows": state.clear() }))
}

#[tauri::command]
pub async fn inventory_batch_commit(
    state: tauri::State<'_, PendingBatchState>,
) -> Result<Value, String> {
    inventory::commit_batch(&state).await
}

#[tauri::command]
pub async fn inventory_transfer(arg0: Option<Value>) -> Result<Value, String> {
    let code = arg_str(&arg0, &["code", "barcode"]).ok_or("Missing scan code")?;
    let to_branch = arg_str(&arg0, &["toBranch", "branch"]).unwrap_or_default();
    inventory::transfer(&code, &to_branch).await
}

#[tauri::command]
pub async fn inventory_return(arg0: Option<Value>) -> Result<Value, String> {
    let code = arg_str(&arg0, &["code", "barcode"]).ok_or("Missing scan code")?;
    let reason = arg_str(&arg0, &["reason", "note"]).unwrap_or_default();
    inventory::return_stock(&code, &reason).await
}
