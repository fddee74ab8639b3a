use serde_json::Value;

use super::arg_str;
use crate::refdata::{self, RefDataState};

#[tauri::command]
pub async fn refdata_refresh(state: tauri::State<'_, RefDataState>) -> Result<Value, String> {
    Ok(refdata::refresh(&state).await)
}

#[tauri::command]
pub async fn refdata_get_snapshot(state: tauri::State<'_, RefDataState>) -> Result<Value, String> {
    Ok(state.snapshot())
}

/// Add-ons for the selected vendor, original order preserved. An empty list
/// means "no add-ons for this vendor" and the webview shows the empty-state
/// message for it.
#[tauri::command]
pub async fn refdata_addons_for_vendor(
    arg0: Option<Value>,
    state: tauri::State<'_, RefDataState>,
) -> Result<Value, String> {
    let vendor = arg_str(&arg0, &["vendor", "name"]).ok_or("Missing vendor name")?;
    let addons = state.addons_for(&vendor);
    Ok(serde_json::json!({
        "vendor": vendor,
        "empty": addons.is_empty(),
        "addons": addons,
    }))
}

#[tauri::command]
pub async fn vendor_add(
    arg0: Option<Value>,
    state: tauri::State<'_, RefDataState>,
) -> Result<Value, String> {
    let name = arg_str(&arg0, &["name", "vendor"]).ok_or("Missing vendor name")?;
    refdata::add_vendor(&state, &name).await
}

#[tauri::command]
pub async fn vendor_delete(
    arg0: Option<Value>,
    state: tauri::State<'_, RefDataState>,
) -> Result<Value, String> {
    let name = arg_str(&arg0, &["name", "vendor"]).ok_or("Missing vendor name")?;
    refdata::delete_vendor(&state, &name).await
}
