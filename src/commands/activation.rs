use serde_json::Value;

use super::arg_str;
use crate::activation::{self, ActivationForm, ActivationState, Workflow};
use crate::session::SessionState;

fn parse_workflow(arg0: &Option<Value>) -> Result<Workflow, String> {
    let id = arg_str(arg0, &["workflow", "flow"]).ok_or("Missing workflow")?;
    Workflow::parse(&id).ok_or_else(|| format!("Unknown workflow: {id}"))
}

/// Step 1 of the scan-driven flows: stock lookup for activation.
#[tauri::command]
pub async fn activation_scan(
    arg0: Option<Value>,
    state: tauri::State<'_, ActivationState>,
) -> Result<Value, String> {
    let workflow = parse_workflow(&arg0)?;
    let code = arg_str(&arg0, &["code", "barcode", "serial"]).ok_or("Missing scan code")?;
    activation::scan_lookup(&state, workflow, &code).await
}

/// Step 2 submission. Validation failures come back as `success: false`
/// with the field to focus; no RPC is sent for them.
#[tauri::command]
pub async fn activation_submit(
    arg0: Option<Value>,
    state: tauri::State<'_, ActivationState>,
    session: tauri::State<'_, SessionState>,
) -> Result<Value, String> {
    let workflow = parse_workflow(&arg0)?;
    let form_value = arg0
        .as_ref()
        .and_then(|v| v.get("form"))
        .cloned()
        .ok_or("Missing form payload")?;
    let form: ActivationForm =
        serde_json::from_value(form_value).map_err(|e| format!("Invalid form payload: {e}"))?;

    let opened_by = crate::session::current_json(&session)
        .get("user")
        .and_then(Value::as_str)
        .map(str::to_string);

    activation::submit(&state, workflow, form, opened_by).await
}

/// Back to Step 1: drop the in-progress scanned device.
#[tauri::command]
pub async fn activation_reset(state: tauri::State<'_, ActivationState>) -> Result<Value, String> {
    Ok(activation::reset(&state))
}
