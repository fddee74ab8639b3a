use serde_json::Value;
use tauri::Emitter;

use super::arg_str;
use crate::views::{self, RefreshAction, Section, ViewState};
use crate::{dashboard, refdata};

/// Activate a top-level section: record it as the single active view, run
/// its entry refresh, and tell the webview which input gets focus.
#[tauri::command]
pub async fn view_activate(
    arg0: Option<Value>,
    view_state: tauri::State<'_, ViewState>,
    refdata_state: tauri::State<'_, refdata::RefDataState>,
    app: tauri::AppHandle,
) -> Result<Value, String> {
    let section_id =
        arg_str(&arg0, &["section", "sectionId", "id"]).ok_or("Missing section id")?;
    let section = Section::parse(&section_id)
        .ok_or_else(|| format!("Unknown section: {section_id}"))?;

    let plan = views::activate(&view_state, section);

    let refresh_result = match plan.refresh {
        Some(RefreshAction::ReferenceData) => Some(refdata::refresh(&refdata_state).await),
        Some(RefreshAction::VendorList) => Some(match refdata::refresh_vendors(&refdata_state).await
        {
            Ok(vendors) => serde_json::json!({ "success": true, "vendors": vendors }),
            Err(e) => serde_json::json!({ "success": false, "errors": [e] }),
        }),
        Some(RefreshAction::Dashboard) => Some(match dashboard::load().await {
            Ok(view) => serde_json::json!({ "success": true, "dashboard": view }),
            Err(e) => serde_json::json!({ "success": false, "errors": [e] }),
        }),
        // The search UI rebuild is a pure webview concern.
        Some(RefreshAction::SearchUi) | None => None,
    };

    let _ = app.emit(
        "section_changed",
        serde_json::json!({ "section": plan.section.id(), "focus": plan.focus }),
    );

    Ok(serde_json::json!({
        "section": plan.section.id(),
        "focus": plan.focus,
        "refresh": refresh_result,
    }))
}

#[tauri::command]
pub async fn view_get_active(view_state: tauri::State<'_, ViewState>) -> Result<Value, String> {
    Ok(match view_state.active() {
        Some(section) => Value::String(section.id().to_string()),
        None => Value::Null,
    })
}
