use serde_json::Value;

use crate::session;

#[tauri::command]
pub async fn session_login(
    arg0: Option<Value>,
    state: tauri::State<'_, session::SessionState>,
    app: tauri::AppHandle,
) -> Result<Value, String> {
    session::login(arg0, &state, &app).await
}

#[tauri::command]
pub async fn session_logout(
    state: tauri::State<'_, session::SessionState>,
    app: tauri::AppHandle,
) -> Result<(), String> {
    session::sign_out(&state, &app, "logout");
    Ok(())
}

/// Called once on webview startup: restore the persisted identity, if any.
#[tauri::command]
pub async fn session_restore(
    state: tauri::State<'_, session::SessionState>,
    app: tauri::AppHandle,
) -> Result<Value, String> {
    Ok(session::restore(&state, &app))
}

#[tauri::command]
pub async fn session_get_current(
    state: tauri::State<'_, session::SessionState>,
) -> Result<Value, String> {
    Ok(session::current_json(&state))
}

#[tauri::command]
pub async fn session_get_stats(
    state: tauri::State<'_, session::SessionState>,
) -> Result<Value, String> {
    Ok(session::session_stats(&state))
}

/// Forwarded user-activity events (pointer move, key press, click, scroll,
/// touch) reset the idle countdown.
#[tauri::command]
pub async fn session_track_activity(
    state: tauri::State<'_, session::SessionState>,
) -> Result<(), String> {
    session::track_activity(&state);
    Ok(())
}
