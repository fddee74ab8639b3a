//! Session store and idle-logout monitor.
//!
//! Login is a backend RPC (`login` action); on success the identity
//! `{name, user(email)}` is held in managed state and persisted through
//! `storage` so an app reload restores the session. A single background
//! watcher enforces the fixed idle threshold: the webview forwards qualifying
//! activity events (pointer move, key press, click, scroll, touch) through
//! the `session_track_activity` command, which resets the countdown; once the
//! deadline passes with no activity the user is signed out and a
//! `session_timeout` event tells the webview to return to the login view.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tauri::Emitter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{rpc, storage};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Idle threshold before forced logout.
pub const IDLE_TIMEOUT_MINUTES: i64 = 10;

/// How often the idle watcher checks the deadline.
const IDLE_POLL_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The signed-in identity. `user` is the staff email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub user: String,
}

/// An active signed-in session.
struct ActiveSession {
    session_id: String,
    identity: Identity,
    login_time: DateTime<Utc>,
    idle_deadline: DateTime<Utc>,
}

/// Tauri managed state for the session. Singleton for the app; at most one
/// identity is signed in at a time.
pub struct SessionState {
    current: Mutex<Option<ActiveSession>>,
    /// Bumped on every sign-in; a running watcher exits when its generation
    /// no longer matches, so only one countdown is ever active.
    watcher_generation: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            watcher_generation: AtomicU64::new(0),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn idle_deadline_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(IDLE_TIMEOUT_MINUTES)
}

/// Whether the session's idle deadline has passed. The watcher signs the
/// user out as soon as this holds.
fn is_idle_expired(session: &ActiveSession, now: DateTime<Utc>) -> bool {
    now >= session.idle_deadline
}

fn identity_json(identity: &Identity) -> Value {
    serde_json::json!({
        "name": identity.name,
        "user": identity.user,
    })
}

/// Extract email and password from the login arg, which may be a JSON object
/// with a few field-name variants.
fn parse_login_payload(arg: &Value) -> Option<(String, String)> {
    let obj = arg.as_object()?;
    let user = obj
        .get("user")
        .or_else(|| obj.get("email"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    let password = obj
        .get("password")
        .or_else(|| obj.get("pass"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    Some((user.to_string(), password.to_string()))
}

/// Resolve the display name from the login response, falling back to the
/// local part of the email when the backend omits it.
fn display_name_from_response(resp: &Value, user: &str) -> String {
    resp.get("name")
        .or_else(|| resp.get("data").and_then(|d| d.get("name")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user.split('@').next().unwrap_or(user).to_string())
}

// ---------------------------------------------------------------------------
// Sign-in / sign-out
// ---------------------------------------------------------------------------

/// Install the identity, persist it, and arm the idle watcher.
pub fn sign_in(state: &SessionState, app: &tauri::AppHandle, identity: Identity) -> Value {
    if let Err(e) = storage::save_identity(&identity) {
        warn!(error = %e, "failed to persist session identity");
    }

    let now = Utc::now();
    let session = ActiveSession {
        session_id: Uuid::new_v4().to_string(),
        identity: identity.clone(),
        login_time: now,
        idle_deadline: idle_deadline_from(now),
    };

    {
        let mut current = state.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(session);
    }

    let generation = state.watcher_generation.fetch_add(1, Ordering::SeqCst) + 1;
    spawn_idle_watcher(app.clone(), generation);

    info!(user = %identity.user, "signed in");
    identity_json(&identity)
}

/// Clear the session (memory + persisted record) and notify the webview.
pub fn sign_out(state: &SessionState, app: &tauri::AppHandle, reason: &str) {
    let had_session = {
        let mut current = state.current.lock().unwrap_or_else(|e| e.into_inner());
        current.take().is_some()
    };
    // Invalidate any running watcher.
    state.watcher_generation.fetch_add(1, Ordering::SeqCst);

    if let Err(e) = storage::clear_identity() {
        warn!(error = %e, "failed to clear persisted identity");
    }

    if had_session {
        info!(reason, "signed out");
    }
    let _ = app.emit("session_timeout", serde_json::json!({ "reason": reason }));
}

/// Reset the idle countdown. Called from the activity-event command; a no-op
/// when nobody is signed in.
pub fn track_activity(state: &SessionState) {
    let mut current = state.current.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(session) = current.as_mut() {
        session.idle_deadline = idle_deadline_from(Utc::now());
    }
}

/// The current identity as JSON, or null.
pub fn current_json(state: &SessionState) -> Value {
    let current = state.current.lock().unwrap_or_else(|e| e.into_inner());
    match current.as_ref() {
        Some(s) => identity_json(&s.identity),
        None => Value::Null,
    }
}

/// Session stats for the diagnostics view.
pub fn session_stats(state: &SessionState) -> Value {
    let current = state.current.lock().unwrap_or_else(|e| e.into_inner());
    match current.as_ref() {
        Some(s) => serde_json::json!({
            "sessionId": s.session_id,
            "user": s.identity.user,
            "loginTime": s.login_time.to_rfc3339(),
            "idleDeadline": s.idle_deadline.to_rfc3339(),
        }),
        None => serde_json::json!({}),
    }
}

/// Restore a persisted identity on startup, re-arming the idle watcher.
/// Returns the restored identity JSON or null.
pub fn restore(state: &SessionState, app: &tauri::AppHandle) -> Value {
    match storage::load_identity() {
        Some(identity) => sign_in(state, app, identity),
        None => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Login RPC
// ---------------------------------------------------------------------------

/// Handle the login command: one `login` RPC, then local sign-in on success.
pub async fn login(
    arg0: Option<Value>,
    state: &SessionState,
    app: &tauri::AppHandle,
) -> Result<Value, String> {
    let payload = arg0.ok_or("Missing login payload")?;
    let (user, password) =
        parse_login_payload(&payload).ok_or("Email and password are required")?;

    let resp = rpc::call_configured(
        "login",
        serde_json::json!({ "user": user, "password": password }),
    )
    .await
    .map_err(String::from)?;

    let name = display_name_from_response(&resp, &user);
    let identity = Identity { name, user };
    let user_json = sign_in(state, app, identity);

    Ok(serde_json::json!({
        "success": true,
        "user": user_json,
    }))
}

// ---------------------------------------------------------------------------
// Idle watcher
// ---------------------------------------------------------------------------

/// Background watcher for the idle deadline.
///
/// One task per sign-in; it exits as soon as its generation is stale (a new
/// sign-in re-armed the watcher) or the session is gone, so no timer runs
/// when no identity is set.
fn spawn_idle_watcher(app: tauri::AppHandle, generation: u64) {
    tauri::async_runtime::spawn(async move {
        use tauri::Manager;
        info!(generation, "idle watcher started");

        loop {
            tokio::time::sleep(std::time::Duration::from_secs(IDLE_POLL_SECS)).await;

            let state = app.state::<SessionState>();
            if state.watcher_generation.load(Ordering::SeqCst) != generation {
                break;
            }

            let expired = {
                let current = state.current.lock().unwrap_or_else(|e| e.into_inner());
                match current.as_ref() {
                    Some(s) => is_idle_expired(s, Utc::now()),
                    None => break,
                }
            };

            if expired {
                warn!(generation, "idle timeout reached, forcing sign-out");
                sign_out(&state, &app, "idle");
                break;
            }
        }

        info!(generation, "idle watcher stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_login_payload_accepts_aliases() {
        let (user, pass) = parse_login_payload(&serde_json::json!({
            "email": "kim@shop.example",
            "password": "secret"
        }))
        .expect("email alias should parse");
        assert_eq!(user, "kim@shop.example");
        assert_eq!(pass, "secret");

        assert!(parse_login_payload(&serde_json::json!({ "user": "  ", "password": "x" })).is_none());
        assert!(parse_login_payload(&serde_json::json!({ "user": "a@b.c" })).is_none());
    }

    #[test]
    fn display_name_prefers_backend_name() {
        let resp = serde_json::json!({ "status": "success", "name": "김직원" });
        assert_eq!(
            display_name_from_response(&resp, "kim@shop.example"),
            "김직원"
        );

        let resp = serde_json::json!({ "status": "success", "data": { "name": "Lee" } });
        assert_eq!(display_name_from_response(&resp, "lee@shop.example"), "Lee");

        let resp = serde_json::json!({ "status": "success" });
        assert_eq!(
            display_name_from_response(&resp, "park@shop.example"),
            "park"
        );
    }

    fn session_from(login: DateTime<Utc>) -> ActiveSession {
        ActiveSession {
            session_id: "s1".into(),
            identity: Identity {
                name: "Kim".into(),
                user: "kim@shop.example".into(),
            },
            login_time: login,
            idle_deadline: idle_deadline_from(login),
        }
    }

    #[test]
    fn ten_quiet_minutes_expire_the_session() {
        let login = Utc::now();
        let session = session_from(login);

        assert!(!is_idle_expired(&session, login + Duration::minutes(9)));
        assert!(is_idle_expired(
            &session,
            login + Duration::minutes(IDLE_TIMEOUT_MINUTES)
        ));
    }

    #[test]
    fn activity_at_minute_nine_survives_minute_ten() {
        let state = SessionState::new();
        let login = Utc::now() - Duration::minutes(9);
        {
            let mut current = state.current.lock().unwrap();
            *current = Some(session_from(login));
        }

        // Nine minutes in, the user moves the mouse.
        track_activity(&state);

        let current = state.current.lock().unwrap();
        let session = current.as_ref().expect("session present");
        assert!(!is_idle_expired(
            session,
            login + Duration::minutes(IDLE_TIMEOUT_MINUTES)
        ));
    }

    #[test]
    fn track_activity_extends_the_deadline() {
        let state = SessionState::new();
        {
            let mut current = state.current.lock().unwrap();
            let past = Utc::now() - Duration::minutes(9);
            *current = Some(session_from(past));
        }

        // Activity at minute 9: the deadline moves a full threshold ahead, so
        // no logout can fire at minute 10.
        track_activity(&state);

        let current = state.current.lock().unwrap();
        let session = current.as_ref().expect("session present");
        let remaining = session.idle_deadline - Utc::now();
        assert!(remaining > Duration::minutes(IDLE_TIMEOUT_MINUTES - 1));
    }

    #[test]
    fn track_activity_without_session_is_noop() {
        let state = SessionState::new();
        track_activity(&state);
        assert!(state.current.lock().unwrap().is_none());
    }
}
