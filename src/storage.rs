//! Secure terminal config and session-identity storage using the OS
//! credential store.
//!
//! On Windows this uses DPAPI (via the `keyring` crate), on macOS Keychain,
//! and on Linux the Secret Service API. Besides the terminal configuration
//! (backend endpoint URL, shop branch), this holds the one persisted record
//! this app keeps: the signed-in identity, so an app reload does not force
//! re-login.

use keyring::Entry;
use serde_json::Value;
use tracing::{info, warn};

use crate::session::Identity;

const SERVICE_NAME: &str = "phone-shop-desk";

// Credential keys
pub const KEY_ENDPOINT_URL: &str = "backend_endpoint_url";
pub const KEY_BRANCH: &str = "shop_branch";
const KEY_IDENTITY_NAME: &str = "identity_name";
const KEY_IDENTITY_USER: &str = "identity_user";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[
    KEY_ENDPOINT_URL,
    KEY_BRANCH,
    KEY_IDENTITY_NAME,
    KEY_IDENTITY_USER,
];

// ---------------------------------------------------------------------------
// Low-level helpers
// ---------------------------------------------------------------------------

/// Retrieve a single credential from the OS keyring. Returns `None` when the
/// entry does not exist (or the platform returns a "not found" error).
pub fn get_credential(key: &str) -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, key) {
        Ok(e) => e,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(pw) => Some(pw),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to read credential");
            None
        }
    }
}

/// Store a credential in the OS keyring.
pub fn set_credential(key: &str, value: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    entry.set_password(value).map_err(|e| e.to_string())?;
    Ok(())
}

/// Delete a credential from the OS keyring. Silently succeeds if the entry
/// does not exist.
pub fn delete_credential(key: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

pub fn has_credential(key: &str) -> bool {
    get_credential(key).is_some()
}

// ---------------------------------------------------------------------------
// Terminal configuration
// ---------------------------------------------------------------------------

/// The terminal is considered configured when the backend endpoint URL is
/// present in the credential store.
pub fn is_configured() -> bool {
    has_credential(KEY_ENDPOINT_URL)
}

/// Return the stored terminal config as the JSON shape the webview expects.
pub fn get_full_config() -> Value {
    serde_json::json!({
        "endpoint_url": get_credential(KEY_ENDPOINT_URL),
        "branch":       get_credential(KEY_BRANCH),
    })
}

/// Store terminal settings received during onboarding.
///
/// Expected JSON shape (camelCase):
/// ```json
/// { "endpointUrl": "...", "branch": "..." }
/// ```
pub fn update_terminal_settings(payload: &Value) -> Result<Value, String> {
    let endpoint = payload
        .get("endpointUrl")
        .or_else(|| payload.get("endpoint_url"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("Missing required field: endpointUrl")?;

    let normalized = crate::rpc::normalize_endpoint_url(endpoint);
    if normalized.is_empty() {
        return Err("Invalid endpoint URL".into());
    }
    set_credential(KEY_ENDPOINT_URL, &normalized)?;

    if let Some(branch) = payload
        .get("branch")
        .or_else(|| payload.get("branchName"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        set_credential(KEY_BRANCH, branch)?;
    }

    info!("terminal settings updated");
    Ok(serde_json::json!({ "success": true }))
}

/// Delete every stored credential (disconnect this terminal).
pub fn clear_connection() -> Result<Value, String> {
    info!("clearing terminal connection - deleting all credentials");
    for key in ALL_KEYS {
        delete_credential(key)?;
    }
    Ok(serde_json::json!({ "success": true }))
}

// ---------------------------------------------------------------------------
// Persisted session identity
// ---------------------------------------------------------------------------

/// Persist the signed-in identity so a reload restores the session.
pub fn save_identity(identity: &Identity) -> Result<(), String> {
    set_credential(KEY_IDENTITY_NAME, &identity.name)?;
    set_credential(KEY_IDENTITY_USER, &identity.user)?;
    Ok(())
}

/// Load the persisted identity, if one was saved.
pub fn load_identity() -> Option<Identity> {
    let name = get_credential(KEY_IDENTITY_NAME)?;
    let user = get_credential(KEY_IDENTITY_USER)?;
    if name.trim().is_empty() || user.trim().is_empty() {
        return None;
    }
    Some(Identity { name, user })
}

/// Remove the persisted identity (logout).
pub fn clear_identity() -> Result<(), String> {
    delete_credential(KEY_IDENTITY_NAME)?;
    delete_credential(KEY_IDENTITY_USER)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_terminal_settings_requires_endpoint() {
        let err = update_terminal_settings(&serde_json::json!({ "branch": "Main" }))
            .expect_err("missing endpoint should fail");
        assert!(err.contains("endpointUrl"));
    }
}
