//! Reference-data cache.
//!
//! In-memory lists shared across the activation and inventory forms: vendor
//! names, model names, add-on definitions, and the dropdown option sets keyed
//! by workflow. `refresh` fetches everything from the backend and replaces
//! each list wholesale — last fetch wins, no versioning, and a failed fetch
//! leaves the other lists as they were (independent calls, no atomicity).
//! Consumers read synchronously; before the first refresh completes they see
//! empty lists.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::rpc;

/// An optional service product tied to a vendor, selectable during
/// activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOn {
    pub name: String,
    pub vendor: String,
}

/// Tauri managed state for the cached reference lists.
pub struct RefDataState {
    vendors: Mutex<Vec<String>>,
    models: Mutex<Vec<String>>,
    addons: Mutex<Vec<AddOn>>,
    dropdowns: Mutex<HashMap<String, Vec<String>>>,
}

impl RefDataState {
    pub fn new() -> Self {
        Self {
            vendors: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
            addons: Mutex::new(Vec::new()),
            dropdowns: Mutex::new(HashMap::new()),
        }
    }

    pub fn vendors(&self) -> Vec<String> {
        self.vendors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn dropdown(&self, key: &str) -> Vec<String> {
        self.dropdowns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Cached add-ons whose vendor equals `vendor`, original order preserved.
    /// An empty result is the "no add-ons for this vendor" state, not an
    /// error; the webview renders the empty-state message for it.
    pub fn addons_for(&self, vendor: &str) -> Vec<AddOn> {
        self.addons
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|a| a.vendor == vendor)
            .cloned()
            .collect()
    }

    /// Everything the webview needs to (re)build its selects in one read.
    pub fn snapshot(&self) -> Value {
        serde_json::json!({
            "vendors": self.vendors(),
            "models": self.models(),
            "addons": self.addons.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            "dropdowns": self.dropdowns.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        })
    }
}

impl Default for RefDataState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse a list of names from a response `data` array. Entries may be plain
/// strings or objects carrying a `name` field.
fn parse_name_list(resp: &Value) -> Vec<String> {
    resp.get("data")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    entry
                        .as_str()
                        .or_else(|| entry.get("name").and_then(Value::as_str))
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the `get_dropdown_data` response: `data.addons` is the add-on list,
/// every other array under `data` is a dropdown option set keyed by its
/// field name.
fn parse_dropdown_data(resp: &Value) -> (Vec<AddOn>, HashMap<String, Vec<String>>) {
    let mut addons = Vec::new();
    let mut dropdowns = HashMap::new();

    let Some(data) = resp.get("data").and_then(Value::as_object) else {
        return (addons, dropdowns);
    };

    for (key, value) in data {
        let Some(arr) = value.as_array() else { continue };
        if key == "addons" {
            addons = arr
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("name").and_then(Value::as_str)?.trim();
                    let vendor = entry.get("vendor").and_then(Value::as_str)?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    Some(AddOn {
                        name: name.to_string(),
                        vendor: vendor.to_string(),
                    })
                })
                .collect();
        } else {
            let options: Vec<String> = arr
                .iter()
                .filter_map(|v| v.as_str().map(str::trim))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            dropdowns.insert(key.clone(), options);
        }
    }

    (addons, dropdowns)
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// Reload the vendor list only (used after vendor add/delete and on entry to
/// the vendor management section).
pub async fn refresh_vendors(state: &RefDataState) -> Result<Vec<String>, String> {
    let resp = rpc::call_configured("get_vendors", Value::Null)
        .await
        .map_err(String::from)?;
    let vendors = parse_name_list(&resp);
    let mut cached = state.vendors.lock().unwrap_or_else(|e| e.into_inner());
    *cached = vendors.clone();
    Ok(vendors)
}

/// Reload all reference lists. Each of the three fetches is independent:
/// one failing leaves the other lists replaced and is reported in the
/// returned summary rather than rolling anything back.
pub async fn refresh(state: &RefDataState) -> Value {
    let mut errors: Vec<String> = Vec::new();

    match refresh_vendors(state).await {
        Ok(v) => info!(count = v.len(), "vendor list refreshed"),
        Err(e) => {
            warn!(error = %e, "vendor refresh failed");
            errors.push(format!("vendors: {e}"));
        }
    }

    match rpc::call_configured("get_models", Value::Null).await {
        Ok(resp) => {
            let models = parse_name_list(&resp);
            info!(count = models.len(), "model list refreshed");
            let mut cached = state.models.lock().unwrap_or_else(|e| e.into_inner());
            *cached = models;
        }
        Err(e) => {
            warn!(error = %e, "model refresh failed");
            errors.push(format!("models: {e}"));
        }
    }

    match rpc::call_configured("get_dropdown_data", Value::Null).await {
        Ok(resp) => {
            let (addons, dropdowns) = parse_dropdown_data(&resp);
            info!(
                addons = addons.len(),
                sets = dropdowns.len(),
                "dropdown data refreshed"
            );
            *state.addons.lock().unwrap_or_else(|e| e.into_inner()) = addons;
            *state.dropdowns.lock().unwrap_or_else(|e| e.into_inner()) = dropdowns;
        }
        Err(e) => {
            warn!(error = %e, "dropdown refresh failed");
            errors.push(format!("dropdowns: {e}"));
        }
    }

    serde_json::json!({
        "success": errors.is_empty(),
        "errors": errors,
        "snapshot": state.snapshot(),
    })
}

// ---------------------------------------------------------------------------
// Vendor management
// ---------------------------------------------------------------------------

/// Register a new vendor, then reload the vendor list.
pub async fn add_vendor(state: &RefDataState, name: &str) -> Result<Value, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Vendor name is required".into());
    }

    let resp = rpc::call_configured("add_vendor", serde_json::json!({ "name": name }))
        .await
        .map_err(String::from)?;
    let message = rpc::success_message(&resp, "Vendor added.");

    let vendors = refresh_vendors(state).await.unwrap_or_else(|e| {
        warn!(error = %e, "vendor reload after add failed");
        state.vendors()
    });

    Ok(serde_json::json!({
        "success": true,
        "message": message,
        "vendors": vendors,
    }))
}

/// Delete a vendor, then reload the vendor list.
pub async fn delete_vendor(state: &RefDataState, name: &str) -> Result<Value, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Vendor name is required".into());
    }

    let resp = rpc::call_configured("delete_vendor", serde_json::json!({ "name": name }))
        .await
        .map_err(String::from)?;
    let message = rpc::success_message(&resp, "Vendor deleted.");

    let vendors = refresh_vendors(state).await.unwrap_or_else(|e| {
        warn!(error = %e, "vendor reload after delete failed");
        state.vendors()
    });

    Ok(serde_json::json!({
        "success": true,
        "message": message,
        "vendors": vendors,
    }))
}
