//! Backend RPC client.
//!
//! The shop backend exposes one fixed HTTP endpoint. Every operation is a
//! POST of a JSON body tagged with an `action` discriminator; the response is
//! JSON with a `status` field (`"success"` or otherwise) and a human-readable
//! `message` on failure. There is no retry and no client-side cancellation —
//! each call is a single best-effort attempt.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Timeout for backend requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic message shown when the backend reports failure without a message.
const GENERIC_BACKEND_ERROR: &str = "The server rejected the request.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The two failure channels of a backend call.
///
/// `Backend` carries the server's own message verbatim; `Transport` is a
/// network/parse failure mapped to a friendly generic message. Callers use
/// the distinction to decide whether form state survives (it always does on
/// failure) and which message to surface.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    Backend(String),
    #[error("{0}")]
    Transport(String),
}

impl RpcError {
    /// The user-facing message for this error.
    pub fn message(&self) -> &str {
        match self {
            RpcError::Backend(m) | RpcError::Transport(m) => m,
        }
    }
}

impl From<RpcError> for String {
    fn from(err: RpcError) -> Self {
        err.message().to_string()
    }
}

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the backend endpoint URL:
/// - strip trailing slashes
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_endpoint_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach the shop server at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid server URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

// ---------------------------------------------------------------------------
// The call itself
// ---------------------------------------------------------------------------

/// Merge `action` into the request parameters to form the wire body.
fn build_body(action: &str, params: Value) -> Value {
    let mut obj = match params {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            // Non-object params are wrapped so nothing is silently dropped.
            let mut map = serde_json::Map::new();
            map.insert("value".into(), other);
            map
        }
    };
    obj.insert("action".into(), Value::String(action.to_string()));
    Value::Object(obj)
}

/// POST one action to the backend endpoint and return the parsed response.
///
/// Returns the full response object on `status == "success"` so callers can
/// read `data` / `message` as the action dictates.
pub async fn call(endpoint: &str, action: &str, params: Value) -> Result<Value, RpcError> {
    let url = normalize_endpoint_url(endpoint);
    if url.is_empty() {
        return Err(RpcError::Transport(
            "Terminal not configured: missing server URL".into(),
        ));
    }

    let client = Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| RpcError::Transport(format!("Failed to create HTTP client: {e}")))?;

    let body = build_body(action, params);
    debug!(action, "rpc dispatch");

    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            warn!(action, error = %e, "rpc transport failure");
            RpcError::Transport(friendly_error(&url, &e))
        })?;

    let status = resp.status();
    let body_text = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!(action, http_status = status.as_u16(), "rpc http failure");
        return Err(RpcError::Transport(format!(
            "Server error from {url} (HTTP {})",
            status.as_u16()
        )));
    }

    let parsed: Value = serde_json::from_str(&body_text)
        .map_err(|e| RpcError::Transport(format!("Invalid JSON from server: {e}")))?;

    if parsed.get("status").and_then(Value::as_str) == Some("success") {
        Ok(parsed)
    } else {
        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_BACKEND_ERROR)
            .to_string();
        warn!(action, message = %message, "rpc backend failure");
        Err(RpcError::Backend(message))
    }
}

/// Like [`call`], but resolves the endpoint from the terminal settings store.
pub async fn call_configured(action: &str, params: Value) -> Result<Value, RpcError> {
    let endpoint = crate::storage::get_credential(crate::storage::KEY_ENDPOINT_URL)
        .ok_or_else(|| RpcError::Transport("Terminal not configured: missing server URL".into()))?;
    call(&endpoint, action, params).await
}

/// Pull the backend's success message out of a response, with a fallback.
pub fn success_message(resp: &Value, fallback: &str) -> String {
    resp.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_and_strips_slashes() {
        assert_eq!(
            normalize_endpoint_url("shop.example.com/rpc/"),
            "https://shop.example.com/rpc"
        );
        assert_eq!(
            normalize_endpoint_url("localhost:8080///"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_endpoint_url("  https://shop.example.com  "),
            "https://shop.example.com"
        );
    }

    #[test]
    fn build_body_tags_action_and_keeps_params() {
        let body = build_body(
            "transfer_stock",
            serde_json::json!({ "barcode": "B1", "toBranch": "Main" }),
        );
        assert_eq!(body["action"], "transfer_stock");
        assert_eq!(body["barcode"], "B1");
        assert_eq!(body["toBranch"], "Main");

        let empty = build_body("get_vendors", Value::Null);
        assert_eq!(empty, serde_json::json!({ "action": "get_vendors" }));
    }

    #[test]
    fn success_message_falls_back_when_blank() {
        let resp = serde_json::json!({ "status": "success", "message": "  " });
        assert_eq!(success_message(&resp, "Saved."), "Saved.");

        let resp = serde_json::json!({ "status": "success", "message": "개통 완료" });
        assert_eq!(success_message(&resp, "Saved."), "개통 완료");
    }
}
