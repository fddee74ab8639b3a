//! Inventory operations: receive (single and batch-preview), transfer, and
//! return.
//!
//! Batch receive accumulates preview-scanned units in an in-memory pending
//! list before one explicit commit sends the whole batch in a single RPC.
//! Transfer and return fire one RPC per scan and surface their result as a
//! transient message; the dismiss interval rides along in the response so the
//! webview owns the timing. Concurrent preview scans may complete out of
//! order — rows are appended in arrival order and the duplicate-barcode check
//! runs at append time inside the lock, so a late duplicate is still
//! rejected.

use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use tracing::info;

use crate::rpc::{self, RpcError};

/// How long the webview shows a transfer/return result before auto-dismiss.
pub const TRANSIENT_DISMISS_MS: u64 = 4_000;

// ---------------------------------------------------------------------------
// Pending batch
// ---------------------------------------------------------------------------

/// One scanned unit awaiting batch registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUnit {
    pub model: String,
    pub serial: String,
    pub barcode: String,
    pub supplier: String,
}

/// Tauri managed state: the ordered pending inbound-stock batch.
pub struct PendingBatchState {
    rows: Mutex<Vec<PendingUnit>>,
}

impl PendingBatchState {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(&self) -> Vec<PendingUnit> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Append a unit, rejecting an exact-duplicate barcode already pending.
    /// The list is unchanged on rejection.
    pub fn add(&self, unit: PendingUnit) -> Result<Vec<PendingUnit>, String> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        if rows.iter().any(|r| r.barcode == unit.barcode) {
            return Err(format!("Barcode {} is already in the batch", unit.barcode));
        }
        rows.push(unit);
        Ok(rows.clone())
    }

    /// Remove row `index`, preserving the relative order of the rest.
    pub fn remove(&self, index: usize) -> Result<Vec<PendingUnit>, String> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        if index >= rows.len() {
            return Err("No such row".into());
        }
        rows.remove(index);
        Ok(rows.clone())
    }

    pub fn clear(&self) -> Vec<PendingUnit> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.clear();
        rows.clone()
    }

    fn is_empty(&self) -> bool {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

impl Default for PendingBatchState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Receive
// ---------------------------------------------------------------------------

/// Single-unit mode: register one scanned code immediately. Success reports
/// the resolved model name; the webview clears and refocuses the input
/// regardless of outcome.
pub async fn register_single(code: &str) -> Result<Value, String> {
    let code = code.trim();
    if code.is_empty() {
        return Err("Scan a barcode first".into());
    }

    let resp = rpc::call_configured("register_single", serde_json::json!({ "code": code }))
        .await
        .map_err(String::from)?;

    let model = resp
        .get("data")
        .and_then(|d| d.get("model"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    info!(code, model = %model, "single unit registered");

    Ok(serde_json::json!({
        "success": true,
        "model": model,
        "message": rpc::success_message(&resp, "Registered."),
    }))
}

/// Batch-preview mode: look the code up without persisting, then append the
/// resolved unit plus the currently selected supplier to the pending list.
pub async fn preview_scan(
    state: &PendingBatchState,
    code: &str,
    supplier: &str,
) -> Result<Value, String> {
    let code = code.trim();
    if code.is_empty() {
        return Err("Scan a barcode first".into());
    }

    let resp = rpc::call_configured("scan_preview", serde_json::json!({ "code": code }))
        .await
        .map_err(String::from)?;

    let data = resp.get("data").cloned().unwrap_or(Value::Null);
    let field = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let barcode = {
        let b = field("barcode");
        if b.is_empty() {
            code.to_string()
        } else {
            b
        }
    };

    let unit = PendingUnit {
        model: field("model"),
        serial: field("serial"),
        barcode,
        supplier: supplier.trim().to_string(),
    };

    let rows = state.add(unit)?;
    Ok(serde_json::json!({ "success": true, "rows": rows }))
}

/// Commit the whole pending batch in one RPC. The list is cleared only on
/// backend success; on any failure it survives for another attempt.
pub async fn commit_batch(state: &PendingBatchState) -> Result<Value, String> {
    if state.is_empty() {
        return Err("No scanned units to register".into());
    }

    let units = state.rows();
    let count = units.len();
    let resp = rpc::call_configured("batch_register", serde_json::json!({ "units": units }))
        .await
        .map_err(String::from)?;

    state.clear();
    info!(count, "batch registered");

    Ok(serde_json::json!({
        "success": true,
        "count": count,
        "message": rpc::success_message(&resp, "Batch registered."),
    }))
}

// ---------------------------------------------------------------------------
// Transfer / return
// ---------------------------------------------------------------------------

/// Shape a per-scan result as a transient message. Backend-reported failure
/// is still a transient notice, not a command error; only transport failure
/// propagates as `Err`.
fn transient_result(result: Result<Value, RpcError>, ok_fallback: &str) -> Result<Value, String> {
    match result {
        Ok(resp) => Ok(serde_json::json!({
            "success": true,
            "message": rpc::success_message(&resp, ok_fallback),
            "dismissAfterMs": TRANSIENT_DISMISS_MS,
        })),
        Err(RpcError::Backend(message)) => Ok(serde_json::json!({
            "success": false,
            "message": message,
            "dismissAfterMs": TRANSIENT_DISMISS_MS,
        })),
        Err(e @ RpcError::Transport(_)) => Err(String::from(e)),
    }
}

/// Transfer one scanned unit to a destination branch.
pub async fn transfer(code: &str, to_branch: &str) -> Result<Value, String> {
    let code = code.trim();
    let to_branch = to_branch.trim();
    if to_branch.is_empty() {
        return Err("Select a destination branch".into());
    }
    if code.is_empty() {
        return Err("Scan a barcode first".into());
    }

    let result = rpc::call_configured(
        "transfer_stock",
        serde_json::json!({ "code": code, "toBranch": to_branch }),
    )
    .await;
    transient_result(result, "Transferred.")
}

/// The return reason must be entered before any scan is accepted.
pub fn validate_return_reason(reason: &str) -> Result<String, String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err("Enter a return reason before scanning".into());
    }
    Ok(reason.to_string())
}

/// Return one scanned unit with the entered reason note.
pub async fn return_stock(code: &str, reason: &str) -> Result<Value, String> {
    let reason = validate_return_reason(reason)?;
    let code = code.trim();
    if code.is_empty() {
        return Err("Scan a barcode first".into());
    }

    let result = rpc::call_configured(
        "return_stock",
        serde_json::json!({ "code": code, "reason": reason }),
    )
    .await;
    transient_result(result, "Returned.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(barcode: &str) -> PendingUnit {
        PendingUnit {
            model: format!("M-{barcode}"),
            serial: format!("S-{barcode}"),
            barcode: barcode.to_string(),
            supplier: "VendorA".into(),
        }
    }

    #[test]
    fn duplicate_barcode_is_rejected_without_changing_the_list() {
        let state = PendingBatchState::new();
        state.add(unit("B1")).unwrap();
        state.add(unit("B2")).unwrap();

        let err = state.add(unit("B1")).unwrap_err();
        assert!(err.contains("B1"));

        let rows: Vec<String> = state.rows().into_iter().map(|r| r.barcode).collect();
        assert_eq!(rows, vec!["B1", "B2"]);
    }

    #[test]
    fn remove_preserves_relative_order_of_the_rest() {
        let state = PendingBatchState::new();
        for b in ["B1", "B2", "B3", "B4"] {
            state.add(unit(b)).unwrap();
        }

        let rows = state.remove(1).unwrap();
        let barcodes: Vec<String> = rows.into_iter().map(|r| r.barcode).collect();
        assert_eq!(barcodes, vec!["B1", "B3", "B4"]);

        assert!(state.remove(10).is_err());
    }

    #[test]
    fn removed_barcode_can_be_scanned_again() {
        let state = PendingBatchState::new();
        state.add(unit("B1")).unwrap();
        state.remove(0).unwrap();
        assert!(state.add(unit("B1")).is_ok());
    }

    #[test]
    fn clear_empties_the_batch() {
        let state = PendingBatchState::new();
        state.add(unit("B1")).unwrap();
        assert!(state.clear().is_empty());
        assert!(state.is_empty());
    }

    #[test]
    fn return_reason_is_required_before_scanning() {
        assert!(validate_return_reason("   ").is_err());
        assert_eq!(validate_return_reason(" 고객 변심 ").unwrap(), "고객 변심");
    }

    #[test]
    fn backend_failure_is_a_transient_notice_not_an_error() {
        let out = transient_result(
            Err(RpcError::Backend("재고를 찾을 수 없습니다".into())),
            "Transferred.",
        )
        .unwrap();
        assert_eq!(out["success"], false);
        assert_eq!(out["message"], "재고를 찾을 수 없습니다");
        assert_eq!(out["dismissAfterMs"], TRANSIENT_DISMISS_MS);

        let err = transient_result(
            Err(RpcError::Transport("Connection timed out".into())),
            "Transferred.",
        )
        .unwrap_err();
        assert!(err.contains("timed out"));
    }
}
