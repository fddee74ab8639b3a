//! Stock and history search.
//!
//! Builds the filter payload (empty filters omitted), runs the search RPC,
//! and shapes the response rows into the flat table view-model the webview
//! binds. An empty result set is an explicit flag, mirrored from the
//! dashboard's empty-state handling.

use serde::Deserialize;
use serde_json::Value;

use crate::rpc;

/// Search filter inputs. All optional; blanks are dropped from the payload.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub branch: String,
    pub vendor: String,
    pub model: String,
    pub status: String,
    pub date_from: String,
    pub date_to: String,
    pub keyword: String,
}

/// Build the RPC payload, omitting empty filters entirely.
pub fn build_filter_payload(filters: &SearchFilters) -> Value {
    let mut obj = serde_json::Map::new();
    let mut put = |key: &str, value: &str| {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            obj.insert(key.to_string(), Value::String(trimmed.to_string()));
        }
    };
    put("branch", &filters.branch);
    put("vendor", &filters.vendor);
    put("model", &filters.model);
    put("status", &filters.status);
    put("dateFrom", &filters.date_from);
    put("dateTo", &filters.date_to);
    put("keyword", &filters.keyword);
    Value::Object(obj)
}

fn shape_result(resp: &Value) -> Value {
    let rows = resp
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    serde_json::json!({
        "success": true,
        "rowsEmpty": rows.is_empty(),
        "rows": rows,
    })
}

/// Search device inventory.
pub async fn search_stock(filters: &SearchFilters) -> Result<Value, String> {
    let resp = rpc::call_configured("search_stock", build_filter_payload(filters))
        .await
        .map_err(String::from)?;
    Ok(shape_result(&resp))
}

/// Search activation/stock movement history.
pub async fn search_history(filters: &SearchFilters) -> Result<Value, String> {
    let resp = rpc::call_configured("search_history", build_filter_payload(filters))
        .await
        .map_err(String::from)?;
    Ok(shape_result(&resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_are_omitted_from_the_payload() {
        let filters = SearchFilters {
            vendor: "SKT".into(),
            keyword: "  X1  ".into(),
            ..Default::default()
        };
        let payload = build_filter_payload(&filters);
        assert_eq!(
            payload,
            serde_json::json!({ "vendor": "SKT", "keyword": "X1" })
        );
    }

    #[test]
    fn all_blank_filters_yield_an_empty_object() {
        let payload = build_filter_payload(&SearchFilters::default());
        assert_eq!(payload, serde_json::json!({}));
    }

    #[test]
    fn shaped_result_flags_empty_row_sets() {
        let empty = shape_result(&serde_json::json!({ "status": "success", "data": [] }));
        assert_eq!(empty["rowsEmpty"], true);

        let rows = shape_result(&serde_json::json!({
            "status": "success",
            "data": [ { "serial": "SN001", "model": "X1" } ]
        }));
        assert_eq!(rows["rowsEmpty"], false);
        assert_eq!(rows["rows"][0]["serial"], "SN001");
    }
}
