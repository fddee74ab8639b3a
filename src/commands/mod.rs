//! IPC command handlers, grouped by area. Thin wrappers: payload parsing
//! here, behavior in the sibling top-level modules.

pub mod activation;
pub mod dashboard;
pub mod inventory;
pub mod refdata;
pub mod runtime;
pub mod search;
pub mod session;
pub mod settings;
pub mod views;

use serde_json::Value;

/// Extract a string argument that may arrive as a plain string or as an
/// object carrying it under one of `keys`.
pub(crate) fn arg_str(arg0: &Option<Value>, keys: &[&str]) -> Option<String> {
    match arg0 {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Value::Object(map)) => keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::arg_str;

    #[test]
    fn arg_str_accepts_string_and_object_shapes() {
        let from_string = arg_str(&Some(serde_json::json!("  SN001 ")), &["code"]);
        assert_eq!(from_string.as_deref(), Some("SN001"));

        let from_object = arg_str(
            &Some(serde_json::json!({ "code": "SN002" })),
            &["barcode", "code"],
        );
        assert_eq!(from_object.as_deref(), Some("SN002"));

        assert_eq!(arg_str(&Some(serde_json::json!("   ")), &["code"]), None);
        assert_eq!(arg_str(&None, &["code"]), None);
    }
}
