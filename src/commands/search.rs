use serde_json::Value;

use crate::search::{self, SearchFilters};

fn parse_filters(arg0: Option<Value>) -> Result<SearchFilters, String> {
    match arg0 {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid search filters: {e}")),
        None => Ok(SearchFilters::default()),
    }
}

#[tauri::command]
pub async fn search_stock(arg0: Option<Value>) -> Result<Value, String> {
    let filters = parse_filters(arg0)?;
    search::search_stock(&filters).await
}

#[tauri::command]
pub async fn search_history(arg0: Option<Value>) -> Result<Value, String> {
    let filters = parse_filters(arg0)?;
    search::search_history(&filters).await
}
