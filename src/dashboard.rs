//! Dashboard view-model builder.
//!
//! `render` is a pure function from the `get_dashboard_data` aggregate
//! payload to the view-model the webview binds: today's counters, per-branch
//! monthly counts, today's activation list with display margins, and the
//! per-user monthly ranking with proportional bar widths. All empty states
//! are explicit flags so the renderer never divides by zero or silently
//! shows a blank table.

use serde::Serialize;
use serde_json::Value;

use crate::rpc;

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRow {
    pub branch: String,
    pub mobile: u64,
    pub wired: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRow {
    pub customer: String,
    pub model: String,
    pub vendor: String,
    /// floor(margin), thousands-separated.
    pub margin_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingBar {
    pub name: String,
    pub count: u64,
    /// count / max_count * 100.
    pub width_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub today_mobile: u64,
    pub today_wired: u64,
    pub branches: Vec<BranchRow>,
    pub branches_empty: bool,
    pub activations: Vec<ActivationRow>,
    pub activations_empty: bool,
    pub ranking: Vec<RankingBar>,
    pub ranking_empty: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format an integer with thousands separators: 1234567 -> "1,234,567".
pub fn format_thousands(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

/// Display value for a margin: floor, then thousands separators.
pub fn margin_display(margin: f64) -> String {
    format_thousands(margin.floor() as i64)
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Counts may arrive as integers or floats depending on the backend's JSON
/// encoder; negative or missing values read as zero.
fn count_field(v: &Value, key: &str) -> u64 {
    v.get(key)
        .and_then(|c| {
            c.as_u64()
                .or_else(|| c.as_f64().map(|f| f.max(0.0) as u64))
        })
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// Build the ranking bars. Widths are proportional to the top performer's
/// count; an empty list sets the empty-state flag and no division occurs.
fn render_ranking(entries: &[Value]) -> Vec<RankingBar> {
    let counts: Vec<(String, u64)> = entries
        .iter()
        .map(|e| (str_field(e, "name"), count_field(e, "count")))
        .collect();

    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    counts
        .into_iter()
        .map(|(name, count)| {
            let width_pct = if max == 0 {
                0.0
            } else {
                count as f64 / max as f64 * 100.0
            };
            RankingBar {
                name,
                count,
                width_pct,
            }
        })
        .collect()
}

/// Map the aggregate payload to the dashboard view-model. Pure.
pub fn render(data: &Value) -> DashboardView {
    let today = data.get("today").cloned().unwrap_or(Value::Null);

    let branches: Vec<BranchRow> = data
        .get("monthlyByBranch")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|b| BranchRow {
                    branch: str_field(b, "branch"),
                    mobile: count_field(b, "mobile"),
                    wired: count_field(b, "wired"),
                })
                .collect()
        })
        .unwrap_or_default();

    let activations: Vec<ActivationRow> = data
        .get("todayActivations")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|a| ActivationRow {
                    customer: str_field(a, "customer"),
                    model: str_field(a, "model"),
                    vendor: str_field(a, "vendor"),
                    margin_display: margin_display(
                        a.get("margin").and_then(Value::as_f64).unwrap_or(0.0),
                    ),
                })
                .collect()
        })
        .unwrap_or_default();

    let ranking_entries = data
        .get("monthlyRanking")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let ranking = render_ranking(&ranking_entries);

    DashboardView {
        today_mobile: count_field(&today, "mobile"),
        today_wired: count_field(&today, "wired"),
        branches_empty: branches.is_empty(),
        branches,
        activations_empty: activations.is_empty(),
        activations,
        ranking_empty: ranking.is_empty(),
        ranking,
    }
}

/// Fetch the aggregates and render them.
pub async fn load() -> Result<Value, String> {
    let resp = rpc::call_configured("get_dashboard_data", Value::Null)
        .await
        .map_err(String::from)?;
    let data = resp.get("data").cloned().unwrap_or(Value::Null);
    let view = render(&data);
    serde_json::to_value(view).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-45_000), "-45,000");
    }

    #[test]
    fn margin_is_floored_before_formatting() {
        assert_eq!(margin_display(125_000.9), "125,000");
        assert_eq!(margin_display(999.0), "999");
    }

    #[test]
    fn ranking_bars_are_proportional_to_the_top_performer() {
        let entries = vec![
            serde_json::json!({ "name": "Kim", "count": 20 }),
            serde_json::json!({ "name": "Lee", "count": 10 }),
            serde_json::json!({ "name": "Park", "count": 5 }),
        ];
        let bars = render_ranking(&entries);
        assert_eq!(bars[0].width_pct, 100.0);
        assert_eq!(bars[1].width_pct, 50.0);
        assert_eq!(bars[2].width_pct, 25.0);
    }

    #[test]
    fn empty_ranking_sets_the_flag_and_divides_nothing() {
        let view = render(&serde_json::json!({ "monthlyRanking": [] }));
        assert!(view.ranking_empty);
        assert!(view.ranking.is_empty());
    }

    #[test]
    fn float_encoded_counts_still_count() {
        let entries = vec![
            serde_json::json!({ "name": "Kim", "count": 12.0 }),
            serde_json::json!({ "name": "Lee", "count": 6 }),
        ];
        let bars = render_ranking(&entries);
        assert_eq!(bars[0].count, 12);
        assert_eq!(bars[0].width_pct, 100.0);
        assert_eq!(bars[1].width_pct, 50.0);

        let view = render(&serde_json::json!({ "today": { "mobile": 7.0, "wired": 2 } }));
        assert_eq!(view.today_mobile, 7);
    }

    #[test]
    fn all_zero_counts_render_zero_width_bars() {
        let entries = vec![serde_json::json!({ "name": "Kim", "count": 0 })];
        let bars = render_ranking(&entries);
        assert_eq!(bars[0].width_pct, 0.0);
    }

    #[test]
    fn full_payload_renders_every_widget() {
        let data = serde_json::json!({
            "today": { "mobile": 7, "wired": 2 },
            "monthlyByBranch": [
                { "branch": "본점", "mobile": 40, "wired": 11 }
            ],
            "todayActivations": [
                { "customer": "홍길동", "model": "X1", "vendor": "SKT", "margin": 125000.75 }
            ],
            "monthlyRanking": [
                { "name": "Kim", "count": 12 }
            ]
        });

        let view = render(&data);
        assert_eq!(view.today_mobile, 7);
        assert_eq!(view.today_wired, 2);
        assert_eq!(view.branches[0].branch, "본점");
        assert!(!view.branches_empty);
        assert_eq!(view.activations[0].margin_display, "125,000");
        assert_eq!(view.ranking[0].width_pct, 100.0);
    }

    #[test]
    fn missing_sections_render_empty_states() {
        let view = render(&serde_json::json!({}));
        assert!(view.branches_empty);
        assert!(view.activations_empty);
        assert!(view.ranking_empty);
        assert_eq!(view.today_mobile, 0);
    }
}
