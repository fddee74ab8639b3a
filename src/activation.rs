//! Activation workflows: new mobile, wired/internet, used device.
//!
//! Each workflow is a two-step form. Step 1 identifies the subject (a scanned
//! device for the scan-driven flows, contract selection for wired); Step 2
//! collects the customer details. Validation runs entirely client-side, in a
//! fixed left-to-right order, and the first missing field aborts submission
//! before any network call — the webview focuses the reported field. The
//! final submit assembles one flat payload and sends it as a single RPC
//! tagged with the workflow's action name.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Mutex;
use tracing::info;

use crate::rpc;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sentinel visit-path value that requires the companion free-text field.
pub const VISIT_PATH_OTHER: &str = "기타";

/// Separator joining the wired price-plan fields.
const PLAN_SEPARATOR: &str = " / ";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The three activation workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    NewMobile,
    Wired,
    UsedDevice,
}

impl Workflow {
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim() {
            "new" | "new-mobile" => Some(Self::NewMobile),
            "wired" => Some(Self::Wired),
            "used" | "used-device" => Some(Self::UsedDevice),
            _ => None,
        }
    }

    /// The RPC action submitting this workflow.
    pub fn action(&self) -> &'static str {
        match self {
            Self::NewMobile => "open_stock_full",
            Self::Wired => "open_wired_full",
            Self::UsedDevice => "open_used_full",
        }
    }

    /// Scan-driven workflows require a successful stock lookup before Step 2
    /// can be submitted.
    pub fn is_scan_driven(&self) -> bool {
        matches!(self, Self::NewMobile | Self::UsedDevice)
    }
}

/// The result of a successful stock lookup, held as a scratch record until
/// the activation for that device is submitted or the flow is reset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScannedDevice {
    pub model: String,
    pub color: String,
    pub serial: String,
    pub supplier: String,
}

impl ScannedDevice {
    /// Display summary shown in the read-only Step-2 header: "X1 (Black)".
    pub fn summary(&self) -> String {
        if self.color.trim().is_empty() {
            self.model.clone()
        } else {
            format!("{} ({})", self.model, self.color)
        }
    }
}

struct ScanContext {
    workflow: Workflow,
    device: ScannedDevice,
}

/// Tauri managed state for the activation flows. At most one in-progress
/// scanned device exists at a time; a new successful scan replaces it.
pub struct ActivationState {
    scratch: Mutex<Option<ScanContext>>,
}

impl ActivationState {
    pub fn new() -> Self {
        Self {
            scratch: Mutex::new(None),
        }
    }

    fn device_for(&self, workflow: Workflow) -> Option<ScannedDevice> {
        let scratch = self.scratch.lock().unwrap_or_else(|e| e.into_inner());
        scratch
            .as_ref()
            .filter(|c| c.workflow == workflow)
            .map(|c| c.device.clone())
    }

    fn has_device_for(&self, workflow: Workflow) -> bool {
        self.device_for(workflow).is_some()
    }

    fn clear(&self) {
        let mut scratch = self.scratch.lock().unwrap_or_else(|e| e.into_inner());
        *scratch = None;
    }
}

impl Default for ActivationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Step-2 form values. One flat record per workflow; fields not shown by a
/// given workflow simply arrive empty.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationForm {
    pub branch: String,
    pub vendor: String,
    pub activation_type: String,
    pub contract_type: String,
    pub visit_path: String,
    pub visit_path_other: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_birth: String,
    pub review: String,
    pub sim_option: String,
    pub payment_method: String,
    pub collection_method: String,
    pub plan_internet: String,
    pub plan_tv: String,
    pub plan_extra: String,
    pub device_price: String,
    pub monthly_fee: String,
    pub memo: String,
    pub addons: Vec<String>,
}

/// A failed required-field check: which input to focus and what to tell the
/// user. Resolved entirely client-side, no network round trip.
#[derive(Debug, PartialEq, Eq)]
pub struct MissingField {
    pub field: &'static str,
    pub message: String,
}

impl MissingField {
    fn new(field: &'static str, label: &str) -> Self {
        Self {
            field,
            message: format!("{label} is required"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Resolve the submitted visit-path value, enforcing the "기타" companion
/// field: selecting the sentinel with empty companion text aborts; with text
/// the two are concatenated as `"기타: <text>"`.
pub fn resolve_visit_path(form: &ActivationForm) -> Result<String, MissingField> {
    let visit_path = form.visit_path.trim();
    if visit_path.is_empty() {
        return Err(MissingField::new("visit-path", "Visit path"));
    }
    if visit_path == VISIT_PATH_OTHER {
        let other = form.visit_path_other.trim();
        if other.is_empty() {
            return Err(MissingField::new("visit-path-other", "Visit path detail"));
        }
        return Ok(format!("{VISIT_PATH_OTHER}: {other}"));
    }
    Ok(visit_path.to_string())
}

/// Check the required fields strictly in the documented left-to-right order:
/// visit path (with its companion), customer name, review status, and — for
/// scan-driven workflows — a prior successful scan. Returns the resolved
/// visit-path value on success.
pub fn validate_step2(
    form: &ActivationForm,
    workflow: Workflow,
    has_scan: bool,
) -> Result<String, MissingField> {
    let visit_path = resolve_visit_path(form)?;

    if form.customer_name.trim().is_empty() {
        return Err(MissingField::new("customer-name", "Customer name"));
    }
    if form.review.trim().is_empty() {
        return Err(MissingField::new("review", "Review status"));
    }
    if workflow.is_scan_driven() && !has_scan {
        return Err(MissingField {
            field: "scan-input",
            message: "Scan a device before submitting".into(),
        });
    }

    Ok(visit_path)
}

// ---------------------------------------------------------------------------
// Wired price plan
// ---------------------------------------------------------------------------

/// The price-plan section layout, shaped by the selected contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanLayout {
    InternetOnly,
    InternetTv,
    InternetTvExtra,
}

impl PlanLayout {
    /// Layout for a contract-type option. The backend-supplied option text
    /// drives this: anything naming an extra bundled service gets the full
    /// layout, anything naming TV gets internet+TV, the rest internet-only.
    pub fn for_contract(contract_type: &str) -> Self {
        let t = contract_type.trim();
        if t.contains("기타") || t.contains("결합") {
            Self::InternetTvExtra
        } else if t.contains("TV") || t.contains("tv") {
            Self::InternetTv
        } else {
            Self::InternetOnly
        }
    }
}

/// Join the layout's non-empty plan fields with the separator, in fixed
/// field order (internet, TV, extra).
pub fn wired_price_plan(form: &ActivationForm) -> String {
    let layout = PlanLayout::for_contract(&form.contract_type);
    let fields: &[&str] = match layout {
        PlanLayout::InternetOnly => &[&form.plan_internet],
        PlanLayout::InternetTv => &[&form.plan_internet, &form.plan_tv],
        PlanLayout::InternetTvExtra => &[&form.plan_internet, &form.plan_tv, &form.plan_extra],
    };
    fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(PLAN_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Scan lookup (Step 1)
// ---------------------------------------------------------------------------

fn parse_scanned_device(resp: &Value) -> Option<ScannedDevice> {
    let data = resp.get("data")?;
    let field = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let device = ScannedDevice {
        model: field("model"),
        color: field("color"),
        serial: field("serial"),
        supplier: field("supplier"),
    };
    if device.model.is_empty() && device.serial.is_empty() {
        return None;
    }
    Some(device)
}

/// Apply a lookup response: parse the device and install it as the scratch
/// record, replacing any previous one. A response with no device leaves the
/// existing scratch untouched so an earlier successful scan survives a
/// mis-scan.
fn install_scan(
    state: &ActivationState,
    workflow: Workflow,
    resp: &Value,
) -> Result<Value, String> {
    let device =
        parse_scanned_device(resp).ok_or_else(|| "Stock lookup returned no device".to_string())?;

    info!(serial = %device.serial, model = %device.model, "stock lookup succeeded");

    let summary = device.summary();
    let vendor_prefill = device.supplier.clone();
    {
        let mut scratch = state.scratch.lock().unwrap_or_else(|e| e.into_inner());
        *scratch = Some(ScanContext {
            workflow,
            device: device.clone(),
        });
    }

    Ok(serde_json::json!({
        "success": true,
        "summary": summary,
        "vendor": vendor_prefill,
        "device": device,
    }))
}

/// Look up a scanned barcode/serial for activation. On success the scratch
/// record is installed (replacing any previous one) and the webview advances
/// to Step 2 with the device summary and vendor pre-fill. On failure the
/// backend's message is returned verbatim and the input re-armed for another
/// attempt; any scratch record from an earlier scan is kept.
pub async fn scan_lookup(
    state: &ActivationState,
    workflow: Workflow,
    code: &str,
) -> Result<Value, String> {
    let code = code.trim();
    if code.is_empty() {
        return Err("Scan a barcode or serial number".into());
    }

    let resp = rpc::call_configured("get_stock_info_for_open", serde_json::json!({ "code": code }))
        .await
        .map_err(String::from)?;

    install_scan(state, workflow, &resp)
}

// ---------------------------------------------------------------------------
// Submit (Step 2)
// ---------------------------------------------------------------------------

/// Assemble the flat submission payload from Step-1 context and Step-2
/// fields. Pure; the add-on checkbox group keeps its checked order.
pub fn build_payload(
    workflow: Workflow,
    form: &ActivationForm,
    visit_path: &str,
    device: Option<&ScannedDevice>,
    opened_by: Option<&str>,
) -> Value {
    let mut payload = serde_json::json!({
        "branch": form.branch.trim(),
        "vendor": form.vendor.trim(),
        "activationType": form.activation_type.trim(),
        "visitPath": visit_path,
        "customerName": form.customer_name.trim(),
        "customerPhone": form.customer_phone.trim(),
        "customerBirth": form.customer_birth.trim(),
        "review": form.review.trim(),
        "simOption": form.sim_option.trim(),
        "paymentMethod": form.payment_method.trim(),
        "collectionMethod": form.collection_method.trim(),
        "devicePrice": form.device_price.trim(),
        "monthlyFee": form.monthly_fee.trim(),
        "memo": form.memo.trim(),
        "addons": form.addons,
        "openedBy": opened_by.unwrap_or_default(),
    });

    if let Some(device) = device {
        payload["model"] = Value::String(device.model.clone());
        payload["color"] = Value::String(device.color.clone());
        payload["serial"] = Value::String(device.serial.clone());
        payload["supplier"] = Value::String(device.supplier.clone());
    }

    if workflow == Workflow::Wired {
        payload["contractType"] = Value::String(form.contract_type.trim().to_string());
        payload["pricePlan"] = Value::String(wired_price_plan(form));
    }

    payload
}

/// Submit Step 2. Validation failures return `success: false` with the field
/// to focus, before any network call. On backend success the scratch is
/// cleared and the form resets to Step 1; on backend or transport failure
/// the error message is returned and form state survives for retry.
pub async fn submit(
    state: &ActivationState,
    workflow: Workflow,
    form: ActivationForm,
    opened_by: Option<String>,
) -> Result<Value, String> {
    let has_scan = state.has_device_for(workflow);
    let visit_path = match validate_step2(&form, workflow, has_scan) {
        Ok(v) => v,
        Err(missing) => {
            return Ok(serde_json::json!({
                "success": false,
                "field": missing.field,
                "message": missing.message,
            }));
        }
    };

    let device = state.device_for(workflow);
    let payload = build_payload(
        workflow,
        &form,
        &visit_path,
        device.as_ref(),
        opened_by.as_deref(),
    );

    let resp = rpc::call_configured(workflow.action(), payload)
        .await
        .map_err(String::from)?;

    // Backend success: reset the flow to Step 1.
    state.clear();
    info!(action = workflow.action(), "activation recorded");

    Ok(serde_json::json!({
        "success": true,
        "reset": true,
        "message": rpc::success_message(&resp, "Activation recorded."),
    }))
}

/// Return to Step 1: drop the scratch record. The webview clears its own
/// inputs and restores initial focus.
pub fn reset(state: &ActivationState) -> Value {
    state.clear();
    serde_json::json!({ "success": true })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ActivationForm {
        ActivationForm {
            visit_path: "매장방문".into(),
            customer_name: "홍길동".into(),
            review: "작성".into(),
            ..Default::default()
        }
    }

    fn scanned_x1() -> ScannedDevice {
        ScannedDevice {
            model: "X1".into(),
            color: "Black".into(),
            serial: "SN001".into(),
            supplier: "VendorA".into(),
        }
    }

    #[test]
    fn required_fields_checked_in_documented_order() {
        let empty = ActivationForm::default();
        let err = validate_step2(&empty, Workflow::NewMobile, true).unwrap_err();
        assert_eq!(err.field, "visit-path");

        let mut form = ActivationForm {
            visit_path: "매장방문".into(),
            ..Default::default()
        };
        let err = validate_step2(&form, Workflow::NewMobile, true).unwrap_err();
        assert_eq!(err.field, "customer-name");

        form.customer_name = "홍길동".into();
        let err = validate_step2(&form, Workflow::NewMobile, true).unwrap_err();
        assert_eq!(err.field, "review");

        form.review = "작성".into();
        let err = validate_step2(&form, Workflow::NewMobile, false).unwrap_err();
        assert_eq!(err.field, "scan-input");

        assert!(validate_step2(&form, Workflow::NewMobile, true).is_ok());
    }

    #[test]
    fn wired_flow_needs_no_scan() {
        let form = valid_form();
        assert!(validate_step2(&form, Workflow::Wired, false).is_ok());
    }

    #[test]
    fn other_visit_path_requires_companion_text() {
        let mut form = valid_form();
        form.visit_path = VISIT_PATH_OTHER.into();

        let err = validate_step2(&form, Workflow::Wired, false).unwrap_err();
        assert_eq!(err.field, "visit-path-other");

        form.visit_path_other = "지인 소개".into();
        let resolved = validate_step2(&form, Workflow::Wired, false).unwrap();
        assert_eq!(resolved, "기타: 지인 소개");
    }

    #[test]
    fn plan_layouts_follow_contract_type() {
        assert_eq!(PlanLayout::for_contract("인터넷"), PlanLayout::InternetOnly);
        assert_eq!(PlanLayout::for_contract("인터넷+TV"), PlanLayout::InternetTv);
        assert_eq!(
            PlanLayout::for_contract("인터넷+TV+기타"),
            PlanLayout::InternetTvExtra
        );
    }

    #[test]
    fn price_plan_joins_nonempty_fields_in_fixed_order() {
        let form = ActivationForm {
            contract_type: "인터넷+TV+기타".into(),
            plan_internet: "기가 500M".into(),
            plan_tv: "".into(),
            plan_extra: "IoT 베이직".into(),
            ..Default::default()
        };
        assert_eq!(wired_price_plan(&form), "기가 500M / IoT 베이직");

        let tv_only_layout = ActivationForm {
            contract_type: "인터넷+TV".into(),
            plan_internet: "기가 1G".into(),
            plan_tv: "베이직 TV".into(),
            // Hidden by the layout, must not leak into the joined value.
            plan_extra: "IoT 베이직".into(),
            ..Default::default()
        };
        assert_eq!(wired_price_plan(&tv_only_layout), "기가 1G / 베이직 TV");
    }

    #[test]
    fn scan_summary_shows_model_and_color() {
        assert_eq!(scanned_x1().summary(), "X1 (Black)");
        let no_color = ScannedDevice {
            color: "".into(),
            ..scanned_x1()
        };
        assert_eq!(no_color.summary(), "X1");
    }

    #[test]
    fn parse_scanned_device_from_lookup_response() {
        let resp = serde_json::json!({
            "status": "success",
            "data": { "model": "X1", "color": "Black", "serial": "SN001", "supplier": "VendorA" }
        });
        let device = parse_scanned_device(&resp).expect("device parses");
        assert_eq!(device.summary(), "X1 (Black)");
        assert_eq!(device.supplier, "VendorA");

        let empty = serde_json::json!({ "status": "success", "data": {} });
        assert!(parse_scanned_device(&empty).is_none());
    }

    #[test]
    fn build_payload_carries_scan_context_and_addon_order() {
        let mut form = valid_form();
        form.vendor = "VendorA".into();
        form.addons = vec!["안심보험".into(), "기기보험".into()];

        let device = scanned_x1();
        let payload = build_payload(
            Workflow::NewMobile,
            &form,
            "매장방문",
            Some(&device),
            Some("kim@shop.example"),
        );

        assert_eq!(payload["serial"], "SN001");
        assert_eq!(payload["supplier"], "VendorA");
        assert_eq!(
            payload["addons"],
            serde_json::json!(["안심보험", "기기보험"])
        );
        assert_eq!(payload["openedBy"], "kim@shop.example");
        assert!(payload.get("pricePlan").is_none());
    }

    #[test]
    fn wired_payload_includes_joined_price_plan() {
        let mut form = valid_form();
        form.contract_type = "인터넷+TV".into();
        form.plan_internet = "기가 500M".into();
        form.plan_tv = "베이직 TV".into();

        let payload = build_payload(Workflow::Wired, &form, "매장방문", None, None);
        assert_eq!(payload["pricePlan"], "기가 500M / 베이직 TV");
        assert_eq!(payload["contractType"], "인터넷+TV");
    }

    fn lookup_resp(serial: &str, model: &str) -> Value {
        serde_json::json!({
            "status": "success",
            "data": { "model": model, "color": "Black", "serial": serial, "supplier": "VendorA" }
        })
    }

    #[test]
    fn new_scan_replaces_previous_scratch_record() {
        let state = ActivationState::new();
        install_scan(&state, Workflow::NewMobile, &lookup_resp("SN001", "X1")).unwrap();
        install_scan(&state, Workflow::NewMobile, &lookup_resp("SN002", "X2")).unwrap();

        let device = state.device_for(Workflow::NewMobile).unwrap();
        assert_eq!(device.serial, "SN002");
    }

    #[test]
    fn failed_lookup_keeps_the_previous_scratch_record() {
        let state = ActivationState::new();
        install_scan(&state, Workflow::NewMobile, &lookup_resp("SN001", "X1")).unwrap();

        let no_device = serde_json::json!({ "status": "success", "data": {} });
        assert!(install_scan(&state, Workflow::NewMobile, &no_device).is_err());

        let device = state.device_for(Workflow::NewMobile).unwrap();
        assert_eq!(device.serial, "SN001");
    }

    #[test]
    fn scratch_is_scoped_to_its_workflow() {
        let state = ActivationState::new();
        {
            let mut scratch = state.scratch.lock().unwrap();
            *scratch = Some(ScanContext {
                workflow: Workflow::UsedDevice,
                device: scanned_x1(),
            });
        }
        assert!(!state.has_device_for(Workflow::NewMobile));
        assert!(state.has_device_for(Workflow::UsedDevice));
    }
}
