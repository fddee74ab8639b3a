//! View router.
//!
//! Exactly one top-level section is active at a time. Activating a section
//! yields a plan: which data refresh to run on entry and which input gets
//! initial focus. The command layer executes the refresh and emits a
//! `section_changed` event; the webview only shows/hides section containers
//! and moves focus. There are no history/back semantics and no guard against
//! leaving a section with unsaved input.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Top-level UI sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Dashboard,
    NewActivation,
    WiredActivation,
    UsedActivation,
    InventoryReceive,
    InventoryTransfer,
    InventoryReturn,
    StockSearch,
    HistorySearch,
    Vendors,
}

impl Section {
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim() {
            "dashboard" => Some(Self::Dashboard),
            "new-activation" => Some(Self::NewActivation),
            "wired-activation" => Some(Self::WiredActivation),
            "used-activation" => Some(Self::UsedActivation),
            "inventory-receive" => Some(Self::InventoryReceive),
            "inventory-transfer" => Some(Self::InventoryTransfer),
            "inventory-return" => Some(Self::InventoryReturn),
            "stock-search" => Some(Self::StockSearch),
            "history-search" => Some(Self::HistorySearch),
            "vendors" => Some(Self::Vendors),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::NewActivation => "new-activation",
            Self::WiredActivation => "wired-activation",
            Self::UsedActivation => "used-activation",
            Self::InventoryReceive => "inventory-receive",
            Self::InventoryTransfer => "inventory-transfer",
            Self::InventoryReturn => "inventory-return",
            Self::StockSearch => "stock-search",
            Self::HistorySearch => "history-search",
            Self::Vendors => "vendors",
        }
    }
}

/// Data refresh a section triggers on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshAction {
    ReferenceData,
    VendorList,
    Dashboard,
    SearchUi,
}

/// The result of activating a section.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationPlan {
    pub section: Section,
    pub refresh: Option<RefreshAction>,
    /// Element id of the section's primary input, if it has one.
    pub focus: Option<&'static str>,
}

/// Tauri managed state: the single active section.
pub struct ViewState {
    active: Mutex<Option<Section>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    pub fn active(&self) -> Option<Section> {
        *self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Deactivate whatever was showing, activate `section`, and return its plan.
pub fn activate(state: &ViewState, section: Section) -> ActivationPlan {
    {
        let mut active = state.active.lock().unwrap_or_else(|e| e.into_inner());
        *active = Some(section);
    }
    plan_for(section)
}

fn plan_for(section: Section) -> ActivationPlan {
    let (refresh, focus) = match section {
        Section::Dashboard => (Some(RefreshAction::Dashboard), None),
        Section::NewActivation => (Some(RefreshAction::ReferenceData), Some("open-scan-input")),
        Section::WiredActivation => (
            Some(RefreshAction::ReferenceData),
            Some("wired-contract-type"),
        ),
        Section::UsedActivation => (Some(RefreshAction::ReferenceData), Some("used-scan-input")),
        Section::InventoryReceive => (
            Some(RefreshAction::ReferenceData),
            Some("receive-scan-input"),
        ),
        Section::InventoryTransfer => (None, Some("transfer-scan-input")),
        Section::InventoryReturn => (None, Some("return-reason")),
        Section::StockSearch => (Some(RefreshAction::SearchUi), Some("stock-search-keyword")),
        Section::HistorySearch => (Some(RefreshAction::SearchUi), Some("history-search-keyword")),
        Section::Vendors => (Some(RefreshAction::VendorList), Some("vendor-name-input")),
    };
    ActivationPlan {
        section,
        refresh,
        focus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_replaces_the_single_active_section() {
        let state = ViewState::new();
        assert_eq!(state.active(), None);

        activate(&state, Section::Dashboard);
        assert_eq!(state.active(), Some(Section::Dashboard));

        activate(&state, Section::InventoryReturn);
        assert_eq!(state.active(), Some(Section::InventoryReturn));
    }

    #[test]
    fn section_ids_round_trip() {
        for section in [
            Section::Dashboard,
            Section::NewActivation,
            Section::WiredActivation,
            Section::UsedActivation,
            Section::InventoryReceive,
            Section::InventoryTransfer,
            Section::InventoryReturn,
            Section::StockSearch,
            Section::HistorySearch,
            Section::Vendors,
        ] {
            assert_eq!(Section::parse(section.id()), Some(section));
        }
        assert_eq!(Section::parse("settings"), None);
    }

    #[test]
    fn entry_refresh_hooks_match_sections() {
        assert_eq!(
            plan_for(Section::Dashboard).refresh,
            Some(RefreshAction::Dashboard)
        );
        assert_eq!(
            plan_for(Section::NewActivation).refresh,
            Some(RefreshAction::ReferenceData)
        );
        assert_eq!(
            plan_for(Section::Vendors).refresh,
            Some(RefreshAction::VendorList)
        );
        assert_eq!(plan_for(Section::InventoryTransfer).refresh, None);
        assert_eq!(
            plan_for(Section::InventoryReturn).focus,
            Some("return-reason")
        );
    }
}
