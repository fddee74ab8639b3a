//! Phone Shop Desk - Tauri v2 Backend
//!
//! Store operations terminal for a mobile-phone retail shop: staff sign in,
//! record activations (new mobile, wired, used device), manage device
//! inventory, and view the daily/monthly sales dashboard. The Rust side owns
//! session state, view routing, reference-data caching, form validation, and
//! all backend RPC orchestration; the webview invokes the IPC commands
//! registered here and only renders.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod activation;
mod commands;
mod dashboard;
mod diagnostics;
mod inventory;
mod refdata;
mod rpc;
mod search;
mod session;
mod storage;
mod views;

pub fn run() {
    // Initialize structured logging (console + rolling file)
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,phone_shop_desk_lib=debug"));

    // Prune old log files before setting up the appender
    diagnostics::prune_old_logs();

    let log_dir = diagnostics::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "desk");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the app — dropping it flushes
    // logs. We leak it intentionally since the app runs until process exit.
    std::mem::forget(_guard);

    info!("Starting Phone Shop Desk v{}", env!("CARGO_PKG_VERSION"));

    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            app.manage(session::SessionState::new());
            app.manage(views::ViewState::new());
            app.manage(refdata::RefDataState::new());
            app.manage(activation::ActivationState::new());
            app.manage(inventory::PendingBatchState::new());

            // Restore a persisted identity so a restart does not force
            // re-login; this also re-arms the idle watcher.
            let restored = session::restore(
                &app.state::<session::SessionState>(),
                &app.handle().clone(),
            );
            if !restored.is_null() {
                info!("restored persisted session identity");
            }

            // Warm the reference-data cache on startup so the first form
            // entry does not start from empty lists.
            if storage::is_configured() {
                let startup_app = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    let state = startup_app.state::<refdata::RefDataState>();
                    let summary = refdata::refresh(&state).await;
                    info!(
                        success = summary["success"].as_bool().unwrap_or(false),
                        "startup reference-data warm-up finished"
                    );
                });
            }

            info!("Session, view, and reference-data state registered");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Session
            commands::session::session_login,
            commands::session::session_logout,
            commands::session::session_restore,
            commands::session::session_get_current,
            commands::session::session_get_stats,
            commands::session::session_track_activity,
            // View router
            commands::views::view_activate,
            commands::views::view_get_active,
            // Reference data / vendors
            commands::refdata::refdata_refresh,
            commands::refdata::refdata_get_snapshot,
            commands::refdata::refdata_addons_for_vendor,
            commands::refdata::vendor_add,
            commands::refdata::vendor_delete,
            // Activations
            commands::activation::activation_scan,
            commands::activation::activation_submit,
            commands::activation::activation_reset,
            // Inventory
            commands::inventory::inventory_register_single,
            commands::inventory::inventory_preview_scan,
            commands::inventory::inventory_batch_rows,
            commands::inventory::inventory_batch_remove,
            commands::inventory::inventory_batch_clear,
            commands::inventory::inventory_batch_commit,
            commands::inventory::inventory_transfer,
            commands::inventory::inventory_return,
            // Dashboard
            commands::dashboard::dashboard_load,
            // Search
            commands::search::search_stock,
            commands::search::search_history,
            // Settings
            commands::settings::settings_is_configured,
            commands::settings::settings_get_full_config,
            commands::settings::settings_update_terminal,
            commands::settings::settings_clear_connection,
            // Runtime
            commands::runtime::app_get_version,
            commands::runtime::diagnostics_get_about,
        ])
        .run(tauri::generate_context!())
        .expect("error while running Phone Shop Desk");
}
