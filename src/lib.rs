pub mod types;
pub mod config;
pub mod catalog;
pub mod tags;
pub mod tournament;
pub mod ledger;
pub mod leaderboard;
pub mod tournament_commands;
pub mod score_commands;

use catalog::{catalog_snapshot_from_store, maybe_refresh_catalog};
use config::*;
use leaderboard::maybe_refresh_leaderboard;
use types::*;

use axum::{
    extract::State as AxumState,
    response::IntoResponse,
    routing::{get, get_service},
    Router,
};
use std::{
    fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tauri::{Emitter, State};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── Config commands ────────────────────────────────────────────────────

#[tauri::command]
fn load_config() -> Result<AppConfig, String> {
    load_config_inner()
}

#[tauri::command]
fn save_config(config: AppConfig) -> Result<AppConfig, String> {
    save_config_inner(config)
}

// ── Catalog command ────────────────────────────────────────────────────

#[tauri::command]
fn catalog_snapshot(
    force: Option<bool>,
    catalog: State<'_, SharedCatalog>,
) -> Result<CatalogSnapshot, String> {
    let config = load_config_inner()?;
    maybe_refresh_catalog(&config, &catalog, force.unwrap_or(false));
    Ok(catalog_snapshot_from_store(&catalog))
}

// ── Readiness signal ───────────────────────────────────────────────────

static READY_SIGNALED: AtomicBool = AtomicBool::new(false);

/// First caller claims the ready flag; everyone after sees it set.
fn try_mark_ready() -> bool {
    !READY_SIGNALED.swap(true, Ordering::SeqCst)
}

/// Tell the shell the backend is up. Invoked once from `run`; repeat
/// calls are no-ops so the signal cannot fire twice.
fn signal_app_ready(app: &tauri::AppHandle) {
    if !try_mark_ready() {
        return;
    }
    match app.emit("app-ready", ()) {
        Ok(()) => info!("app ready signal sent"),
        Err(e) => error!("app ready signal failed: {e}"),
    }
}

// ── Leaderboard overlay server ─────────────────────────────────────────

fn resolve_overlay_dir() -> PathBuf {
    if let Some(raw) = env_default("OVERLAY_DIR") {
        resolve_repo_path(&raw)
    } else {
        repo_root().join("ui")
    }
}

fn overlay_router(state: OverlayServerState, static_dir: PathBuf) -> Router {
    let static_files = get_service(ServeDir::new(static_dir));

    Router::new()
        .route("/state.json", get(get_leaderboard_state_json))
        .nest_service("/", static_files)
        .with_state(state)
}

async fn start_overlay_server(state: OverlayServerState, static_dir: PathBuf, addr: &str) {
    let app = overlay_router(state, static_dir);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("leaderboard overlay server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("leaderboard overlay server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("leaderboard overlay server error: {e}");
    }
}

async fn get_leaderboard_state_json(
    AxumState(state): AxumState<OverlayServerState>,
) -> impl IntoResponse {
    let worker_state = state.clone();
    // The ledger client is blocking; keep it off the async workers.
    let snapshot = tokio::task::spawn_blocking(move || {
        let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
        let entries = maybe_refresh_catalog(&config, &worker_state.catalog, false);
        let scores =
            maybe_refresh_leaderboard(&config, &worker_state.leaderboard, &entries, false);
        let last_error = {
            let guard = worker_state
                .leaderboard
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            guard.last_error.clone()
        };
        LeaderboardSnapshot {
            scores,
            last_error,
            generated_at_ms: now_ms(),
        }
    })
    .await
    .unwrap_or_else(|e| LeaderboardSnapshot {
        scores: Vec::new(),
        last_error: Some(format!("leaderboard refresh task failed: {e}")),
        generated_at_ms: now_ms(),
    });

    let body = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    (
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
}

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() {
    load_env_file();

    // Initialize tracing with file + stderr output
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("SwipeCast starting");
    log_env_warnings();

    let catalog: SharedCatalog = Arc::new(Mutex::new(CatalogStore::default()));
    let tournament: SharedTournament = Arc::new(Mutex::new(tournament::Tournament::new()));
    let leaderboard: SharedLeaderboard = Arc::new(Mutex::new(LeaderboardState::default()));
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(catalog.clone())
        .manage(tournament.clone())
        .manage(leaderboard.clone())
        .setup(move |app| {
            let overlay_state = OverlayServerState {
                catalog: catalog.clone(),
                leaderboard: leaderboard.clone(),
            };
            tauri::async_runtime::spawn(start_overlay_server(
                overlay_state,
                resolve_overlay_dir(),
                OVERLAY_ADDR,
            ));

            signal_app_ready(app.handle());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_config,
            save_config,
            catalog_snapshot,
            tournament_commands::list_eligible_tags,
            tournament_commands::tournament_state,
            tournament_commands::tournament_start,
            tournament_commands::tournament_choose,
            tournament_commands::tournament_restart,
            tournament_commands::tournament_reset,
            score_commands::leaderboard_scores,
            score_commands::list_score_categories
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri app")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_signal_fires_once() {
        assert!(try_mark_ready());
        assert!(!try_mark_ready());
    }
}
