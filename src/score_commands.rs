use crate::catalog::maybe_refresh_catalog;
use crate::config::load_config_inner;
use crate::leaderboard::{distinct_categories, load_scores};
use crate::types::*;
use tauri::State;

// ── Commands ────────────────────────────────────────────────────────────

/// Fresh leaderboard read. Every call hits the ledger again, so the view's
/// manual refresh is just a repeat invocation.
#[tauri::command]
pub fn leaderboard_scores(
    category: Option<String>,
    catalog: State<'_, SharedCatalog>,
) -> Result<Vec<EnrichedScore>, String> {
    let config = load_config_inner()?;
    let entries = maybe_refresh_catalog(&config, &catalog, false);
    let category = category.unwrap_or_else(|| "all".to_string());
    Ok(load_scores(&config, &category, &entries))
}

#[tauri::command]
pub fn list_score_categories(catalog: State<'_, SharedCatalog>) -> Result<Vec<String>, String> {
    let config = load_config_inner()?;
    let entries = maybe_refresh_catalog(&config, &catalog, false);
    Ok(distinct_categories(&entries))
}
