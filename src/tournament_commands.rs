use crate::catalog::maybe_refresh_catalog;
use crate::config::load_config_inner;
use crate::ledger::submit_winner_score;
use crate::tags::eligible_tags;
use crate::tournament::{ChoiceOutcome, Tournament, TournamentSnapshot};
use crate::types::*;
use tauri::State;
use tracing::info;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Lock the tournament mutex and call `f` with the engine.
fn with_tournament<F, R>(tournament: &State<'_, SharedTournament>, f: F) -> Result<R, String>
where
    F: FnOnce(&mut Tournament) -> Result<R, String>,
{
    let mut guard = tournament.lock().map_err(|e| e.to_string())?;
    f(&mut guard)
}

fn current_catalog(catalog: &State<'_, SharedCatalog>) -> Result<Vec<RankedApp>, String> {
    let config = load_config_inner()?;
    Ok(maybe_refresh_catalog(&config, catalog, false))
}

// ── Commands ────────────────────────────────────────────────────────────

#[tauri::command]
pub fn list_eligible_tags(catalog: State<'_, SharedCatalog>) -> Result<Vec<TagCount>, String> {
    let entries = current_catalog(&catalog)?;
    Ok(eligible_tags(&entries))
}

#[tauri::command]
pub fn tournament_state(
    tournament: State<'_, SharedTournament>,
) -> Result<TournamentSnapshot, String> {
    with_tournament(&tournament, |engine| Ok(engine.snapshot()))
}

#[tauri::command]
pub fn tournament_start(
    category: String,
    catalog: State<'_, SharedCatalog>,
    tournament: State<'_, SharedTournament>,
) -> Result<TournamentSnapshot, String> {
    let entries = current_catalog(&catalog)?;
    with_tournament(&tournament, |engine| {
        engine.start(&entries, &category);
        info!(
            "tournament started: category={category} contestants={}",
            engine.pool_size()
        );
        Ok(engine.snapshot())
    })
}

#[tauri::command]
pub fn tournament_choose(
    winner_domain: String,
    loser_domain: String,
    tournament: State<'_, SharedTournament>,
) -> Result<TournamentSnapshot, String> {
    with_tournament(&tournament, |engine| {
        match engine.choose(&winner_domain, &loser_domain) {
            ChoiceOutcome::Finished(winner) => {
                info!(
                    "tournament finished: category={:?} winner={}",
                    engine.category(),
                    winner.mini_app.domain
                );
                // Best-effort write; the displayed winner never depends on it.
                let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
                submit_winner_score(&config, &winner.mini_app.id);
            }
            ChoiceOutcome::Ignored => {
                info!("stale choice ignored: {winner_domain} over {loser_domain}");
            }
            ChoiceOutcome::Continued => {}
        }
        Ok(engine.snapshot())
    })
}

#[tauri::command]
pub fn tournament_restart(
    catalog: State<'_, SharedCatalog>,
    tournament: State<'_, SharedTournament>,
) -> Result<TournamentSnapshot, String> {
    let entries = current_catalog(&catalog)?;
    with_tournament(&tournament, |engine| {
        engine.restart(&entries)?;
        Ok(engine.snapshot())
    })
}

#[tauri::command]
pub fn tournament_reset(
    tournament: State<'_, SharedTournament>,
) -> Result<TournamentSnapshot, String> {
    with_tournament(&tournament, |engine| {
        engine.reset();
        Ok(engine.snapshot())
    })
}
