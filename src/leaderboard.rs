use std::time::SystemTime;

use crate::ledger::fetch_raw_scores;
use crate::types::*;

// ── Catalog join ───────────────────────────────────────────────────────

type EntryMatcher = fn(&ScoreRecord, &RankedApp) -> bool;

fn match_by_id(record: &ScoreRecord, app: &RankedApp) -> bool {
    app.mini_app.id == record.id
}

fn match_by_domain(record: &ScoreRecord, app: &RankedApp) -> bool {
    app.mini_app.domain == record.id
}

fn match_by_name(record: &ScoreRecord, app: &RankedApp) -> bool {
    app.mini_app.name.eq_ignore_ascii_case(&record.id)
}

/// Ordered join strategies; earlier matchers win.
const MATCH_STRATEGIES: &[EntryMatcher] = &[match_by_id, match_by_domain, match_by_name];

fn find_catalog_entry<'a>(record: &ScoreRecord, catalog: &'a [RankedApp]) -> Option<&'a RankedApp> {
    MATCH_STRATEGIES
        .iter()
        .find_map(|matches| catalog.iter().find(|app| matches(record, app)))
}

/// Join one score record with catalog display metadata. A join miss keeps
/// the record with fallback fields; it is never dropped.
pub fn to_display_score(record: &ScoreRecord, catalog: &[RankedApp]) -> EnrichedScore {
    let entry = find_catalog_entry(record, catalog);
    EnrichedScore {
        id: record.id.clone(),
        name: entry
            .map(|app| app.mini_app.name.clone())
            .unwrap_or_else(|| "Unknown App".to_string()),
        domain: entry
            .map(|app| app.mini_app.domain.clone())
            .unwrap_or_default(),
        author: entry
            .map(|app| app.mini_app.author.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        icon_url: entry
            .map(|app| app.mini_app.icon_url.clone())
            .filter(|url| !url.is_empty()),
        category: entry
            .and_then(|app| app.mini_app.primary_category.clone())
            .unwrap_or_else(|| "uncategorized".to_string()),
        score: record.score,
        wins: record.score,
        updated_at: record.updated_at,
    }
}

// ── Aggregation ────────────────────────────────────────────────────────

pub fn filter_placeholders(
    records: Vec<ScoreRecord>,
    placeholder_ids: &[String],
) -> Vec<ScoreRecord> {
    records
        .into_iter()
        .filter(|record| !placeholder_ids.iter().any(|id| id == &record.id))
        .collect()
}

/// Raw contract records to the display list: placeholder filter, catalog
/// join, optional category filter, stable sort descending by score, then
/// the display limit (50 for "all", 20 for a single category).
pub fn aggregate(
    category: &str,
    catalog: &[RankedApp],
    records: Vec<ScoreRecord>,
    placeholder_ids: &[String],
) -> Vec<EnrichedScore> {
    let mut rows: Vec<EnrichedScore> = filter_placeholders(records, placeholder_ids)
        .iter()
        .map(|record| to_display_score(record, catalog))
        .collect();
    if category != "all" {
        rows.retain(|row| row.category == category);
    }
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    let limit = if category == "all" {
        LEADERBOARD_LIMIT_ALL
    } else {
        LEADERBOARD_LIMIT_CATEGORY
    };
    rows.truncate(limit);
    rows
}

/// Distinct non-empty primary categories, case-preserving, sorted.
pub fn distinct_categories(catalog: &[RankedApp]) -> Vec<String> {
    let mut out: Vec<String> = catalog
        .iter()
        .filter_map(|app| app.mini_app.primary_category.clone())
        .filter(|category| !category.trim().is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Fresh read for the leaderboard view: contract records merged with the
/// catalog, one remote read per call.
pub fn load_scores(config: &AppConfig, category: &str, catalog: &[RankedApp]) -> Vec<EnrichedScore> {
    let records = fetch_raw_scores(config);
    aggregate(category, catalog, records, &config.placeholder_ids)
}

// ── Shared store refresh (overlay) ─────────────────────────────────────

/// Throttled refresh of the shared "all categories" leaderboard used by
/// the overlay endpoint. Mirrors the catalog store: failures keep the
/// cached rows and land in `last_error`.
pub fn maybe_refresh_leaderboard(
    config: &AppConfig,
    leaderboard: &SharedLeaderboard,
    catalog: &[RankedApp],
    force: bool,
) -> Vec<EnrichedScore> {
    let (cached, fetch_in_flight, last_fetch) = {
        let guard = leaderboard.lock().unwrap_or_else(|e| e.into_inner());
        (guard.rows.clone(), guard.fetch_in_flight, guard.last_fetch)
    };
    let stale = match last_fetch {
        Some(last) => last
            .elapsed()
            .map(|age| age.as_millis() as u64)
            .unwrap_or(u64::MAX)
            > LEADERBOARD_IDLE_REFRESH_MS,
        None => true,
    };
    if (!force && !stale) || fetch_in_flight {
        return cached;
    }

    {
        let mut guard = leaderboard.lock().unwrap_or_else(|e| e.into_inner());
        guard.fetch_in_flight = true;
    }

    let result = crate::ledger::fetch_all_scores(config);
    let mut guard = leaderboard.lock().unwrap_or_else(|e| e.into_inner());
    guard.fetch_in_flight = false;
    guard.last_fetch = Some(SystemTime::now());
    match result {
        Ok(records) => {
            let rows = aggregate("all", catalog, records, &config.placeholder_ids);
            guard.last_error = None;
            guard.rows = rows.clone();
            rows
        }
        Err(err) => {
            guard.last_error = Some(err);
            cached
        }
    }
}
