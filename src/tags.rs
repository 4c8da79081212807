use std::collections::BTreeMap;

use crate::types::{RankedApp, TagCount, MIN_TOURNAMENT_POOL};

// ── Tag normalization ──────────────────────────────────────────────────

/// Fixed many-to-one synonym table. Every canonical tag maps to itself so
/// normalization is idempotent.
const TAG_SYNONYMS: &[(&str, &[&str])] = &[
    ("games", &["game", "games", "gaming", "playtoearn", "play"]),
    ("finance", &["finance", "defi", "trading", "crypto", "token", "swap"]),
    ("social", &["social", "community", "chat", "messaging"]),
    ("utility", &["utility", "tools", "productivity", "app"]),
    ("entertainment", &["entertainment", "fun", "media", "content"]),
    ("nft", &["nft", "collectibles", "marketplace", "art"]),
];

/// Lower-case and trim a raw tag, then map it through the synonym table.
/// Unmapped tags pass through in their lower-cased, trimmed form.
pub fn normalize_tag(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    for (canonical, synonyms) in TAG_SYNONYMS {
        if synonyms.contains(&normalized.as_str()) {
            return canonical.to_string();
        }
    }
    normalized
}

/// Raw tags of an entry: its free-text tags plus its primary category.
fn raw_tags(app: &RankedApp) -> Vec<&str> {
    let mut out: Vec<&str> = app.mini_app.tags.iter().map(String::as_str).collect();
    if let Some(category) = app.mini_app.primary_category.as_deref() {
        out.push(category);
    }
    out
}

// ── Tag catalog ────────────────────────────────────────────────────────

/// Canonical tags with enough contestants to host a tournament, sorted
/// descending by count. Counts accumulate one increment per raw tag
/// occurrence; tags below MIN_TOURNAMENT_POOL are dropped.
pub fn eligible_tags(catalog: &[RankedApp]) -> Vec<TagCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for app in catalog {
        for raw in raw_tags(app) {
            *counts.entry(normalize_tag(raw)).or_insert(0) += 1;
        }
    }
    let mut out: Vec<TagCount> = counts
        .into_iter()
        .filter(|(_, count)| *count >= MIN_TOURNAMENT_POOL)
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// All catalog entries whose normalized tag/category set contains `tag`.
pub fn entries_for_tag(catalog: &[RankedApp], tag: &str) -> Vec<RankedApp> {
    catalog
        .iter()
        .filter(|app| raw_tags(app).iter().any(|raw| normalize_tag(raw) == tag))
        .cloned()
        .collect()
}
