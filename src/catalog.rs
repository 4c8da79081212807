use crate::config::{resolve_repo_path, system_time_ms};
use crate::types::*;
use std::{collections::HashSet, fs, time::SystemTime};
use tracing::info;

// ── Document loading ───────────────────────────────────────────────────

/// Parse a catalog document. Accepts the ranked envelope
/// (`{"result": {"miniApps": [...]}}`) or a bare entry array.
pub fn parse_catalog_document(data: &str) -> Result<Vec<RankedApp>, String> {
  if let Ok(document) = serde_json::from_str::<CatalogDocument>(data) {
    if let Some(result) = document.result {
      return Ok(result.mini_apps);
    }
  }
  serde_json::from_str::<Vec<RankedApp>>(data)
    .map_err(|e| format!("parse catalog document: {e}"))
}

/// Contestants are keyed by domain; the first occurrence wins.
pub fn dedupe_by_domain(entries: Vec<RankedApp>) -> Vec<RankedApp> {
  let mut seen: HashSet<String> = HashSet::new();
  entries
    .into_iter()
    .filter(|app| seen.insert(app.mini_app.domain.clone()))
    .collect()
}

fn fetch_catalog_from_url(url: &str) -> Result<Vec<RankedApp>, String> {
  let client = reqwest::blocking::Client::new();
  let resp = client
    .get(url)
    .header("User-Agent", "swipecast")
    .send()
    .map_err(|e| format!("catalog request {url}: {e}"))?;
  let status = resp.status();
  let body = resp
    .text()
    .map_err(|e| format!("catalog read {url}: {e}"))?;
  if !status.is_success() {
    return Err(format!("catalog error {status}: {body}"));
  }
  parse_catalog_document(&body)
}

fn load_catalog_from_file(raw_path: &str) -> Result<Vec<RankedApp>, String> {
  let path = resolve_repo_path(raw_path);
  if !path.is_file() {
    return Err(format!("Catalog document not found at {}", path.display()));
  }
  let data =
    fs::read_to_string(&path).map_err(|e| format!("read catalog {}: {e}", path.display()))?;
  parse_catalog_document(&data)
}

/// Load the catalog from the configured source. A configured URL wins
/// over the local document path.
pub fn load_catalog(config: &AppConfig) -> Result<Vec<RankedApp>, String> {
  let url = config.catalog_url.trim();
  let entries = if !url.is_empty() {
    fetch_catalog_from_url(url)?
  } else {
    load_catalog_from_file(&config.catalog_path)?
  };
  Ok(dedupe_by_domain(entries))
}

// ── Shared store refresh ───────────────────────────────────────────────

/// Fetch the catalog into the shared store if it is empty, stale-forced,
/// or has never loaded. Returns the current entries either way; fetch
/// failures land in `last_error` and keep whatever was cached.
pub fn maybe_refresh_catalog(
  config: &AppConfig,
  catalog: &SharedCatalog,
  force: bool,
) -> Vec<RankedApp> {
  let (cached, fetch_in_flight) = {
    let guard = catalog.lock().unwrap_or_else(|e| e.into_inner());
    (guard.entries.clone(), guard.fetch_in_flight)
  };
  let needs_refresh = force || cached.is_empty();
  if !needs_refresh || fetch_in_flight {
    return cached;
  }

  {
    let mut guard = catalog.lock().unwrap_or_else(|e| e.into_inner());
    guard.fetch_in_flight = true;
  }

  let result = load_catalog(config);
  let mut guard = catalog.lock().unwrap_or_else(|e| e.into_inner());
  guard.fetch_in_flight = false;
  match result {
    Ok(entries) => {
      info!("catalog loaded: {} entries", entries.len());
      guard.last_fetch = Some(SystemTime::now());
      guard.last_error = None;
      guard.entries = entries.clone();
      entries
    }
    Err(err) => {
      guard.last_error = Some(err);
      cached
    }
  }
}

pub fn catalog_snapshot_from_store(catalog: &SharedCatalog) -> CatalogSnapshot {
  let guard = catalog.lock().unwrap_or_else(|e| e.into_inner());
  CatalogSnapshot {
    entry_count: guard.entries.len(),
    last_error: guard.last_error.clone(),
    last_fetch_ms: guard.last_fetch.and_then(system_time_ms),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ENVELOPE: &str = r#"{
    "result": {
      "miniApps": [
        {
          "rank": 1,
          "miniApp": {
            "id": "a1",
            "domain": "alpha.example",
            "name": "Alpha",
            "iconUrl": "https://alpha.example/icon.png",
            "homeUrl": "https://alpha.example",
            "author": { "displayName": "Alpha Team", "username": "alpha" },
            "primaryCategory": "games",
            "tags": ["game", "fun"]
          },
          "rank72hChange": -2
        },
        {
          "rank": 2,
          "miniApp": { "id": "b1", "domain": "beta.example", "name": "Beta" }
        },
        {
          "rank": 3,
          "miniApp": { "id": "a2", "domain": "alpha.example", "name": "Alpha Again" }
        }
      ]
    }
  }"#;

  #[test]
  fn test_parse_envelope_document() {
    let entries = parse_catalog_document(ENVELOPE).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].mini_app.name, "Alpha");
    assert_eq!(entries[0].rank_72h_change, -2);
    assert_eq!(entries[0].mini_app.tags, vec!["game", "fun"]);
    assert_eq!(entries[1].mini_app.author.display_name, "");
  }

  #[test]
  fn test_parse_bare_array_document() {
    let raw = r#"[ { "miniApp": { "id": "x", "domain": "x.example", "name": "X" } } ]"#;
    let entries = parse_catalog_document(raw).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].mini_app.id, "x");
  }

  #[test]
  fn test_parse_rejects_garbage() {
    assert!(parse_catalog_document("not json").is_err());
  }

  #[test]
  fn test_dedupe_keeps_first_domain_occurrence() {
    let entries = parse_catalog_document(ENVELOPE).unwrap();
    let deduped = dedupe_by_domain(entries);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].mini_app.name, "Alpha");
    assert_eq!(deduped[1].mini_app.name, "Beta");
  }
}
