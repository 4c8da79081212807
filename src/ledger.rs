use crate::config::*;
use crate::types::*;
use serde_json::json;
use std::{thread::sleep, time::Duration};
use tracing::{error, info, warn};

// ── Endpoints ──────────────────────────────────────────────────────────

pub fn ledger_scores_url(config: &AppConfig) -> String {
  format!(
    "{}/{}/scores",
    config.ledger_url.trim_end_matches('/'),
    SCORE_CONTRACT_ADDRESS
  )
}

pub fn ledger_increment_url(config: &AppConfig) -> String {
  format!(
    "{}/{}/increment",
    config.ledger_url.trim_end_matches('/'),
    SCORE_CONTRACT_ADDRESS
  )
}

pub fn signer_token_from_config(config: &AppConfig) -> Result<String, String> {
  let trimmed = config.signer_token.trim();
  if !trimmed.is_empty() {
    return Ok(trimmed.to_string());
  }
  env_default("SIGNER_TOKEN")
    .ok_or_else(|| "Signer token is not set (Settings or SIGNER_TOKEN).".to_string())
}

// ── Reads ──────────────────────────────────────────────────────────────

/// All (id, score, updatedAt) triples the contract tracks. The send is
/// retried a few times; anything else fails once and reports why.
pub fn fetch_all_scores(config: &AppConfig) -> Result<Vec<ScoreRecord>, String> {
  let url = ledger_scores_url(config);
  if config.ledger_url.trim().is_empty() {
    return Err("Ledger URL is empty.".to_string());
  }
  append_ledger_log("Ledger read", &format!("GET {url}"));
  let client = reqwest::blocking::Client::new();
  let mut last_send_err = String::new();
  let mut resp = None;
  for attempt in 0..LEDGER_READ_ATTEMPTS {
    if attempt > 0 {
      sleep(Duration::from_millis(500 * u64::from(attempt)));
    }
    match client.get(&url).header("User-Agent", "swipecast").send() {
      Ok(r) => {
        resp = Some(r);
        break;
      }
      Err(e) => {
        last_send_err = format!("Ledger read failed (attempt {}): {e}", attempt + 1);
        append_ledger_log("Ledger error", &last_send_err);
      }
    }
  }
  let resp = resp.ok_or_else(|| last_send_err.clone())?;
  let status = resp.status();
  let body = resp.text().map_err(|e| {
    append_ledger_log("Ledger error", &format!("read failed: {e}"));
    format!("Ledger read failed: {e}")
  })?;
  append_ledger_log("Ledger response", &format!("status: {status}\nbody:\n{body}"));
  if !status.is_success() {
    return Err(format!("Ledger error {status}: {body}"));
  }
  let parsed: LedgerScoresResponse = serde_json::from_str(&body).map_err(|e| {
    append_ledger_log("Ledger error", &format!("parse failed: {e}"));
    format!("Ledger parse failed: {e}")
  })?;
  parsed
    .result
    .ok_or_else(|| "Ledger response missing result.".to_string())
}

/// The aggregation boundary: score fetch failures degrade to an empty
/// list, they never propagate.
pub fn fetch_raw_scores(config: &AppConfig) -> Vec<ScoreRecord> {
  match fetch_all_scores(config) {
    Ok(records) => records,
    Err(err) => {
      warn!("score read failed, showing empty leaderboard: {err}");
      Vec::new()
    }
  }
}

// ── Writes ─────────────────────────────────────────────────────────────

/// One `incrementScore(appId)` transaction through the gateway, which
/// waits for confirmation before answering. Single attempt, no retry.
pub fn increment_score(config: &AppConfig, app_id: &str) -> Result<String, String> {
  let token = signer_token_from_config(config)?;
  let url = ledger_increment_url(config);
  append_ledger_log(
    "Ledger write",
    &format!("POST {url}\nAuthorization: Bearer [redacted]\nappId: {app_id}"),
  );
  let client = reqwest::blocking::Client::new();
  let resp = client
    .post(&url)
    .header("Authorization", format!("Bearer {token}"))
    .header("User-Agent", "swipecast")
    .json(&json!({ "appId": app_id }))
    .send()
    .map_err(|e| {
      let msg = format!("Ledger write failed: {e}");
      append_ledger_log("Ledger error", &msg);
      msg
    })?;
  let status = resp.status();
  let body = resp.text().map_err(|e| format!("Ledger write read failed: {e}"))?;
  append_ledger_log("Ledger response", &format!("status: {status}\nbody:\n{body}"));
  if !status.is_success() {
    return Err(format!("Ledger write error {status}: {body}"));
  }
  let parsed: LedgerWriteResponse =
    serde_json::from_str(&body).map_err(|e| format!("Ledger write parse failed: {e}"))?;
  if let Some(err) = parsed.error {
    return Err(format!("Ledger write rejected: {err}"));
  }
  parsed
    .hash
    .ok_or_else(|| "Ledger write response missing hash.".to_string())
}

/// Best-effort score write for a bracket winner. Without a signer the
/// write is skipped with a log line; otherwise it is dispatched on a
/// background thread whose outcome is logged and never fed back into
/// tournament state. Returns whether a write was dispatched.
pub fn submit_winner_score(config: &AppConfig, app_id: &str) -> bool {
  if let Err(err) = signer_token_from_config(config) {
    info!("skipping winner score write for {app_id}: {err}");
    return false;
  }
  let config = config.clone();
  let app_id = app_id.to_string();
  std::thread::spawn(move || match increment_score(&config, &app_id) {
    Ok(hash) => info!("winner score written for {app_id}: {hash}"),
    Err(err) => error!("winner score write failed for {app_id}: {err}"),
  });
  true
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_config(ledger_url: &str, signer_token: &str) -> AppConfig {
    AppConfig {
      ledger_url: ledger_url.to_string(),
      signer_token: signer_token.to_string(),
      ..AppConfig::default()
    }
  }

  #[test]
  fn test_endpoint_urls_join_contract_address() {
    let config = make_config("https://scores.example/v1/", "");
    assert_eq!(
      ledger_scores_url(&config),
      format!("https://scores.example/v1/{SCORE_CONTRACT_ADDRESS}/scores")
    );
    assert_eq!(
      ledger_increment_url(&config),
      format!("https://scores.example/v1/{SCORE_CONTRACT_ADDRESS}/increment")
    );
  }

  #[test]
  fn test_signer_token_prefers_config() {
    let config = make_config("https://scores.example/v1", "  signer-abc  ");
    assert_eq!(signer_token_from_config(&config).unwrap(), "signer-abc");
  }

  #[test]
  fn test_missing_signer_token_is_an_error() {
    std::env::remove_var("SIGNER_TOKEN");
    let config = make_config("https://scores.example/v1", "   ");
    assert!(signer_token_from_config(&config).is_err());
  }

  #[test]
  fn test_submit_winner_score_skips_without_signer() {
    std::env::remove_var("SIGNER_TOKEN");
    let config = make_config("https://scores.example/v1", "");
    assert!(!submit_winner_score(&config, "app-1"));
  }

  #[test]
  fn test_scores_response_parses_records() {
    let raw = r#"{ "result": [
      { "id": "x", "score": 5, "updatedAt": 1700000000 },
      { "id": "y", "score": 2 }
    ] }"#;
    let parsed: LedgerScoresResponse = serde_json::from_str(raw).unwrap();
    let records = parsed.result.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].score, 5);
    assert_eq!(records[0].updated_at, 1_700_000_000);
    assert_eq!(records[1].updated_at, 0);
  }
}
