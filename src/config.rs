use crate::types::*;
use chrono::Local;
use std::{
  env,
  fs,
  io::Write,
  path::PathBuf,
  time::{SystemTime, UNIX_EPOCH},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.catalog_url.trim().is_empty() {
    if let Some(value) = env_default("CATALOG_URL") {
      config.catalog_url = value;
    }
  }
  if config.catalog_path.trim().is_empty() {
    if let Some(value) = env_default("CATALOG_PATH") {
      config.catalog_path = value;
    }
  }
  if config.ledger_url.trim().is_empty() {
    if let Some(value) = env_default("LEDGER_URL") {
      config.ledger_url = value;
    }
  }
  if config.signer_token.trim().is_empty() {
    if let Some(value) = env_default("SIGNER_TOKEN") {
      config.signer_token = value;
    }
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config_inner(config: AppConfig) -> Result<AppConfig, String> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(&path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}

pub fn system_time_ms(time: SystemTime) -> Option<u64> {
  time
    .duration_since(UNIX_EPOCH)
    .ok()
    .map(|duration| duration.as_millis() as u64)
}

pub fn ledger_log_path() -> PathBuf {
  repo_root().join("logs").join("ledger_api.log")
}

pub fn append_ledger_log(label: &str, payload: &str) {
  let dir = repo_root().join("logs");
  if fs::create_dir_all(&dir).is_err() {
    return;
  }
  let path = ledger_log_path();
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
    let _ = file.write_all(entry.as_bytes());
  }
}

pub fn log_env_warnings() {
  let config = load_config_inner().unwrap_or_else(|_| AppConfig::default());
  let mut warnings = Vec::new();

  if config.catalog_url.trim().is_empty() && !resolve_repo_path(&config.catalog_path).is_file() {
    warnings.push("No catalog URL configured and no local catalog document found — tournaments will have no contestants");
  }
  if config.ledger_url.trim().is_empty() {
    warnings.push("LEDGER_URL not set and no ledger URL in config — score reads and writes will fail");
  }
  if config.signer_token.trim().is_empty() && env_default("SIGNER_TOKEN").is_none() {
    warnings.push("SIGNER_TOKEN not set and no signer token in config — winner scores will not be written");
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}
