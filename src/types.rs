use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::tournament::Tournament;

// ── Constants ──────────────────────────────────────────────────────────

pub const MIN_TOURNAMENT_POOL: usize = 10;
pub const LEADERBOARD_LIMIT_ALL: usize = 50;
pub const LEADERBOARD_LIMIT_CATEGORY: usize = 20;
pub const LEDGER_READ_ATTEMPTS: u32 = 3;
pub const LEADERBOARD_IDLE_REFRESH_MS: u64 = 10_000;
pub const OVERLAY_ADDR: &str = "127.0.0.1:18290";

/// Live score contract on Base; the gateway exposes it per address.
pub const SCORE_CONTRACT_ADDRESS: &str = "0x1722ef0c99edf0d5aaee1309006b192e8d64698e";
pub const DEFAULT_LEDGER_URL: &str = "https://scores.swipecast.app/v1";

/// Seed entries the contract was deployed with. Excluded from every
/// aggregation; kept as a config default rather than a baked-in filter.
pub const DEFAULT_PLACEHOLDER_IDS: [&str; 2] = [
    "31e222ce-f61c-4593-95c9-9ab187ffb5c4",
    "31e722ce-f61c-4593-95c9-9ab187ffb5c4",
];

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedCatalog = Arc<Mutex<CatalogStore>>;
pub type SharedTournament = Arc<Mutex<Tournament>>;
pub type SharedLeaderboard = Arc<Mutex<LeaderboardState>>;

// ── Catalog types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAuthor {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniApp {
    pub id: String,
    pub domain: String,
    pub name: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub home_url: String,
    #[serde(default)]
    pub author: AppAuthor,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub button_title: Option<String>,
    #[serde(default)]
    pub primary_category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One entry of the ranked catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedApp {
    #[serde(default)]
    pub rank: Option<u32>,
    pub mini_app: MiniApp,
    #[serde(default)]
    pub rank_72h_change: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub result: Option<CatalogResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResult {
    #[serde(default)]
    pub mini_apps: Vec<RankedApp>,
}

#[derive(Default)]
pub struct CatalogStore {
    pub entries: Vec<RankedApp>,
    pub last_fetch: Option<SystemTime>,
    pub last_error: Option<String>,
    pub fetch_in_flight: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub entry_count: usize,
    pub last_error: Option<String>,
    pub last_fetch_ms: Option<u64>,
}

// ── Tag types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

// ── Score ledger types ─────────────────────────────────────────────────

/// Raw (id, score, updatedAt) triple as the contract reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub score: u64,
    #[serde(default)]
    pub updated_at: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerScoresResponse {
    pub result: Option<Vec<ScoreRecord>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerWriteResponse {
    pub hash: Option<String>,
    pub error: Option<String>,
}

/// Score record joined with catalog display metadata. `wins` mirrors
/// `score` since the contract tracks a single counter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedScore {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub author: String,
    pub icon_url: Option<String>,
    pub category: String,
    pub score: u64,
    pub wins: u64,
    pub updated_at: u64,
}

#[derive(Default)]
pub struct LeaderboardState {
    pub rows: Vec<EnrichedScore>,
    pub last_fetch: Option<SystemTime>,
    pub last_error: Option<String>,
    pub fetch_in_flight: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub scores: Vec<EnrichedScore>,
    pub last_error: Option<String>,
    pub generated_at_ms: u64,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub catalog_url: String,
    pub catalog_path: String,
    pub ledger_url: String,
    pub signer_token: String,
    pub placeholder_ids: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: String::new(),
            catalog_path: "data/miniapps.json".to_string(),
            ledger_url: DEFAULT_LEDGER_URL.to_string(),
            signer_token: String::new(),
            placeholder_ids: DEFAULT_PLACEHOLDER_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}

// ── Overlay server state ───────────────────────────────────────────────

#[derive(Clone)]
pub struct OverlayServerState {
    pub catalog: SharedCatalog,
    pub leaderboard: SharedLeaderboard,
}
