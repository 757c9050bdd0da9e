use core_types::SortDirection;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub leaderboard: LeaderboardSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

/// Connection and retry policy for the marketplace REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the API, including any stage prefix (e.g. ".../dev").
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// How many times a request that failed on connectivity is retried.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub retry_backoff_ms: u64,
    /// How many transactions to request per user. The marketplace serves at
    /// most [`MAX_TRANSACTIONS_PAGE`] per request.
    pub transactions_page_limit: u32,
}

/// Largest `limit` the marketplace accepts on `/user-transactions`.
pub const MAX_TRANSACTIONS_PAGE: u32 = 100;

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 250,
            transactions_page_limit: MAX_TRANSACTIONS_PAGE,
        }
    }
}

/// Where the leaderboard is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardSource {
    /// Fetch every user's history and rank on this side.
    #[default]
    Local,
    /// Ask the API for its pre-ranked board.
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    pub default_limit: i64,
    /// Upper bound the API accepts for `limit`.
    pub max_limit: i64,
    pub default_order: SortDirection,
    /// Name of the summary field to rank by, e.g. "netProfitLoss".
    pub order_by: String,
    /// Maximum number of per-user transaction fetches in flight.
    pub concurrency: usize,
    pub source: LeaderboardSource,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            default_order: SortDirection::Desc,
            order_by: "netProfitLoss".to_string(),
            concurrency: 8,
            source: LeaderboardSource::Local,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// How many transactions the summary view lists.
    pub recent_transactions: usize,
    /// Where the dark/light preference is stored.
    pub theme_file: PathBuf,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            recent_transactions: 5,
            theme_file: PathBuf::from("theme.toml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
