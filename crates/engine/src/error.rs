use analytics::AnalyticsError;
use api_client::error::ApiError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("API client error: {0}")]
    ApiClient(#[from] ApiError),

    #[error("History for user '{user_id}' reached the page limit of {limit} transactions and may be incomplete")]
    TruncatedHistory { user_id: String, limit: u32 },

    #[error("The server leaderboard does not follow the ranking rules: {0}")]
    RankingViolation(String),

    #[error("The operation was cancelled.")]
    Cancelled,
}

impl EngineError {
    /// The input could not be turned into a summary or ranking.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            EngineError::Analytics(_) | EngineError::TruncatedHistory { .. } | EngineError::RankingViolation(_)
        )
    }

    /// The marketplace API could not be reached or answered with an error.
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::ApiClient(_))
    }

    /// Short copy suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::ApiClient(ApiError::Network(_)) => {
                "Could not reach the marketplace. Check your connection and try again.".to_string()
            }
            EngineError::ApiClient(ApiError::NotFound(message)) => message.clone(),
            EngineError::ApiClient(ApiError::Server { .. }) => {
                "The marketplace had a problem answering. Please try again later.".to_string()
            }
            EngineError::ApiClient(ApiError::Validation(message)) => message.clone(),
            EngineError::Analytics(AnalyticsError::MissingBalance { user_id }) => {
                format!("No financial summary is available for '{}'.", user_id)
            }
            EngineError::Analytics(err) => err.to_string(),
            EngineError::TruncatedHistory { user_id, limit } => format!(
                "'{}' has more than {} transactions, so the totals would be incomplete. \
                 Narrow the range with --from/--to or raise api.transactions_page_limit.",
                user_id, limit
            ),
            EngineError::RankingViolation(_) => {
                "The leaderboard returned by the marketplace is inconsistent.".to_string()
            }
            EngineError::Configuration(message) => message.clone(),
            EngineError::Cancelled => "Cancelled.".to_string(),
        }
    }
}
