use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("User '{user_id}' has no initial balance; a financial summary cannot be derived")]
    MissingBalance { user_id: String },

    #[error("Totals for user '{user_id}' exceed the representable amount range")]
    AmountOverflow { user_id: String },

    #[error("Unknown leaderboard field '{0}'")]
    UnknownField(String),

    #[error("Invalid leaderboard limit {0}: the limit must be a positive integer")]
    InvalidLimit(i64),

    #[error("Leaderboard ranking is inconsistent: {0}")]
    InconsistentRanking(String),
}
