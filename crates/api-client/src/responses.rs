use crate::error::ApiError;
use analytics::{FinancialSummary, LeaderboardEntry, SummaryInsights, UserInfo, UserSummaryReport};
use core_types::money::{deserialize_amount, deserialize_optional_amount};
use core_types::{
    parse_timestamp, Movie, Transaction, TransactionStatus, TransactionType, User, UserStatus,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

// The marketplace is not consistent about casing or nesting, so every wire
// struct here accepts the spellings seen in the wild and is converted into a
// strict domain type exactly once.

/// A list endpoint either returns a bare array or wraps it in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "users", alias = "transactions", alias = "Items")]
        items: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Wrapped { items } => items,
        }
    }
}

/// A user record as the API sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default, alias = "createdAt", alias = "created_at", alias = "member_since")]
    pub member_since: Option<String>,
    #[serde(
        default,
        alias = "initial_balance",
        deserialize_with = "deserialize_optional_amount"
    )]
    pub initial_balance: Option<Decimal>,
}

impl TryFrom<RawUser> for User {
    type Error = ApiError;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        let member_since = raw
            .member_since
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("user '{}': {}", raw.user_id, e)))?;

        Ok(User {
            name: raw.name.unwrap_or_else(|| raw.user_id.clone()),
            email: raw.email.unwrap_or_default(),
            status: raw.status.unwrap_or_default(),
            member_since,
            initial_balance: raw.initial_balance,
            user_id: raw.user_id,
        })
    }
}

/// The movie attached to a transaction: sometimes a title, sometimes an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawMovie {
    Title(String),
    Details {
        #[serde(default, alias = "name", alias = "Movie")]
        title: Option<String>,
    },
}

impl RawMovie {
    pub fn normalize(self) -> Option<Movie> {
        match self {
            RawMovie::Title(title) => Movie::new(title),
            RawMovie::Details { title } => title.and_then(Movie::new),
        }
    }
}

/// A transaction record as the API sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(alias = "transaction_id")]
    pub transaction_id: String,
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(alias = "transaction_type", alias = "type")]
    pub transaction_type: TransactionType,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub movie: Option<RawMovie>,
    #[serde(default, alias = "theatre_seat", alias = "Theatre-Seat")]
    pub theatre_seat: Option<String>,
    #[serde(default, alias = "payment_method")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "buyer_id")]
    pub buyer_id: Option<String>,
    #[serde(default, alias = "seller_id")]
    pub seller_id: Option<String>,
    pub timestamp: String,
    pub status: TransactionStatus,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = ApiError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&raw.timestamp).map_err(|e| {
            ApiError::Validation(format!("transaction '{}': {}", raw.transaction_id, e))
        })?;

        Ok(Transaction {
            transaction_id: raw.transaction_id,
            user_id: raw.user_id,
            transaction_type: raw.transaction_type,
            amount: raw.amount,
            movie: raw.movie.and_then(RawMovie::normalize),
            theatre_seat: raw.theatre_seat,
            payment_method: raw.payment_method,
            description: raw.description,
            counterparty_id: raw.buyer_id.or(raw.seller_id),
            timestamp,
            status: raw.status,
        })
    }
}

/// The response from `GET /users/leaderboard`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub total_users: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RawUserInfo {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default, alias = "memberSince")]
    pub member_since: Option<String>,
}

/// The response from `GET /users/{userId}/summary`.
#[derive(Debug, Deserialize)]
pub struct RawUserSummary {
    pub user_info: RawUserInfo,
    pub financial_summary: FinancialSummary,
    #[serde(default)]
    pub recent_transactions: Vec<RawTransaction>,
}

impl TryFrom<RawUserSummary> for UserSummaryReport {
    type Error = ApiError;

    fn try_from(raw: RawUserSummary) -> Result<Self, Self::Error> {
        let info = raw.user_info;
        let member_since = info
            .member_since
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("user '{}': {}", info.user_id, e)))?;

        let recent_transactions = raw
            .recent_transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let insights = SummaryInsights::derive(&raw.financial_summary, &recent_transactions);

        Ok(UserSummaryReport {
            user_info: UserInfo {
                name: info.name.unwrap_or_else(|| info.user_id.clone()),
                email: info.email.unwrap_or_default(),
                status: info.status.unwrap_or_default(),
                member_since,
                user_id: info.user_id,
            },
            financial_summary: raw.financial_summary,
            recent_transactions,
            insights,
        })
    }
}

/// An error body. FastAPI sends `{"detail": "..."}` or `{"detail": [{"msg": ...}]}`,
/// other handlers send `{"message": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorResponse {
    /// Extracts a single readable message, falling back to `fallback`.
    pub fn message_or(self, fallback: &str) -> String {
        match self.detail {
            Some(Value::String(text)) if !text.is_empty() => return text,
            Some(Value::Array(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| {
                        item.get("msg")
                            .or_else(|| item.get("message"))
                            .and_then(Value::as_str)
                            .unwrap_or("Validation error")
                            .to_string()
                    })
                    .collect();
                if !parts.is_empty() {
                    return parts.join(", ");
                }
            }
            Some(Value::Object(_)) => return "Validation error occurred".to_string(),
            _ => {}
        }
        match self.message {
            Some(message) if !message.is_empty() => message,
            _ => fallback.to_string(),
        }
    }
}
