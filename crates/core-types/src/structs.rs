use crate::enums::{TransactionStatus, TransactionType, UserStatus};
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A marketplace participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    /// When the account was created. Some older records carry no timestamp.
    pub member_since: Option<DateTime<Utc>>,
    /// Balance at account creation. `None` when the API did not report one.
    pub initial_balance: Option<Decimal>,
}

/// The title of the movie a ticket is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Movie(String);

impl Movie {
    /// Builds a `Movie` from a title, rejecting blank titles.
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn title(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single PURCHASE or SALE recorded against a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub user_id: String,
    pub transaction_type: TransactionType,
    /// Stored magnitude. The sign on the wire is not trusted; see [`Transaction::cash_flow`].
    pub amount: Decimal,
    pub movie: Option<Movie>,
    pub theatre_seat: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    /// The other party of a user-to-user sale, when there was one.
    pub counterparty_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// The absolute value of the amount, whatever sign the API stored.
    pub fn magnitude(&self) -> Decimal {
        self.amount.abs()
    }

    /// Signed cash flow from the user's point of view: sales are positive,
    /// purchases negative.
    pub fn cash_flow(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Sale => self.magnitude(),
            TransactionType::Purchase => -self.magnitude(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}

/// An inclusive time range that restricts which transactions are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(
                "date window".to_string(),
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    /// From the first instant of `from` to the last microsecond of `to`, in UTC.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self, CoreError> {
        let end = to.and_hms_micro_opt(23, 59, 59, 999_999).ok_or_else(|| {
            CoreError::InvalidInput("date window".to_string(), format!("no end of day for {}", to))
        })?;
        Self::new(from.and_time(NaiveTime::MIN).and_utc(), end.and_utc())
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

/// Parses the timestamps the marketplace emits.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`) as well as naive ISO-8601
/// without an offset (`2024-05-01T10:00:00.123456`), which is read as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            CoreError::InvalidInput("timestamp".to_string(), format!("unrecognized format '{}'", text))
        })
}
