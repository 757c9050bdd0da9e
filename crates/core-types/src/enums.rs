use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of cash flow a transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money leaves the user (negative cash flow).
    #[serde(alias = "purchase", alias = "Purchase")]
    Purchase,
    /// Money reaches the user (positive cash flow).
    #[serde(alias = "sale", alias = "Sale")]
    Sale,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Sale => "SALE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state of a transaction. Only `Completed` transactions move money.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    /// Any status the marketplace adds later; treated as not settled.
    Other(String),
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "COMPLETED" => TransactionStatus::Completed,
            "PENDING" => TransactionStatus::Pending,
            "FAILED" => TransactionStatus::Failed,
            _ => TransactionStatus::Other(value),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Completed => "COMPLETED".to_string(),
            TransactionStatus::Pending => "PENDING".to_string(),
            TransactionStatus::Failed => "FAILED".to_string(),
            TransactionStatus::Other(other) => other,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Completed => f.write_str("COMPLETED"),
            TransactionStatus::Pending => f.write_str("PENDING"),
            TransactionStatus::Failed => f.write_str("FAILED"),
            TransactionStatus::Other(other) => f.write_str(other),
        }
    }
}

/// Account state of a marketplace user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Other(String),
}

impl From<String> for UserStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "ACTIVE" => UserStatus::Active,
            "INACTIVE" => UserStatus::Inactive,
            "SUSPENDED" => UserStatus::Suspended,
            _ => UserStatus::Other(value),
        }
    }
}

impl From<UserStatus> for String {
    fn from(value: UserStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => f.write_str("ACTIVE"),
            UserStatus::Inactive => f.write_str("INACTIVE"),
            UserStatus::Suspended => f.write_str("SUSPENDED"),
            UserStatus::Other(other) => f.write_str(other),
        }
    }
}

/// Presentation order of a ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Lowest value first.
    Asc,
    /// Highest value first.
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(CoreError::InvalidInput(
                "sort direction".to_string(),
                format!("expected 'asc' or 'desc', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(TransactionStatus::from("completed".to_string()), TransactionStatus::Completed);
        assert_eq!(TransactionStatus::from("PENDING".to_string()), TransactionStatus::Pending);
        assert_eq!(
            TransactionStatus::from("REFUNDED".to_string()),
            TransactionStatus::Other("REFUNDED".to_string())
        );
    }

    #[test]
    fn test_transaction_type_serde() {
        let parsed: TransactionType = serde_json::from_str("\"SALE\"").unwrap();
        assert_eq!(parsed, TransactionType::Sale);
        let lower: TransactionType = serde_json::from_str("\"purchase\"").unwrap();
        assert_eq!(lower, TransactionType::Purchase);
        assert_eq!(serde_json::to_string(&TransactionType::Purchase).unwrap(), "\"PURCHASE\"");
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
