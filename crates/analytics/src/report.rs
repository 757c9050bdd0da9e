use chrono::{DateTime, Utc};
use core_types::money::deserialize_amount;
use core_types::{Transaction, User, UserStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The derived financial position of a single user.
///
/// Recomputed from the transaction history on every query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    #[serde(deserialize_with = "deserialize_amount")]
    pub current_balance: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_purchases: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_sales: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub net_profit_loss: Decimal,
    pub is_net_positive: bool,
    #[serde(default)]
    pub total_transactions: usize,
}

impl FinancialSummary {
    /// A summary for a user with no settled activity.
    pub fn opening(initial_balance: Decimal) -> Self {
        Self {
            current_balance: initial_balance,
            total_purchases: Decimal::ZERO,
            total_sales: Decimal::ZERO,
            net_profit_loss: Decimal::ZERO,
            is_net_positive: true,
            total_transactions: 0,
        }
    }
}

/// The identity block of a user summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub member_since: Option<DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            status: user.status.clone(),
            member_since: user.member_since,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStanding {
    Positive,
    Negative,
}

/// Secondary metrics shown next to a user summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInsights {
    /// Mean absolute amount of the recent transactions. `None` when there are none.
    pub average_transaction_amount: Option<Decimal>,
    /// Net profit/loss as a percentage of total purchases. `None` when nothing was purchased.
    pub return_on_purchases_pct: Option<Decimal>,
    pub balance_standing: BalanceStanding,
}

impl SummaryInsights {
    pub fn derive(summary: &FinancialSummary, recent_transactions: &[Transaction]) -> Self {
        // Out-of-range figures are left out rather than shown wrong.
        let average_transaction_amount = if recent_transactions.is_empty() {
            None
        } else {
            recent_transactions
                .iter()
                .map(Transaction::magnitude)
                .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
                .and_then(|total| total.checked_div(Decimal::from(recent_transactions.len())))
        };

        let return_on_purchases_pct = if summary.total_purchases > Decimal::ZERO {
            summary
                .net_profit_loss
                .checked_div(summary.total_purchases)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        } else {
            None
        };

        let balance_standing = if summary.current_balance >= Decimal::ZERO {
            BalanceStanding::Positive
        } else {
            BalanceStanding::Negative
        };

        Self {
            average_transaction_amount,
            return_on_purchases_pct,
            balance_standing,
        }
    }
}

/// The composite behind a user's summary page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummaryReport {
    pub user_info: UserInfo,
    pub financial_summary: FinancialSummary,
    /// Most recent first.
    pub recent_transactions: Vec<Transaction>,
    pub insights: SummaryInsights,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub current_balance: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_purchases: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub total_sales: Decimal,
    #[serde(deserialize_with = "deserialize_amount")]
    pub net_profit_loss: Decimal,
    pub is_net_positive: bool,
    #[serde(default)]
    pub total_transactions: usize,
}

impl LeaderboardEntry {
    pub fn new(rank: usize, user: &User, summary: &FinancialSummary) -> Self {
        Self {
            rank,
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            current_balance: summary.current_balance,
            total_purchases: summary.total_purchases,
            total_sales: summary.total_sales,
            net_profit_loss: summary.net_profit_loss,
            is_net_positive: summary.is_net_positive,
            total_transactions: summary.total_transactions,
        }
    }

    /// The financial fields of this row as a standalone summary.
    pub fn summary(&self) -> FinancialSummary {
        FinancialSummary {
            current_balance: self.current_balance,
            total_purchases: self.total_purchases,
            total_sales: self.total_sales,
            net_profit_loss: self.net_profit_loss,
            is_net_positive: self.is_net_positive,
            total_transactions: self.total_transactions,
        }
    }
}
