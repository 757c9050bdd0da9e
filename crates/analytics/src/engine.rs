use crate::error::AnalyticsError;
use crate::report::{FinancialSummary, SummaryInsights, UserInfo, UserSummaryReport};
use core_types::{Transaction, TransactionType, User};
use rust_decimal::Decimal;

/// How many transactions a summary page shows by default.
pub const DEFAULT_RECENT_TRANSACTIONS: usize = 5;

/// A stateless calculator that derives a user's financial position from
/// their transaction history.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinancialAggregator {}

impl FinancialAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the `FinancialSummary` of `user` from `transactions`.
    ///
    /// Only COMPLETED transactions move money; every transaction supplied for
    /// the user counts towards `total_transactions`. The order of
    /// `transactions` does not matter.
    ///
    /// # Errors
    ///
    /// `AnalyticsError::MissingBalance` when the user has no initial balance,
    /// `AnalyticsError::AmountOverflow` when a total leaves the `Decimal` range.
    pub fn summarize(
        &self,
        user: &User,
        transactions: &[Transaction],
    ) -> Result<FinancialSummary, AnalyticsError> {
        let initial_balance = user.initial_balance.ok_or_else(|| AnalyticsError::MissingBalance {
            user_id: user.user_id.clone(),
        })?;

        let mut summary = FinancialSummary::opening(initial_balance);

        let overflow = || AnalyticsError::AmountOverflow {
            user_id: user.user_id.clone(),
        };

        for transaction in Self::owned_by(user, transactions) {
            summary.total_transactions += 1;

            if !transaction.is_completed() {
                continue;
            }

            let total = match transaction.transaction_type {
                TransactionType::Purchase => &mut summary.total_purchases,
                TransactionType::Sale => &mut summary.total_sales,
            };
            *total = total
                .checked_add(transaction.magnitude())
                .ok_or_else(overflow)?;
        }

        summary.net_profit_loss = summary
            .total_sales
            .checked_sub(summary.total_purchases)
            .ok_or_else(overflow)?;
        summary.current_balance = initial_balance
            .checked_add(summary.net_profit_loss)
            .ok_or_else(overflow)?;
        summary.is_net_positive = summary.net_profit_loss >= Decimal::ZERO;

        Ok(summary)
    }

    /// Builds the full summary composite: identity, totals, the most recent
    /// `recent_limit` transactions (newest first) and derived insights.
    pub fn summarize_report(
        &self,
        user: &User,
        transactions: &[Transaction],
        recent_limit: usize,
    ) -> Result<UserSummaryReport, AnalyticsError> {
        let financial_summary = self.summarize(user, transactions)?;

        let mut recent_transactions: Vec<Transaction> =
            Self::owned_by(user, transactions).cloned().collect();
        recent_transactions.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        recent_transactions.truncate(recent_limit);

        let insights = SummaryInsights::derive(&financial_summary, &recent_transactions);

        Ok(UserSummaryReport {
            user_info: UserInfo::from(user),
            financial_summary,
            recent_transactions,
            insights,
        })
    }

    /// Transactions that actually belong to `user`. Anything else is skipped.
    fn owned_by<'a>(
        user: &'a User,
        transactions: &'a [Transaction],
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        transactions.iter().filter(move |t| {
            let owned = t.user_id == user.user_id;
            if !owned {
                tracing::warn!(
                    transaction_id = %t.transaction_id,
                    owner = %t.user_id,
                    user_id = %user.user_id,
                    "Skipping transaction that belongs to another user."
                );
            }
            owned
        })
    }
}
