use crate::error::AnalyticsError;
use crate::report::{FinancialSummary, LeaderboardEntry};
use core_types::{SortDirection, User};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The `FinancialSummary` field a leaderboard is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankField {
    #[default]
    NetProfitLoss,
    CurrentBalance,
    TotalSales,
    TotalPurchases,
    TotalTransactions,
}

impl RankField {
    pub const ALL: [RankField; 5] = [
        RankField::NetProfitLoss,
        RankField::CurrentBalance,
        RankField::TotalSales,
        RankField::TotalPurchases,
        RankField::TotalTransactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankField::NetProfitLoss => "netProfitLoss",
            RankField::CurrentBalance => "currentBalance",
            RankField::TotalSales => "totalSales",
            RankField::TotalPurchases => "totalPurchases",
            RankField::TotalTransactions => "totalTransactions",
        }
    }

    /// Reads this field out of a summary.
    pub fn value(&self, summary: &FinancialSummary) -> Decimal {
        match self {
            RankField::NetProfitLoss => summary.net_profit_loss,
            RankField::CurrentBalance => summary.current_balance,
            RankField::TotalSales => summary.total_sales,
            RankField::TotalPurchases => summary.total_purchases,
            RankField::TotalTransactions => Decimal::from(summary.total_transactions),
        }
    }

    fn entry_value(&self, entry: &LeaderboardEntry) -> Decimal {
        self.value(&entry.summary())
    }
}

impl FromStr for RankField {
    type Err = AnalyticsError;

    /// Accepts the camelCase API names as well as their snake_case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.trim().chars().filter(|c| *c != '_').collect();
        RankField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| AnalyticsError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for RankField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user paired with their derived summary, ready to be ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithSummary {
    pub user: User,
    pub summary: FinancialSummary,
}

/// Orders users into a leaderboard.
///
/// Ranks are position based: every row gets a distinct rank `1..=N`. Rows
/// with equal values are separated by ascending `user_id` in both
/// directions, so the same input always produces the same board.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaderboardRanker {}

impl LeaderboardRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranks `users` by `order_by` in `direction` and keeps the first `limit` rows.
    pub fn rank(
        &self,
        users: &[UserWithSummary],
        order_by: RankField,
        direction: SortDirection,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AnalyticsError> {
        let limit = validate_limit(limit)?;

        let mut ordered: Vec<&UserWithSummary> = users.iter().collect();
        ordered.sort_by(|a, b| {
            compare(
                direction,
                (order_by.value(&a.summary), a.user.user_id.as_str()),
                (order_by.value(&b.summary), b.user.user_id.as_str()),
            )
        });

        Ok(ordered
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, row)| LeaderboardEntry::new(i + 1, &row.user, &row.summary))
            .collect())
    }

    /// Checks that an already-ranked board (for example one computed by the
    /// server) follows the same rules `rank` does.
    pub fn verify_ranking(
        &self,
        entries: &[LeaderboardEntry],
        order_by: RankField,
        direction: SortDirection,
    ) -> Result<(), AnalyticsError> {
        for (position, entry) in entries.iter().enumerate() {
            if entry.rank != position + 1 {
                return Err(AnalyticsError::InconsistentRanking(format!(
                    "row {} for user '{}' carries rank {}",
                    position + 1,
                    entry.user_id,
                    entry.rank
                )));
            }
        }

        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordering = compare(
                direction,
                (order_by.entry_value(a), a.user_id.as_str()),
                (order_by.entry_value(b), b.user_id.as_str()),
            );
            if ordering != Ordering::Less {
                return Err(AnalyticsError::InconsistentRanking(format!(
                    "user '{}' (rank {}) is placed before user '{}' (rank {}) but does not sort before it by {} {}",
                    a.user_id, a.rank, b.user_id, b.rank, order_by, direction
                )));
            }
        }

        Ok(())
    }
}

fn validate_limit(limit: i64) -> Result<usize, AnalyticsError> {
    if limit <= 0 {
        return Err(AnalyticsError::InvalidLimit(limit));
    }
    usize::try_from(limit).map_err(|_| AnalyticsError::InvalidLimit(limit))
}

/// Strict total order: the value in the requested direction, then the user id
/// ascending regardless of direction.
fn compare(direction: SortDirection, a: (Decimal, &str), b: (Decimal, &str)) -> Ordering {
    let by_value = match direction {
        SortDirection::Desc => b.0.cmp(&a.0),
        SortDirection::Asc => a.0.cmp(&b.0),
    };
    by_value.then_with(|| a.1.cmp(b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::UserStatus;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn row(id: &str, net_profit_loss: Decimal) -> UserWithSummary {
        let mut summary = FinancialSummary::opening(dec!(100));
        summary.net_profit_loss = net_profit_loss;
        summary.current_balance = dec!(100) + net_profit_loss;
        summary.is_net_positive = net_profit_loss >= Decimal::ZERO;
        UserWithSummary {
            user: User {
                user_id: id.to_string(),
                name: id.to_uppercase(),
                email: format!("{}@example.com", id),
                status: UserStatus::Active,
                member_since: None,
                initial_balance: Some(dec!(100)),
            },
            summary,
        }
    }

    fn ids(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.user_id.as_str()).collect()
    }

    #[test]
    fn test_ties_break_on_ascending_user_id() {
        let users = vec![row("b", dec!(10)), row("c", dec!(5)), row("a", dec!(10))];

        let board = LeaderboardRanker::new()
            .rank(&users, RankField::NetProfitLoss, SortDirection::Desc, 2)
            .unwrap();

        assert_eq!(ids(&board), vec!["a", "b"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_ascending_keeps_tie_break_direction() {
        let users = vec![row("b", dec!(10)), row("c", dec!(5)), row("a", dec!(10))];

        let board = LeaderboardRanker::new()
            .rank(&users, RankField::NetProfitLoss, SortDirection::Asc, 10)
            .unwrap();

        assert_eq!(ids(&board), vec!["c", "a", "b"]);
        assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_limit_must_be_positive() {
        let ranker = LeaderboardRanker::new();
        assert_eq!(
            ranker.rank(&[], RankField::NetProfitLoss, SortDirection::Desc, 0),
            Err(AnalyticsError::InvalidLimit(0))
        );
        assert_eq!(
            ranker.rank(&[], RankField::NetProfitLoss, SortDirection::Desc, -3),
            Err(AnalyticsError::InvalidLimit(-3))
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = "karma".parse::<RankField>().unwrap_err();
        assert_eq!(err, AnalyticsError::UnknownField("karma".to_string()));
    }

    #[test]
    fn test_field_names_parse_in_both_spellings() {
        assert_eq!("netProfitLoss".parse::<RankField>().unwrap(), RankField::NetProfitLoss);
        assert_eq!("current_balance".parse::<RankField>().unwrap(), RankField::CurrentBalance);
        assert_eq!("TOTAL_SALES".parse::<RankField>().unwrap(), RankField::TotalSales);
    }

    #[test]
    fn test_rank_by_other_field() {
        let mut rich = row("rich", dec!(-5));
        rich.summary.current_balance = dec!(10000);
        let users = vec![row("a", dec!(50)), rich];

        let field = "currentBalance".parse::<RankField>().unwrap();
        let board = LeaderboardRanker::new()
            .rank(&users, field, SortDirection::Desc, 5)
            .unwrap();

        assert_eq!(ids(&board), vec!["rich", "a"]);
    }

    #[test]
    fn test_verify_accepts_own_output() {
        let users = vec![row("b", dec!(10)), row("c", dec!(5)), row("a", dec!(10))];
        let ranker = LeaderboardRanker::new();
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let board = ranker.rank(&users, RankField::NetProfitLoss, direction, 10).unwrap();
            assert!(ranker.verify_ranking(&board, RankField::NetProfitLoss, direction).is_ok());
        }
    }

    #[test]
    fn test_verify_rejects_misordered_or_misnumbered_boards() {
        let users = vec![row("a", dec!(10)), row("b", dec!(5))];
        let ranker = LeaderboardRanker::new();
        let board = ranker.rank(&users, RankField::NetProfitLoss, SortDirection::Desc, 10).unwrap();

        let mut misnumbered = board.clone();
        misnumbered[1].rank = 3;
        assert!(matches!(
            ranker.verify_ranking(&misnumbered, RankField::NetProfitLoss, SortDirection::Desc),
            Err(AnalyticsError::InconsistentRanking(_))
        ));

        assert!(matches!(
            ranker.verify_ranking(&board, RankField::NetProfitLoss, SortDirection::Asc),
            Err(AnalyticsError::InconsistentRanking(_))
        ));
    }

    fn arb_rows() -> impl Strategy<Value = Vec<UserWithSummary>> {
        prop::collection::btree_map("[a-z]{1,6}", -100_000i64..100_000i64, 0..30).prop_map(|m| {
            m.into_iter()
                .map(|(id, cents)| row(&id, Decimal::new(cents, 2)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_limit_truncates_to_min(users in arb_rows(), limit in 1i64..40) {
            let board = LeaderboardRanker::new()
                .rank(&users, RankField::NetProfitLoss, SortDirection::Desc, limit)
                .unwrap();
            prop_assert_eq!(board.len(), std::cmp::min(limit as usize, users.len()));
            for (i, entry) in board.iter().enumerate() {
                prop_assert_eq!(entry.rank, i + 1);
            }
        }

        #[test]
        fn prop_desc_reversed_equals_asc_without_ties(
            values in prop::collection::btree_set(-100_000i64..100_000i64, 0..30),
        ) {
            let users: Vec<UserWithSummary> = values
                .iter()
                .enumerate()
                .map(|(i, cents)| row(&format!("user{:02}", i), Decimal::new(*cents, 2)))
                .collect();
            let n = users.len().max(1) as i64;
            let ranker = LeaderboardRanker::new();

            let mut desc = ranker.rank(&users, RankField::NetProfitLoss, SortDirection::Desc, n).unwrap();
            let asc = ranker.rank(&users, RankField::NetProfitLoss, SortDirection::Asc, n).unwrap();
            desc.reverse();

            prop_assert_eq!(ids(&desc), ids(&asc));
        }

        #[test]
        fn prop_ranking_is_reproducible(users in arb_rows()) {
            let ranker = LeaderboardRanker::new();
            let mut shuffled = users.clone();
            shuffled.reverse();
            let first = ranker.rank(&users, RankField::NetProfitLoss, SortDirection::Desc, 50).unwrap();
            let second = ranker.rank(&shuffled, RankField::NetProfitLoss, SortDirection::Desc, 50).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
