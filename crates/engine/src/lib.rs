//! # Engine
//!
//! The orchestrator between the marketplace API and the derivation logic.
//!
//! ## Architecture
//!
//! - **Fetching:** all I/O goes through the `api_client::ApiClient` trait.
//!   A summary fetches the user and their transactions concurrently; the
//!   local leaderboard fans out one transactions request per user, bounded by
//!   `leaderboard.concurrency`.
//! - **Deriving:** once the data is in, `analytics` does the arithmetic and
//!   ranking. Nothing is derived from partial data: a history that fills the
//!   whole transactions page is treated as truncated and rejected.
//! - **Cancellation:** every query takes a [`CancelToken`]. Cancelling drops
//!   the in-flight requests and the query returns [`EngineError::Cancelled`].

use crate::error::EngineError;
use analytics::{
    AnalyticsError, FinancialAggregator, LeaderboardEntry, LeaderboardRanker, RankField,
    UserSummaryReport, UserWithSummary,
};
use api_client::error::ApiError;
use api_client::ApiClient;
use configuration::{LeaderboardSettings, LeaderboardSource, Settings};
use core_types::{DateWindow, SortDirection, Transaction};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;

pub mod cancel;
pub mod error;

pub use cancel::CancelToken;

/// What the caller wants from a leaderboard query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub limit: i64,
    pub order: SortDirection,
    pub order_by: RankField,
    pub source: LeaderboardSource,
    /// Check a server-ranked board against the local ranking rules.
    pub verify: bool,
}

impl LeaderboardQuery {
    /// The query described by the `[leaderboard]` configuration section.
    pub fn from_settings(settings: &LeaderboardSettings) -> Result<Self, EngineError> {
        Ok(Self {
            limit: settings.default_limit,
            order: settings.default_order,
            order_by: settings.order_by.parse()?,
            source: settings.source,
            verify: false,
        })
    }
}

pub struct ReportEngine {
    client: Arc<dyn ApiClient>,
    settings: Settings,
    aggregator: FinancialAggregator,
    ranker: LeaderboardRanker,
}

impl ReportEngine {
    pub fn new(client: Arc<dyn ApiClient>, settings: Settings) -> Self {
        Self {
            client,
            settings,
            aggregator: FinancialAggregator::new(),
            ranker: LeaderboardRanker::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds a user's summary from their record and transaction history.
    ///
    /// Both are requested at once; the summary is only derived after both
    /// have arrived, and either failure fails the whole query. With a
    /// `window`, only transactions inside it count towards the totals.
    pub async fn user_summary(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
        cancel: &CancelToken,
    ) -> Result<UserSummaryReport, EngineError> {
        tracing::info!(user_id, window = ?window, "Building user summary.");

        until_cancelled(cancel, async {
            let page_limit = self.settings.api.transactions_page_limit;
            let (user, transactions) = tokio::try_join!(
                self.client.get_user(user_id),
                self.client.get_user_transactions(user_id, page_limit, window),
            )?;
            ensure_complete(user_id, &transactions, page_limit)?;

            let report = self.aggregator.summarize_report(
                &user,
                &transactions,
                self.settings.display.recent_transactions,
            )?;
            Ok(report)
        })
        .await
    }

    /// The summary as composed by the server.
    pub async fn remote_user_summary(
        &self,
        user_id: &str,
        cancel: &CancelToken,
    ) -> Result<UserSummaryReport, EngineError> {
        tracing::info!(user_id, "Fetching server-side user summary.");
        until_cancelled(cancel, async { Ok(self.client.get_user_summary(user_id).await?) }).await
    }

    pub async fn leaderboard(
        &self,
        query: &LeaderboardQuery,
        cancel: &CancelToken,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        self.leaderboard_with_progress(query, cancel, |_, _| {}).await
    }

    /// Runs a leaderboard query, reporting `(done, total)` as the per-user
    /// fetches of a local ranking complete.
    pub async fn leaderboard_with_progress<F>(
        &self,
        query: &LeaderboardQuery,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<Vec<LeaderboardEntry>, EngineError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let limit = self.effective_limit(query.limit)?;
        tracing::info!(
            limit,
            order = %query.order,
            order_by = %query.order_by,
            source = ?query.source,
            "Building leaderboard."
        );

        until_cancelled(cancel, async move {
            match query.source {
                LeaderboardSource::Local => self.local_leaderboard(query, limit, on_progress).await,
                LeaderboardSource::Remote => self.remote_leaderboard(query, limit).await,
            }
        })
        .await
    }

    /// Rejects non-positive limits and caps the rest at `leaderboard.max_limit`.
    fn effective_limit(&self, requested: i64) -> Result<i64, EngineError> {
        if requested <= 0 {
            return Err(AnalyticsError::InvalidLimit(requested).into());
        }
        let max_limit = self.settings.leaderboard.max_limit;
        if requested > max_limit {
            tracing::warn!(requested, max_limit, "Leaderboard limit capped.");
            return Ok(max_limit);
        }
        Ok(requested)
    }

    async fn local_leaderboard<F>(
        &self,
        query: &LeaderboardQuery,
        limit: i64,
        mut on_progress: F,
    ) -> Result<Vec<LeaderboardEntry>, EngineError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let users = self.client.get_all_users().await?;
        let total = users.len();
        on_progress(0, total);

        let client = &self.client;
        let page_limit = self.settings.api.transactions_page_limit;
        let mut fetches = stream::iter(users)
            .map(|user| async move {
                let transactions = client.get_user_transactions(&user.user_id, page_limit, None).await?;
                Ok::<_, ApiError>((user, transactions))
            })
            .buffer_unordered(self.settings.leaderboard.concurrency);

        let mut rows = Vec::with_capacity(total);
        let mut done = 0;
        while let Some(fetched) = fetches.next().await {
            let (user, transactions) = fetched?;
            ensure_complete(&user.user_id, &transactions, page_limit)?;
            done += 1;
            on_progress(done, total);

            match self.aggregator.summarize(&user, &transactions) {
                Ok(summary) => rows.push(UserWithSummary { user, summary }),
                Err(AnalyticsError::MissingBalance { user_id }) => {
                    tracing::warn!(%user_id, "User has no initial balance, left off the leaderboard.");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::debug!(ranked = rows.len(), total, "Per-user summaries derived.");
        Ok(self.ranker.rank(&rows, query.order_by, query.order, limit)?)
    }

    async fn remote_leaderboard(
        &self,
        query: &LeaderboardQuery,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        // The server only ranks by net profit/loss.
        if query.order_by != RankField::NetProfitLoss {
            return Err(EngineError::Configuration(format!(
                "the server leaderboard is ranked by {} only, not {}",
                RankField::NetProfitLoss,
                query.order_by
            )));
        }

        let mut entries = self.client.get_leaderboard(limit, query.order).await?;
        if entries.len() as i64 > limit {
            tracing::warn!(rows = entries.len(), limit, "Server returned more rows than requested.");
            entries.truncate(limit as usize);
        }

        if query.verify {
            match self.ranker.verify_ranking(&entries, query.order_by, query.order) {
                Ok(()) => tracing::debug!(rows = entries.len(), "Server leaderboard verified."),
                Err(AnalyticsError::InconsistentRanking(detail)) => {
                    return Err(EngineError::RankingViolation(detail));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(entries)
    }
}

/// A full page means the server may have more; totals over it would be understated.
fn ensure_complete(user_id: &str, transactions: &[Transaction], page_limit: u32) -> Result<(), EngineError> {
    if transactions.len() >= page_limit as usize {
        tracing::warn!(user_id, page_limit, "Transaction history fills the page, refusing to derive from it.");
        return Err(EngineError::TruncatedHistory {
            user_id: user_id.to_string(),
            limit: page_limit,
        });
    }
    Ok(())
}

/// Runs `work` unless `cancel` fires first, in which case `work` is dropped.
async fn until_cancelled<T, Fut>(cancel: &CancelToken, work: Fut) -> Result<T, EngineError>
where
    Fut: Future<Output = Result<T, EngineError>>,
{
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("Query cancelled, in-flight requests dropped.");
            Err(EngineError::Cancelled)
        }
        result = work => result,
    }
}
