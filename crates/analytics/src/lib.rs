//! # Marquee Analytics
//!
//! This crate derives the financial view of marketplace users: what each user
//! has bought and sold, where their balance stands, and how they rank against
//! everyone else.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the
//!   remote API. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `FinancialAggregator` and `LeaderboardRanker`
//!   take already-fetched records as input and produce derived views as
//!   output. Nothing is cached between calls.
//! - **Exact Arithmetic:** All money is `rust_decimal::Decimal`. Rounding to
//!   cents is left to the presentation layer.
//!
//! ## Public API
//!
//! - `FinancialAggregator`: turns a user and their transactions into a `FinancialSummary`.
//! - `LeaderboardRanker`: orders summarized users into `LeaderboardEntry` rows.
//! - `AnalyticsError`: the input errors that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod ranker;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{FinancialAggregator, DEFAULT_RECENT_TRANSACTIONS};
pub use error::AnalyticsError;
pub use ranker::{LeaderboardRanker, RankField, UserWithSummary};
pub use report::{
    BalanceStanding, FinancialSummary, LeaderboardEntry, SummaryInsights, UserInfo,
    UserSummaryReport,
};
