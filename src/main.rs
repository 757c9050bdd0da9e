use analytics::RankField;
use anyhow::Context;
use chrono::NaiveDate;
use api_client::HttpApiClient;
use clap::{Parser, Subcommand};
use configuration::{LeaderboardSource, LoggingSettings, Settings, ThemeConfig};
use core_types::{DateWindow, SortDirection};
use engine::error::EngineError;
use engine::{CancelToken, LeaderboardQuery, ReportEngine};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod display;

use display::Palette;

/// The main entry point for the Marquee reporting tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; MARQUEE__* variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = init_tracing(&settings.logging)?;

    let theme = ThemeConfig::load(&settings.display.theme_file)?;

    match cli.command {
        Commands::Theme(args) => handle_theme(args, theme, &settings),
        Commands::Summary(args) => handle_summary(args, cli.json, &theme, settings).await,
        Commands::Leaderboard(args) => handle_leaderboard(args, cli.json, &theme, settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Financial summaries and leaderboards for the movie-ticket marketplace.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a user's financial summary and recent transactions.
    Summary(SummaryArgs),
    /// Rank users by a financial field.
    Leaderboard(LeaderboardArgs),
    /// Show or toggle the dark/light display preference.
    Theme(ThemeArgs),
}

#[derive(Parser)]
struct SummaryArgs {
    /// The user to summarize.
    user_id: String,

    /// Use the summary composed by the server instead of deriving it here.
    #[arg(long)]
    remote: bool,

    /// Only count transactions from this day on (format: YYYY-MM-DD, UTC).
    #[arg(long, requires = "to", conflicts_with = "remote")]
    from: Option<NaiveDate>,

    /// Only count transactions up to and including this day (format: YYYY-MM-DD, UTC).
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

impl SummaryArgs {
    fn window(&self) -> anyhow::Result<Option<DateWindow>> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok(Some(DateWindow::from_dates(from, to)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Parser)]
struct LeaderboardArgs {
    /// Number of rows to show (defaults to `leaderboard.default_limit`).
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Sort direction: asc or desc.
    #[arg(long)]
    order: Option<SortDirection>,

    /// Field to rank by, e.g. netProfitLoss, currentBalance, totalSales.
    #[arg(long = "by")]
    order_by: Option<String>,

    /// Ask the server for its pre-ranked leaderboard.
    #[arg(long)]
    remote: bool,

    /// Check the server's leaderboard against the local ranking rules (with --remote).
    #[arg(long)]
    verify: bool,
}

#[derive(Parser)]
struct ThemeArgs {
    /// Flip between dark and light mode.
    #[arg(long)]
    toggle: bool,
}

// ==============================================================================
// Setup
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` wins over `logging.level`.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "marquee.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

fn build_engine(settings: Settings) -> anyhow::Result<ReportEngine> {
    let client = HttpApiClient::new(&settings.api).context("Failed to create the API client")?;
    Ok(ReportEngine::new(Arc::new(client), settings))
}

/// A token that is cancelled when the user presses Ctrl-C.
fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling.");
            trigger.cancel();
        }
    });
    cancel
}

/// Logs the full error and hands back the copy meant for the user.
fn report_failure(context: &str, err: EngineError) -> anyhow::Error {
    tracing::error!(
        error = %err,
        transport = err.is_transport(),
        derived = err.is_derived(),
        "{} failed.",
        context
    );
    anyhow::anyhow!(err.user_message())
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_theme(args: ThemeArgs, mut theme: ThemeConfig, settings: &Settings) -> anyhow::Result<()> {
    if args.toggle {
        theme.toggle(&settings.display.theme_file)?;
    }
    println!("Theme: {}", if theme.dark_mode { "dark" } else { "light" });
    Ok(())
}

async fn handle_summary(
    args: SummaryArgs,
    json: bool,
    theme: &ThemeConfig,
    settings: Settings,
) -> anyhow::Result<()> {
    let window = args.window()?;
    let engine = build_engine(settings)?;
    let cancel = cancel_on_ctrl_c();

    let report = if args.remote {
        engine.remote_user_summary(&args.user_id, &cancel).await
    } else {
        engine.user_summary(&args.user_id, window, &cancel).await
    }
    .map_err(|err| report_failure("Summary", err))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let palette = Palette::for_theme(theme);
        if let Some(window) = window {
            println!("Transactions from {}", window);
        }
        for table in display::summary_tables(&report, &palette) {
            println!("{table}");
        }
    }
    Ok(())
}

async fn handle_leaderboard(
    args: LeaderboardArgs,
    json: bool,
    theme: &ThemeConfig,
    settings: Settings,
) -> anyhow::Result<()> {
    let mut query = LeaderboardQuery::from_settings(&settings.leaderboard)?;
    if let Some(limit) = args.limit {
        query.limit = limit;
    }
    if let Some(order) = args.order {
        query.order = order;
    }
    if let Some(order_by) = &args.order_by {
        query.order_by = order_by.parse::<RankField>()?;
    }
    if args.remote {
        query.source = LeaderboardSource::Remote;
    }
    query.verify = args.verify;

    let engine = build_engine(settings)?;
    let cancel = cancel_on_ctrl_c();

    let progress = if json || query.source == LeaderboardSource::Remote {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} users {msg}")?
                .progress_chars("#>-"),
        );
        bar
    };

    let bar = progress.clone();
    let result = engine
        .leaderboard_with_progress(&query, &cancel, move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await;
    progress.finish_and_clear();

    let entries = result.map_err(|err| report_failure("Leaderboard", err))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No users to rank.");
    } else {
        let palette = Palette::for_theme(theme);
        println!(
            "Top {} by {} ({})",
            entries.len(),
            query.order_by,
            query.order
        );
        println!("{}", display::leaderboard_table(&entries, &palette));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_args(argv: &[&str]) -> Result<SummaryArgs, clap::Error> {
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Commands::Summary(args) => Ok(args),
            _ => panic!("expected the summary command"),
        }
    }

    #[test]
    fn test_summary_window_flags() {
        let args = summary_args(&["marquee", "summary", "alice", "--from", "2024-03-01", "--to", "2024-03-31"]).unwrap();
        let window = args.window().unwrap().unwrap();
        assert_eq!(window.to_string(), "2024-03-01 to 2024-03-31");

        let args = summary_args(&["marquee", "summary", "alice"]).unwrap();
        assert_eq!(args.window().unwrap(), None);

        let args = summary_args(&["marquee", "summary", "alice", "--from", "2024-03-31", "--to", "2024-03-01"]).unwrap();
        assert!(args.window().is_err());

        assert!(summary_args(&["marquee", "summary", "alice", "--from", "2024-03-01"]).is_err());
        assert!(summary_args(&["marquee", "summary", "alice", "--to", "2024-03-01"]).is_err());
        assert!(summary_args(&["marquee", "summary", "alice", "--from", "March", "--to", "2024-03-01"]).is_err());
        assert!(
            summary_args(&["marquee", "summary", "alice", "--remote", "--from", "2024-03-01", "--to", "2024-03-02"])
                .is_err()
        );
    }
}
