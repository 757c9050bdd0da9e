use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod theme;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ApiSettings, DisplaySettings, LeaderboardSettings, LeaderboardSource, LoggingSettings,
    Settings, MAX_TRANSACTIONS_PAGE,
};
pub use theme::ThemeConfig;

/// Prefix of environment variables that override file settings,
/// e.g. `MARQUEE__API__BASE_URL`.
pub const ENV_PREFIX: &str = "MARQUEE";

/// Loads the application configuration.
///
/// Settings are layered: built-in defaults, then the TOML file at `path` (if
/// it exists), then `MARQUEE__SECTION__KEY` environment variables. The result
/// is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    tracing::debug!(base_url = %settings.api.base_url, "Configuration loaded.");
    Ok(settings)
}

/// Rejects settings the rest of the application cannot work with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError("api.base_url must not be empty".to_string()));
    }
    let page = settings.api.transactions_page_limit;
    if page == 0 || page > MAX_TRANSACTIONS_PAGE {
        return Err(ConfigError::ValidationError(format!(
            "api.transactions_page_limit must be between 1 and {}, got {}",
            MAX_TRANSACTIONS_PAGE, page
        )));
    }

    let board = &settings.leaderboard;
    if board.max_limit <= 0 {
        return Err(ConfigError::ValidationError(
            "leaderboard.max_limit must be positive".to_string(),
        ));
    }
    if board.default_limit < 1 || board.default_limit > board.max_limit {
        return Err(ConfigError::ValidationError(format!(
            "leaderboard.default_limit must be between 1 and {}, got {}",
            board.max_limit, board.default_limit
        )));
    }
    if board.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "leaderboard.concurrency must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SortDirection;
    use std::fs;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(settings.api.max_retries, 2);
        assert_eq!(settings.api.transactions_page_limit, MAX_TRANSACTIONS_PAGE);
        assert_eq!(settings.leaderboard.default_limit, 10);
        assert_eq!(settings.leaderboard.default_order, SortDirection::Desc);
        assert_eq!(settings.leaderboard.source, LeaderboardSource::Local);
        assert_eq!(settings.display.recent_transactions, 5);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://tickets.example.com/dev"
timeout_secs = 3

[leaderboard]
default_limit = 25
default_order = "asc"
source = "remote"
"#,
        )
        .unwrap();

        let settings = load_config(&path).unwrap();
        assert_eq!(settings.api.base_url, "https://tickets.example.com/dev");
        assert_eq!(settings.api.timeout().as_secs(), 3);
        assert_eq!(settings.api.max_retries, 2);
        assert_eq!(settings.leaderboard.default_limit, 25);
        assert_eq!(settings.leaderboard.default_order, SortDirection::Asc);
        assert_eq!(settings.leaderboard.source, LeaderboardSource::Remote);
    }

    #[test]
    fn test_validation_rejects_bad_limits() {
        let mut settings = Settings::default();
        settings.leaderboard.default_limit = 80;
        assert!(matches!(validate(&settings), Err(ConfigError::ValidationError(_))));

        let mut settings = Settings::default();
        settings.leaderboard.concurrency = 0;
        assert!(validate(&settings).is_err());

        let mut settings = Settings::default();
        settings.api.base_url = "  ".to_string();
        assert!(validate(&settings).is_err());

        for page in [0, MAX_TRANSACTIONS_PAGE + 1] {
            let mut settings = Settings::default();
            settings.api.transactions_page_limit = page;
            assert!(validate(&settings).is_err());
        }
    }
}
