use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Failed to access the theme preference file: {0}")]
    ThemeIo(#[from] std::io::Error),

    #[error("Failed to parse the theme preference file: {0}")]
    ThemeParse(#[from] toml::de::Error),

    #[error("Failed to write the theme preference file: {0}")]
    ThemeSerialize(#[from] toml::ser::Error),
}
