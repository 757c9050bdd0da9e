use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The dark/light preference of the presentation layer.
///
/// Passed explicitly to whatever renders output; the preference survives
/// between runs in a small TOML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub dark_mode: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

impl ThemeConfig {
    /// Reads the stored preference, falling back to the default when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No stored theme preference, using default.");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Flips the preference and persists it.
    pub fn toggle(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.dark_mode = !self.dark_mode;
        self.save(path)?;
        tracing::info!(dark_mode = self.dark_mode, "Theme preference updated.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_defaults_to_dark() {
        let dir = tempfile::tempdir().unwrap();
        let theme = ThemeConfig::load(&dir.path().join("theme.toml")).unwrap();
        assert!(theme.dark_mode);
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.toml");

        let mut theme = ThemeConfig::load(&path).unwrap();
        theme.toggle(&path).unwrap();
        assert!(!theme.dark_mode);

        let reloaded = ThemeConfig::load(&path).unwrap();
        assert_eq!(reloaded, theme);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.toml");
        fs::write(&path, "dark_mode = \"maybe\"").unwrap();
        assert!(matches!(ThemeConfig::load(&path), Err(ConfigError::ThemeParse(_))));
    }
}
