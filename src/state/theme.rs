// src/state/theme.rs
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Display theme. Process-wide and independent of identity; dark is
/// the product default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    theme: Theme,
}

/// File-backed theme preference so the choice survives restarts.
pub struct ThemePreferences {
    path: PathBuf,
}

impl ThemePreferences {
    pub fn new(path: impl Into<PathBuf>) -> ThemePreferences {
        ThemePreferences { path: path.into() }
    }

    /// Stored theme, or the default when the file is missing or
    /// malformed.
    pub fn load(&self) -> Theme {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Theme::default(),
        };
        match toml::from_str::<PreferenceFile>(&content) {
            Ok(prefs) => prefs.theme,
            Err(e) => {
                warn!(
                    "Ignoring malformed preference file {}: {}",
                    self.path.display(),
                    e
                );
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content =
            toml::to_string(&PreferenceFile { theme }).context("Failed to serialize preferences")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dark() {
        assert_eq!(Theme::default(), Theme::Dark);
    }

    #[test]
    fn test_toggle_flips() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn test_as_str_matches_serialized_form() {
        // The class name the view applies must agree with what the
        // preference file stores.
        for theme in [Theme::Light, Theme::Dark] {
            let content = toml::to_string(&PreferenceFile { theme }).unwrap();
            assert!(content.contains(theme.as_str()));
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let prefs = ThemePreferences::new(dir.path().join("prefs.toml"));
        assert_eq!(prefs.load(), Theme::Dark);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let prefs = ThemePreferences::new(dir.path().join("nested").join("prefs.toml"));

        prefs.save(Theme::Light).unwrap();
        assert_eq!(prefs.load(), Theme::Light);

        prefs.save(Theme::Dark).unwrap();
        assert_eq!(prefs.load(), Theme::Dark);
    }

    #[test]
    fn test_malformed_file_falls_back_to_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "theme = 42").unwrap();
        assert_eq!(ThemePreferences::new(path).load(), Theme::Dark);
    }
}
