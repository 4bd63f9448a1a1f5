//! Persisted user settings
//!
//! Last selected floor and hidden categories, stored as RON in the platform
//! config dir. Missing or corrupt settings fall back to defaults silently -
//! settings are a convenience, never a load-bearing input.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SETTINGS_DIR_NAME: &str = "dungeon-atlas";
const SETTINGS_FILE_NAME: &str = "settings.ron";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub last_floor: String,
    pub hidden_categories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_floor: crate::floor::FLOORS[0].to_string(),
            hidden_categories: Vec::new(),
        }
    }
}

impl Settings {
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Load from the platform config dir, defaulting on any failure.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path, defaulting on any failure.
    pub fn load_from(path: &std::path::Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| ron::from_str(&text).ok())
            .unwrap_or_default()
    }

    /// Save to the platform config dir. Failures are logged, not fatal.
    pub fn save(&self) {
        if let Some(path) = Self::default_path() {
            if let Err(e) = self.save_to(&path) {
                eprintln!("Failed to save settings: {}", e);
            }
        }
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.ron");

        let settings = Settings {
            last_floor: "Level 6.5".to_string(),
            hidden_categories: vec!["Runes".to_string(), "Stairs".to_string()],
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_missing_or_corrupt_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.ron");
        assert_eq!(Settings::load_from(&missing), Settings::default());

        let corrupt = dir.path().join("bad.ron");
        std::fs::write(&corrupt, "(((").unwrap();
        assert_eq!(Settings::load_from(&corrupt), Settings::default());
    }

    #[test]
    fn test_default_floor_is_first_in_catalog() {
        assert_eq!(Settings::default().last_floor, "Level 1");
    }
}
