//! Runtime configuration for the pomodoro timer
//!
//! User preferences (durations, goals) are stored with the rest of the data;
//! this file only covers how the tool itself runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language used for day and month labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Turkish,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::English => "english",
            Locale::Turkish => "turkish",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "english" | "en" => Some(Locale::English),
            "turkish" | "tr" => Some(Locale::Turkish),
            _ => None,
        }
    }

    /// Day abbreviations, Monday first
    pub fn weekday_labels(&self) -> [&'static str; 7] {
        match self {
            Locale::English => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            Locale::Turkish => ["Pzt", "Sal", "Çar", "Per", "Cum", "Cmt", "Paz"],
        }
    }

    /// Month abbreviations, January first
    pub fn month_labels(&self) -> [&'static str; 12] {
        match self {
            Locale::English => [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ],
            Locale::Turkish => [
                "Oca", "Şub", "Mar", "Nis", "May", "Haz", "Tem", "Ağu", "Eyl", "Eki", "Kas", "Ara",
            ],
        }
    }
}

/// Global pomodoro configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How often the foreground timer polls the engine (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Label language for statistics
    #[serde(default)]
    pub locale: Locale,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            locale: Locale::default(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Tick interval clamped to at least one millisecond
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.locale, Locale::English);
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"locale": "turkish"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.locale, Locale::Turkish);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            tick_interval_ms: 100,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.tick_interval_ms, 100);
    }

    #[test]
    fn test_locale_labels() {
        assert_eq!(Locale::English.weekday_labels()[6], "Sun");
        assert_eq!(Locale::Turkish.weekday_labels()[0], "Pzt");
        assert_eq!(Locale::English.month_labels()[1], "Feb");
        assert_eq!(Locale::from_str("TR"), Some(Locale::Turkish));
        assert_eq!(Locale::from_str("klingon"), None);
    }
}
