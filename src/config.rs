//! Runtime configuration
//!
//! Loaded from a TOML file; every field has a default so an absent file is
//! valid. `SCREENWISE_DATA` and `SCREENWISE_LOG` override the store path and
//! log level.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WellnessError;

pub const DATA_ENV: &str = "SCREENWISE_DATA";
pub const LOG_ENV: &str = "SCREENWISE_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
    pub music: MusicConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("screenwise.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `screenwise=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicProvider {
    /// Playlists from a local JSON catalog
    Static,
    /// Spotify Web API (requires the `spotify` feature)
    Spotify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub provider: MusicProvider,
    pub catalog_path: Option<PathBuf>,
    pub api_base: String,
    pub search_limit: usize,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            provider: MusicProvider::Static,
            catalog_path: None,
            api_base: "https://api.spotify.com/v1".to_string(),
            search_limit: 10,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, WellnessError> {
        toml::from_str(text).map_err(|e| WellnessError::Config(e.to_string()))
    }

    /// Load `path` if it exists, otherwise defaults; then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, WellnessError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_toml(&fs::read_to_string(p)?)?,
            Some(p) => {
                return Err(WellnessError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATA_ENV).filter(|v| !v.is_empty()) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.is_empty()) {
            self.log.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), WellnessError> {
        if self.music.search_limit == 0 || self.music.search_limit > 50 {
            return Err(WellnessError::Config(
                "music.search_limit must be between 1 and 50".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.music.provider, MusicProvider::Static);
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [store]
            path = "/var/lib/screenwise/db.json"

            [music]
            provider = "spotify"
            search_limit = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, PathBuf::from("/var/lib/screenwise/db.json"));
        assert_eq!(config.music.provider, MusicProvider::Spotify);
        assert_eq!(config.music.search_limit, 20);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("[music]\nprovider = \"vinyl\""),
            Err(WellnessError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            DATA_ENV => Some("/tmp/db.json".to_string()),
            LOG_ENV => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.store.path, PathBuf::from("/tmp/db.json"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_validate_search_limit() {
        let mut config = Config::default();
        config.music.search_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
