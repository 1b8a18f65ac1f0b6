// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::analytics::DEFAULT_TOP_N;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "processed_flights.csv";

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset used when neither `--data` nor `FLIGHTQ_DATA` is set.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Ranking size for "top flights" when the query names no count.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("config.json")
    }

    /// Loads the user config; a missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let path = Self::default_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[Config] {:#}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("[Config] No config at {:?}", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        if config.top_n == 0 {
            config.top_n = DEFAULT_TOP_N;
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config {:?}", path))?;
        Ok(())
    }

    /// `--data` / env value first, then the config file, then the default name.
    pub fn resolve_data_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.data_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"data_path":"/data/flights.csv"}"#)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.data_path, Some(PathBuf::from("/data/flights.csv")));
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        Ok(())
    }

    #[test]
    fn test_roundtrip_and_bad_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sub").join("config.json");
        let config = AppConfig {
            data_path: None,
            top_n: 10,
        };
        config.save_to(&path)?;
        assert_eq!(AppConfig::load_from(&path)?, config);

        fs::write(&path, "{oops")?;
        assert!(AppConfig::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_data_path_precedence() {
        let config = AppConfig {
            data_path: Some(PathBuf::from("from_config.csv")),
            top_n: 5,
        };
        assert_eq!(
            config.resolve_data_path(Some(PathBuf::from("cli.csv"))),
            PathBuf::from("cli.csv")
        );
        assert_eq!(config.resolve_data_path(None), PathBuf::from("from_config.csv"));
        assert_eq!(
            AppConfig::default().resolve_data_path(None),
            PathBuf::from(DEFAULT_DATA_PATH)
        );
    }
}
