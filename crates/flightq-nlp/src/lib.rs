// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod entities;
pub mod intent;

pub use entities::{ExtractedEntities, Route, Weekday};
pub use intent::{EntityKind, EntitySignals, Intent, IntentRule};

/// Bump when the shipped rule table changes in a way that should replace
/// rules saved by older versions.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IntentRulesConfig {
    pub rules: Vec<IntentRule>,
    #[serde(default)]
    pub schema_version: u32,
}

impl Default for IntentRulesConfig {
    fn default() -> Self {
        Self {
            rules: intent::default_rules(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }
}

/// Query text after entity extraction and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub text: String,
    pub entities: ExtractedEntities,
    pub intent: Intent,
}

#[derive(Clone)]
pub struct IntentClassifier {
    pub config: Arc<IntentRulesConfig>,
    config_path: PathBuf,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        let config_path = Self::get_config_path();
        let config = Self::load_config(&config_path).unwrap_or_default();
        Self {
            config: Arc::new(config),
            config_path,
        }
    }
}

impl IntentClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self::default())
    }

    /// Shipped rules only; never touches the user's rule file.
    pub fn builtin() -> Self {
        Self {
            config: Arc::new(IntentRulesConfig::default()),
            config_path: Self::get_config_path(),
        }
    }

    pub fn at_path(path: PathBuf) -> Self {
        let config = Self::load_config(&path).unwrap_or_default();
        Self {
            config: Arc::new(config),
            config_path: path,
        }
    }

    pub fn update_config(&mut self, config: IntentRulesConfig) {
        self.config = Arc::new(config);
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.config.rules
    }

    pub fn classify(&self, text: &str, hour_present: bool, route_present: bool) -> Intent {
        intent::classify_with(
            &self.config.rules,
            text,
            EntitySignals {
                hour: hour_present,
                route: route_present,
            },
        )
    }

    /// Extracts entities and classifies in one pass. Ranking phrases such as
    /// "top 5 delayed flights" are normalized first so they hit their
    /// keywords.
    pub fn interpret(&self, text: &str) -> ParsedQuery {
        let entities = ExtractedEntities::extract(text);
        let normalized = entities::normalize_ranking(text);
        let intent = self.classify(
            &normalized,
            entities.hour.is_some(),
            entities.route.is_some(),
        );
        log::debug!(
            "[Rules] '{}' -> {} (day={:?} hour={:?} route={:?})",
            text,
            intent,
            entities.weekday,
            entities.hour,
            entities.route
        );
        ParsedQuery {
            text: text.to_string(),
            entities,
            intent,
        }
    }

    fn get_config_path() -> PathBuf {
        ProjectDirs::from("org", "flightq", "flightq")
            .map(|dirs| dirs.config_dir().join("intent_rules.json"))
            .unwrap_or_else(|| PathBuf::from("intent_rules.json"))
    }

    fn load_config(path: &Path) -> Result<IntentRulesConfig> {
        if !path.exists() {
            log::debug!("[Rules] No rule file at {:?}, using built-in rules", path);
            return Ok(IntentRulesConfig::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: IntentRulesConfig = serde_json::from_str(&content).map_err(|e| {
            log::error!("[Rules] JSON parse error for {:?}: {}", path, e);
            e
        })?;

        if config.schema_version < CURRENT_SCHEMA_VERSION {
            log::info!(
                "[Rules] Migrating intent_rules.json from schema v{} to v{}; rules reset to defaults",
                config.schema_version,
                CURRENT_SCHEMA_VERSION
            );
            config = IntentRulesConfig::default();
        } else if config.rules.is_empty() {
            log::warn!("[Rules] {:?} has no rules, using built-in rules", path);
            config.rules = intent::default_rules();
        }

        log::debug!("[Rules] Loaded {} rules from {:?}", config.rules.len(), path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self.config.as_ref())?;
        fs::write(&self.config_path, content)?;
        log::debug!("[Rules] Saved rules to {:?}", self.config_path);
        Ok(())
    }

    pub fn reset_defaults(&mut self) -> Result<()> {
        self.config = Arc::new(IntentRulesConfig::default());
        self.save()
    }
}
