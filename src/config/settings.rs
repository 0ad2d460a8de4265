//! Typed view over the resolved configuration tree

use super::{ConfigError, ConfigLayer};
use crate::sink::{FilterSet, ScoreTable};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use toml::Table;

/// Settings the orchestration core reads directly.
///
/// Check-specific options (`vendor`, `compress_extension`, ...) stay in the
/// tree and are read by each check through [`Configuration::option`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LintSettings {
    /// Enabled check names, in load order
    #[serde(default)]
    pub checks: Vec<String>,

    #[serde(default)]
    pub network_enabled: bool,

    /// Network probe timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub network_timeout: u64,

    /// Message id -> badness weight
    #[serde(default)]
    pub scoring: BTreeMap<String, u64>,

    /// Weight used for ids missing from `scoring`
    #[serde(default)]
    pub default_score: u64,

    /// 0 disables the badness gate
    #[serde(default)]
    pub badness_threshold: u64,

    /// Working directory for payload extraction (empty = system temp dir)
    #[serde(default)]
    pub extract_dir: String,

    /// Suppressed from both scoring and the printed report
    #[serde(default)]
    pub filters: Vec<String>,

    /// Suppressed from scoring only
    #[serde(default)]
    pub score_filters: Vec<String>,

    /// Suppressed from the printed report only
    #[serde(default)]
    pub display_filters: Vec<String>,

    /// Worker threads (0 = auto)
    #[serde(default)]
    pub workers: usize,

    /// Print explanations after each new message id
    #[serde(default)]
    pub verbose: bool,
}

fn default_network_timeout() -> u64 {
    10
}

/// Fully resolved configuration. Read-only once built.
#[derive(Debug, Clone)]
pub struct Configuration {
    tree: Table,
    settings: LintSettings,
    filters: FilterSet,
    scores: ScoreTable,
}

impl Configuration {
    /// Validate a merged tree and build the typed view
    pub fn from_table(tree: Table) -> Result<Self, ConfigError> {
        let settings: LintSettings = toml::Value::Table(tree.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;

        let filters = FilterSet::from_lists(
            &settings.filters,
            &settings.score_filters,
            &settings.display_filters,
        )
        .map_err(|e| ConfigError::Invalid(format!("bad filter pattern: {}", e)))?;

        let scores = ScoreTable::new(settings.scoring.clone(), settings.default_score);

        Ok(Self {
            tree,
            settings,
            filters,
            scores,
        })
    }

    /// Configuration made of the embedded defaults only
    pub fn builtin() -> Result<Self, ConfigError> {
        super::resolve(&[ConfigLayer::Defaults])
    }

    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    pub fn tree(&self) -> &Table {
        &self.tree
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn score_table(&self) -> &ScoreTable {
        &self.scores
    }

    /// Enabled check names
    pub fn checks(&self) -> &[String] {
        &self.settings.checks
    }

    /// Get a typed option value from the tree
    pub fn option<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.tree.get(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Get an option with a default value
    pub fn option_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.option(key).unwrap_or(default)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.network_timeout)
    }

    pub fn extract_dir(&self) -> PathBuf {
        if self.settings.extract_dir.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.settings.extract_dir)
        }
    }

    /// Serialize the resolved tree for display. Depends on nothing but `self`.
    pub fn print_configuration(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.tree)
    }
}
