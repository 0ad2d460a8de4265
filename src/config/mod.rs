//! Configuration module for rpmlint
//!
//! This module handles:
//! - Layered configuration (built-in defaults, site files, user file)
//! - Union/override merge of the layer tables
//! - The typed view of the resolved tree
//! - Per-artifact override files (`rpmlintrc`)

mod layers;
mod overrides;
mod settings;

pub use layers::{merge_tables, resolve, site_config_dirs, ConfigLayer, ConfigStore};
pub use overrides::{discover_override, ArtifactOverrides};
pub use settings::{Configuration, LintSettings};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving configuration. Always fatal for a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
