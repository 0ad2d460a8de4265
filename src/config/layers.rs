//! Configuration layers and the merge that folds them into one tree
//!
//! Layers are applied strictly in order:
//!
//! ```text
//! built-in defaults
//!   -> site files (/usr/share/rpmlint, /etc/xdg/rpmlint, user config dir)
//!   -> explicit --config file
//!   -> per-artifact override (applied later, see `ArtifactOverrides`)
//! ```
//!
//! Merge rules: arrays are unioned (order of first appearance kept), tables
//! are merged key by key, anything else is replaced by the later layer.

use super::{ConfigError, Configuration};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

const DEFAULTS: &str = include_str!("defaults.toml");

/// A single configuration source
#[derive(Debug, Clone)]
pub enum ConfigLayer {
    /// The embedded `defaults.toml`
    Defaults,
    /// Every `*.toml` in these directories, in name order; missing dirs are skipped
    SiteDirs(Vec<PathBuf>),
    /// An explicitly named file, which must exist
    File(PathBuf),
    /// In-memory TOML text
    Inline { origin: String, content: String },
}

impl ConfigLayer {
    pub fn inline(origin: impl Into<String>, content: impl Into<String>) -> Self {
        ConfigLayer::Inline {
            origin: origin.into(),
            content: content.into(),
        }
    }

    /// Load the tables contributed by this layer
    fn load(&self) -> Result<Vec<Table>, ConfigError> {
        match self {
            ConfigLayer::Defaults => Ok(vec![parse_table("<defaults>", DEFAULTS)?]),
            ConfigLayer::SiteDirs(dirs) => {
                let mut tables = Vec::new();
                for dir in dirs {
                    for path in toml_files_in(dir)? {
                        tables.push(load_file(&path)?);
                    }
                }
                Ok(tables)
            }
            ConfigLayer::File(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path: path.clone() });
                }
                Ok(vec![load_file(path)?])
            }
            ConfigLayer::Inline { origin, content } => Ok(vec![parse_table(origin, content)?]),
        }
    }
}

/// Ordered list of layers that resolves into a `Configuration`
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    layers: Vec<ConfigLayer>,
}

impl ConfigStore {
    /// Create an empty store (no defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, site directories and an optional user-supplied file
    pub fn standard(user_config: Option<&Path>) -> Self {
        let mut store = Self::new()
            .layer(ConfigLayer::Defaults)
            .layer(ConfigLayer::SiteDirs(site_config_dirs()));
        if let Some(path) = user_config {
            store = store.layer(ConfigLayer::File(path.to_path_buf()));
        }
        store
    }

    /// Append a layer on top of the existing ones
    pub fn layer(mut self, layer: ConfigLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn resolve(&self) -> Result<Configuration, ConfigError> {
        resolve(&self.layers)
    }
}

/// Fold the layers left to right into a resolved configuration
pub fn resolve(layers: &[ConfigLayer]) -> Result<Configuration, ConfigError> {
    let mut tree = Table::new();
    for layer in layers {
        for table in layer.load()? {
            merge_tables(&mut tree, table);
        }
    }
    Configuration::from_table(tree)
}

/// Merge `overlay` on top of `base` in place
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Fixed site-wide locations, lowest priority first
pub fn site_config_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/rpmlint"),
        PathBuf::from("/etc/xdg/rpmlint"),
    ];
    if let Some(user_dir) = dirs::config_dir() {
        dirs.push(user_dir.join("rpmlint"));
    }
    dirs
}

fn toml_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded configuration layer {}", path.display());
    parse_table(&path.display().to_string(), &content)
}

fn parse_table(origin: &str, content: &str) -> Result<Table, ConfigError> {
    toml::from_str::<Table>(content).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}
