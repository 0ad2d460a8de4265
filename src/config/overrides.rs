//! Per-artifact override files (`rpmlintrc`)
//!
//! An override file is the last configuration layer and applies to one
//! artifact only. Unlike regular layers it can also remove entries:
//!
//! ```toml
//! # foo.rpmlintrc
//! checks = ["SpecCheck"]
//! disable_checks = ["FHSCheck"]
//! filters = ["no-url-tag", "W: .*-not-compressed"]
//! remove_filters = ["strange-permission"]
//! # removes the entry from filters, score_filters and display_filters
//!
//! [scoring]
//! multiple-specfiles = 100
//! ```

use super::{merge_tables, ConfigError, Configuration};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ArtifactOverrides {
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub disable_checks: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub remove_filters: Vec<String>,
    #[serde(default)]
    pub score_filters: Vec<String>,
    #[serde(default)]
    pub display_filters: Vec<String>,
    #[serde(default)]
    pub scoring: BTreeMap<String, u64>,
}

impl ArtifactOverrides {
    /// Load an override file; a missing file is an error
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(origin: &str, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine two override sets; `other` is applied after `self`
    pub fn merged_with(&self, other: &ArtifactOverrides) -> ArtifactOverrides {
        fn union(a: &[String], b: &[String]) -> Vec<String> {
            let mut out = a.to_vec();
            for item in b {
                if !out.contains(item) {
                    out.push(item.clone());
                }
            }
            out
        }

        let mut scoring = self.scoring.clone();
        scoring.extend(other.scoring.clone());

        ArtifactOverrides {
            checks: union(&self.checks, &other.checks),
            disable_checks: union(&self.disable_checks, &other.disable_checks),
            filters: union(&self.filters, &other.filters),
            remove_filters: union(&self.remove_filters, &other.remove_filters),
            score_filters: union(&self.score_filters, &other.score_filters),
            display_filters: union(&self.display_filters, &other.display_filters),
            scoring,
        }
    }

    /// Produce the artifact-local configuration
    pub fn apply(&self, base: &Configuration) -> Result<Configuration, ConfigError> {
        if self.is_empty() {
            return Ok(base.clone());
        }

        let mut tree = base.tree().clone();
        merge_tables(&mut tree, self.as_layer()?);

        remove_from_list(&mut tree, "checks", &self.disable_checks);
        for key in ["filters", "score_filters", "display_filters"] {
            remove_from_list(&mut tree, key, &self.remove_filters);
        }

        Configuration::from_table(tree)
    }

    fn as_layer(&self) -> Result<Table, ConfigError> {
        let strings = |items: &[String]| {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        };

        let mut layer = Table::new();
        layer.insert("checks".into(), strings(&self.checks));
        layer.insert("filters".into(), strings(&self.filters));
        layer.insert("score_filters".into(), strings(&self.score_filters));
        layer.insert("display_filters".into(), strings(&self.display_filters));

        let mut scoring = Table::new();
        for (id, weight) in &self.scoring {
            let weight = i64::try_from(*weight).map_err(|_| {
                ConfigError::Invalid(format!("score for {} is out of range: {}", id, weight))
            })?;
            scoring.insert(id.clone(), Value::Integer(weight));
        }
        layer.insert("scoring".into(), Value::Table(scoring));
        Ok(layer)
    }
}

fn remove_from_list(tree: &mut Table, key: &str, removed: &[String]) {
    if removed.is_empty() {
        return;
    }
    if let Some(Value::Array(items)) = tree.get_mut(key) {
        items.retain(|v| !v.as_str().is_some_and(|s| removed.iter().any(|r| r == s)));
    }
}

/// Find the override file that sits next to an artifact.
///
/// For `/srv/foo.spec` this looks for `/srv/foo.rpmlintrc`, then
/// `/srv/foo-rpmlintrc`.
pub fn discover_override(artifact_path: &Path) -> Option<PathBuf> {
    let dir = artifact_path.parent()?;
    let mut stem = artifact_path.file_stem()?.to_str()?;
    if is_archive(artifact_path) {
        // foo-1.0-1.x86_64.rpm -> foo-1.0-1
        stem = stem.rsplit_once('.').map_or(stem, |(head, _)| head);
    }

    [format!("{}.rpmlintrc", stem), format!("{}-rpmlintrc", stem)]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "rpm" || ext == "spm")
}
