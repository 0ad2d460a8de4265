//! Turning command line targets into work items
//!
//! ```text
//! "-"                       -> recipe read from stdin
//! directory                 -> every .rpm/.spm/.spec below it, re-classified
//! *.spec                    -> recipe
//! *.rpm, *.spm, or a/path   -> package archive
//! anything else             -> installed package lookup
//! ```
//!
//! Each work item carries the configuration in force for it: the run
//! configuration plus the explicit override file plus an override file found
//! next to the artifact.
//!
//! Resolution stops at the next target or walked entry once the run is
//! cancelled.

use crate::artifact::{
    is_package_archive, is_recipe, ArtifactError, ArtifactSource, InstalledArtifact, RecipeFile,
    STDIN_NAME,
};
use super::LintError;
use crate::config::{discover_override, ArtifactOverrides, ConfigError, Configuration};
use crate::sink::Emitter;
use ignore::WalkBuilder;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Target naming standard input
pub const STDIN_TARGET: &str = "-";

/// What to open for one target
#[derive(Debug)]
pub enum WorkItem {
    Recipe(PathBuf),
    Stdin(RecipeFile),
    Archive(PathBuf),
    Installed(InstalledArtifact),
}

/// A resolved unit of work
#[derive(Debug)]
pub struct Target {
    /// Name used before the artifact is open (read errors, interrupts)
    pub label: String,
    pub item: WorkItem,
    pub config: Arc<Configuration>,
}

pub(crate) struct Resolver<'a> {
    source: &'a dyn ArtifactSource,
    out: &'a Emitter,
    overrides: &'a ArtifactOverrides,
    cancel: &'a CancellationToken,
    /// Run configuration with the explicit override applied
    config: Arc<Configuration>,
    stdin: Option<Box<dyn Read + Send>>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        source: &'a dyn ArtifactSource,
        out: &'a Emitter,
        base: &Arc<Configuration>,
        overrides: &'a ArtifactOverrides,
        cancel: &'a CancellationToken,
        stdin: Option<Box<dyn Read + Send>>,
    ) -> Result<Self, ConfigError> {
        let config = if overrides.is_empty() {
            Arc::clone(base)
        } else {
            Arc::new(overrides.apply(base)?)
        };
        Ok(Self {
            source,
            out,
            overrides,
            cancel,
            config,
            stdin,
        })
    }

    /// Resolve every target in order. Configuration errors and cancellation
    /// are fatal; unreadable targets are reported and skipped.
    pub fn resolve(&mut self, targets: &[String]) -> Result<Vec<Target>, LintError> {
        let mut resolved = Vec::new();
        let mut current: Option<&str> = None;
        for target in targets {
            self.stop_if_cancelled(current.unwrap_or(target.as_str()))?;
            self.resolve_one(target, &mut resolved)?;
            current = Some(target.as_str());
        }
        if let Some(last) = current {
            self.stop_if_cancelled(last)?;
        }
        debug!("Resolved {} targets into {} work items", targets.len(), resolved.len());
        Ok(resolved)
    }

    /// `target` is the one being read when the cancellation was noticed
    fn stop_if_cancelled(&self, target: &str) -> Result<(), LintError> {
        if self.cancel.is_cancelled() {
            debug!("Resolution cancelled at {}", target);
            return Err(LintError::Interrupted {
                target: target.to_string(),
            });
        }
        Ok(())
    }

    fn resolve_one(&mut self, target: &str, resolved: &mut Vec<Target>) -> Result<(), LintError> {
        if target == STDIN_TARGET {
            self.resolve_stdin(resolved);
            return Ok(());
        }

        let path = Path::new(target);
        if path.is_dir() {
            for file in walk(path, self.cancel) {
                self.stop_if_cancelled(target)?;
                resolved.push(self.file_target(file)?);
            }
            self.stop_if_cancelled(target)?;
        } else if path.is_file() {
            if is_recipe(path) || is_package_archive(path) || target.contains('/') {
                resolved.push(self.file_target(path.to_path_buf())?);
            } else {
                self.resolve_installed(target, resolved);
            }
        } else if looks_like_path(path, target) {
            let error = ArtifactError::Io {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            };
            self.read_error(target, &error);
        } else {
            self.resolve_installed(target, resolved);
        }
        Ok(())
    }

    fn resolve_stdin(&mut self, resolved: &mut Vec<Target>) {
        let Some(mut reader) = self.stdin.take() else {
            debug!("Standard input already consumed");
            return;
        };
        match RecipeFile::from_reader(STDIN_NAME, &mut reader) {
            Ok(recipe) if recipe.is_empty() => debug!("Empty standard input, skipping"),
            Ok(recipe) => resolved.push(Target {
                label: STDIN_NAME.to_string(),
                item: WorkItem::Stdin(recipe),
                config: Arc::clone(&self.config),
            }),
            Err(e) => self.read_error(STDIN_NAME, &e),
        }
    }

    fn resolve_installed(&self, name: &str, resolved: &mut Vec<Target>) {
        match self.source.installed(name) {
            Ok(matches) if matches.is_empty() => {
                self.out.error("no-installed-packages", vec![name.to_string()]);
            }
            Ok(mut matches) => {
                matches.sort_by_cached_key(|m| collation_key(&m.label()));
                for installed in matches {
                    resolved.push(Target {
                        label: installed.label(),
                        item: WorkItem::Installed(installed),
                        config: Arc::clone(&self.config),
                    });
                }
            }
            Err(e) => self.read_error(name, &e),
        }
    }

    fn file_target(&self, path: PathBuf) -> Result<Target, ConfigError> {
        let config = self.config_for(&path)?;
        let label = path.display().to_string();
        let item = if is_recipe(&path) {
            WorkItem::Recipe(path)
        } else {
            WorkItem::Archive(path)
        };
        Ok(Target {
            label,
            item,
            config,
        })
    }

    /// Explicit override first, then the one sitting next to the artifact
    fn config_for(&self, path: &Path) -> Result<Arc<Configuration>, ConfigError> {
        let Some(found) = discover_override(path) else {
            return Ok(Arc::clone(&self.config));
        };
        debug!("Using override {} for {}", found.display(), path.display());
        let local = ArtifactOverrides::load(&found)?;
        let merged = self.overrides.merged_with(&local);
        let base = self.out.config();
        Ok(Arc::new(merged.apply(base)?))
    }

    fn read_error(&self, label: &str, error: &ArtifactError) {
        warn!("Cannot read {}: {}", label, error);
        self.out
            .for_artifact(label, Arc::clone(&self.config))
            .warning("read-error", vec![error.to_string()]);
    }
}

/// Arguments that can only mean a file: a separator or a package extension
fn looks_like_path(path: &Path, target: &str) -> bool {
    target.contains('/') || is_package_archive(path) || is_recipe(path)
}

/// Case-insensitive ordering of installed matches, ties broken bytewise
fn collation_key(label: &str) -> (String, String) {
    (label.to_lowercase(), label.to_string())
}

/// Package archives and recipes below `dir`, in path order. A cancelled
/// walk returns what it found so far.
fn walk(dir: &Path, cancel: &CancellationToken) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        if cancel.is_cancelled() {
            break;
        }
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && (is_package_archive(path) || is_recipe(path)) {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => warn!("Skipping unreadable entry under {}: {}", dir.display(), e),
        }
    }
    files
}
