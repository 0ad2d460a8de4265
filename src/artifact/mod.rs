//! Artifact collaborator interface
//!
//! The lint core never parses package formats. It sees an artifact only
//! through the [`Artifact`] trait and obtains artifacts from an
//! [`ArtifactSource`]. The default source shells out to `rpm`; tests and
//! embedders can use [`MemorySource`].

mod memory;
mod recipe;
mod rpm_query;
mod tool;

pub use memory::{MemoryArtifact, MemorySource};
pub use recipe::{RecipeFile, STDIN_NAME};
pub use rpm_query::RpmQuerySource;
pub use tool::{run_tool, ToolOutput};

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// What kind of thing is being inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Source package (`.src.rpm`)
    Source,
    /// Binary package
    Binary,
    /// Build recipe (`.spec`)
    Recipe,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Source => write!(f, "source package"),
            ArtifactKind::Binary => write!(f, "binary package"),
            ArtifactKind::Recipe => write!(f, "spec file"),
        }
    }
}

/// Failures while opening or reading one artifact. Never fatal for a run.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("{tool} not found, install it first")]
    ToolMissing { tool: String },

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },
}

/// Read-only view of an opened artifact
pub trait Artifact: Send {
    /// Identity used in report lines (e.g. `foo.x86_64`)
    fn name(&self) -> &str;

    fn kind(&self) -> ArtifactKind;

    fn is_source(&self) -> bool {
        self.kind() == ArtifactKind::Source
    }

    /// On-disk file name of the artifact
    fn filename(&self) -> &str;

    /// Packaged paths in header order
    fn files(&self) -> &[String] {
        &[]
    }

    /// Paths that are listed but have no content on disk
    fn ghost_files(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Paths flagged as documentation
    fn doc_files(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Permission bits of a packaged path
    fn file_mode(&self, _path: &str) -> Option<u32> {
        None
    }

    /// Header tag value (`URL`, `VENDOR`, ...); `None` when unset
    fn header(&self, _tag: &str) -> Option<String> {
        None
    }

    /// Raw recipe lines, when the artifact is or carries a recipe
    fn recipe_lines(&self) -> Option<&[String]> {
        None
    }

    /// Release extracted payloads and other resources
    fn close(&mut self) -> Result<(), ArtifactError> {
        Ok(())
    }
}

/// An installed package as reported by the package database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub name: String,
    pub arch: String,
}

impl InstalledArtifact {
    pub fn new(name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
        }
    }

    /// `name.arch`, the string installed matches are ordered by
    pub fn label(&self) -> String {
        format!("{}.{}", self.name, self.arch)
    }
}

/// Where artifacts come from
pub trait ArtifactSource: Send + Sync {
    /// Open a package archive
    fn open(&self, path: &Path, extract_dir: &Path) -> Result<Box<dyn Artifact>, ArtifactError>;

    /// Installed packages matching a name; empty when nothing matches
    fn installed(&self, name: &str) -> Result<Vec<InstalledArtifact>, ArtifactError>;

    fn open_installed(
        &self,
        installed: &InstalledArtifact,
        extract_dir: &Path,
    ) -> Result<Box<dyn Artifact>, ArtifactError>;
}

/// Owns an opened artifact and closes it when dropped
pub struct ArtifactGuard {
    inner: Box<dyn Artifact>,
}

impl ArtifactGuard {
    pub fn new(inner: Box<dyn Artifact>) -> Self {
        Self { inner }
    }
}

impl Deref for ArtifactGuard {
    type Target = dyn Artifact;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ArtifactGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if let Err(e) = self.inner.close() {
            warn!("{}", e);
        }
    }
}

/// Whether a path names a package archive
pub fn is_package_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "rpm" || ext == "spm")
}

/// Whether a path names a build recipe
pub fn is_recipe(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "spec")
}
