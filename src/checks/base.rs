//! Base check trait and types
//!
//! This module defines the core abstractions for package checks:
//! - `Check` trait that all checks must implement
//! - `Capability` describing which artifact kinds a check inspects
//! - `FileMatcher` helper for checks that look at packaged paths

use crate::artifact::{Artifact, ArtifactKind};
use crate::sink::Emitter;
use anyhow::Result;
use regex::Regex;

/// What a check is able to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    InspectsSource,
    InspectsBinary,
    InspectsRecipe,
}

impl Capability {
    /// The capability required to inspect an artifact kind
    pub fn for_kind(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Source => Capability::InspectsSource,
            ArtifactKind::Binary => Capability::InspectsBinary,
            ArtifactKind::Recipe => Capability::InspectsRecipe,
        }
    }
}

/// Capability sets shared by the built-in checks
pub const BINARY_ONLY: &[Capability] = &[Capability::InspectsBinary];
pub const SOURCE_ONLY: &[Capability] = &[Capability::InspectsSource];
pub const PACKAGES: &[Capability] = &[Capability::InspectsSource, Capability::InspectsBinary];

/// Trait for all package checks
///
/// A check is constructed once per run from the resolved configuration and
/// then invoked for every artifact whose kind it has a capability for. Checks
/// hold no per-artifact state, so the same instance is shared by all workers.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyCheck;
///
/// impl Check for MyCheck {
///     fn name(&self) -> &'static str {
///         "MyCheck"
///     }
///
///     fn capabilities(&self) -> &'static [Capability] {
///         BINARY_ONLY
///     }
///
///     fn explanations(&self) -> Vec<(&'static str, String)> {
///         vec![("my-message", "What went wrong and how to fix it.".into())]
///     }
///
///     fn inspect_binary(&self, pkg: &dyn Artifact, out: &Emitter) -> Result<()> {
///         if pkg.files().is_empty() {
///             out.warning("my-message", vec![]);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// Unique name used in the `checks` configuration list
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> &'static [Capability];

    /// Message ids emitted by this check and their explanation text
    fn explanations(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn inspect_source(&self, _pkg: &dyn Artifact, _out: &Emitter) -> Result<()> {
        Ok(())
    }

    fn inspect_binary(&self, _pkg: &dyn Artifact, _out: &Emitter) -> Result<()> {
        Ok(())
    }

    /// Inspect a recipe. `lines` are the raw recipe lines when available.
    fn inspect_recipe(
        &self,
        _recipe: &dyn Artifact,
        _lines: Option<&[String]>,
        _out: &Emitter,
    ) -> Result<()> {
        Ok(())
    }

    fn handles(&self, kind: ArtifactKind) -> bool {
        self.capabilities().contains(&Capability::for_kind(kind))
    }

    /// Route an artifact to the matching inspection method
    fn inspect(&self, artifact: &dyn Artifact, out: &Emitter) -> Result<()> {
        match artifact.kind() {
            ArtifactKind::Source => self.inspect_source(artifact, out),
            ArtifactKind::Binary => self.inspect_binary(artifact, out),
            ArtifactKind::Recipe => self.inspect_recipe(artifact, artifact.recipe_lines(), out),
        }
    }
}

/// Non-ghost packaged paths matching a regex
#[derive(Debug, Clone)]
pub struct FileMatcher {
    regex: Regex,
}

impl FileMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matching<'a>(&'a self, pkg: &'a dyn Artifact) -> impl Iterator<Item = &'a String> + 'a {
        let ghosts = pkg.ghost_files();
        pkg.files()
            .iter()
            .filter(move |f| !ghosts.contains(f.as_str()))
            .filter(move |f| self.regex.is_match(f))
    }
}
