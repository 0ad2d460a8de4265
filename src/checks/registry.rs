//! Run-scoped check registry
//!
//! Check implementations are looked up by name in a factory map built at
//! startup. Each `Lint` run owns its own registry, so nothing leaks between
//! runs in the same process.

use super::{builtin_factories, Check, CheckFactory};
use crate::artifact::ArtifactKind;
use crate::config::Configuration;
use crate::models::{Message, Severity};
use crate::sink::MessageSink;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Explanations for ids emitted by the core and the network probe
pub const CORE_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "invalid-url",
        "The value should be a valid, public HTTP, HTTPS, or FTP URL.",
    ),
    (
        "network-checks-disabled",
        "Checks requiring network access have not been enabled in configuration,
        see the network_enabled option.",
    ),
    (
        "unknown-check",
        "A check listed in the configuration does not exist. The run continues
        without it.",
    ),
    (
        "read-error",
        "The artifact could not be opened or read. Its checks were skipped; the
        rest of the run is unaffected.",
    ),
    (
        "no-installed-packages",
        "The argument is neither a file nor the name of an installed package.",
    ),
    (
        "check-failed",
        "A check failed unexpectedly while inspecting this artifact. Its findings
        for the artifact may be incomplete.",
    ),
    (
        "badness-exceeded",
        "The accumulated badness score of the run is above the configured
        badness_threshold.",
    ),
];

/// A configured check name with no implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown check {0}")]
pub struct UnknownCheckError(pub String);

pub struct CheckRegistry {
    factories: BTreeMap<String, CheckFactory>,
    checks: Vec<Arc<dyn Check>>,
    index: HashMap<String, usize>,
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("available", &self.factories.keys().collect::<Vec<_>>())
            .field("loaded", &self.names())
            .finish()
    }
}

impl CheckRegistry {
    /// Registry that knows the built-in checks
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, factory) in builtin_factories() {
            registry.register_factory(name, factory);
        }
        registry
    }

    /// Registry with no known checks
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
            checks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Make a check implementation available under `name`
    pub fn register_factory(&mut self, name: &str, factory: CheckFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Load checks in order. Unknown names become `unknown-check` warnings.
    ///
    /// Returns the number of checks newly instantiated.
    pub fn load(
        &mut self,
        names: &[String],
        config: &Configuration,
        sink: &mut MessageSink,
    ) -> usize {
        sink.catalog_mut().register_all(CORE_EXPLANATIONS.iter().copied());

        let mut loaded = 0;
        for name in names {
            match self.load_one(name, config, sink) {
                Ok(true) => loaded += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("{}, skipping", e);
                    sink.emit(Message::run_level(
                        Severity::Warning,
                        "unknown-check",
                        vec![e.0],
                    ));
                }
            }
        }
        loaded
    }

    /// Load a single check; `Ok(false)` when it was already loaded
    pub fn load_one(
        &mut self,
        name: &str,
        config: &Configuration,
        sink: &mut MessageSink,
    ) -> Result<bool, UnknownCheckError> {
        if self.index.contains_key(name) {
            return Ok(false);
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| UnknownCheckError(name.to_string()))?;

        let check = factory(config);
        sink.catalog_mut().register_all(check.explanations());
        debug!("Loaded check {}", name);

        self.index.insert(name.to_string(), self.checks.len());
        self.checks.push(check);
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Check>> {
        self.index.get(name).map(|&i| &self.checks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Loaded check names in load order
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Loaded checks from `enabled` that can inspect `kind`, in `enabled` order
    pub fn applicable(&self, enabled: &[String], kind: ArtifactKind) -> Vec<Arc<dyn Check>> {
        enabled
            .iter()
            .filter_map(|name| self.get(name))
            .filter(|check| check.handles(kind))
            .cloned()
            .collect()
    }
}
