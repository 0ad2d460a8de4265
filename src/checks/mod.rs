//! Package checks
//!
//! This module contains the check contract, the run-scoped registry, the
//! explanation catalog and the built-in checks:
//!
//! - `DistributionCheck` - vendor, distribution and page compression
//! - `RpmFileCheck` - package file name length
//! - `SourceCheck` - spec count, source compression, permissions
//! - `DocFilesCheck` - installation notes shipped as documentation
//! - `FHSCheck` - /usr and /var layout
//! - `TagsCheck` - URL tags, optionally probed over the network
//! - `SpecCheck` - obsolete and hardcoded recipe tags, indentation

mod base;
mod catalog;
mod distribution;
mod doc_files;
mod fhs;
pub mod network;
mod registry;
mod rpm_file;
mod source;
mod spec;
mod tags;

pub use base::{Capability, Check, FileMatcher, BINARY_ONLY, PACKAGES, SOURCE_ONLY};
pub use catalog::{ExplanationCatalog, UNKNOWN_MESSAGE};
pub use distribution::DistributionCheck;
pub use doc_files::DocFilesCheck;
pub use fhs::FhsCheck;
pub use network::{NetworkProbe, NetworkProbeError, ProbeResponse};
pub use registry::{CheckRegistry, UnknownCheckError, CORE_EXPLANATIONS};
pub use rpm_file::RpmFileCheck;
pub use source::SourceCheck;
pub use spec::SpecCheck;
pub use tags::TagsCheck;

use crate::config::Configuration;
use std::sync::Arc;

/// Constructor for a named check
pub type CheckFactory = fn(&Configuration) -> Arc<dyn Check>;

/// Built-in checks by configuration name
pub fn builtin_factories() -> Vec<(&'static str, CheckFactory)> {
    vec![
        ("DistributionCheck", |c| Arc::new(DistributionCheck::new(c))),
        ("RpmFileCheck", |c| Arc::new(RpmFileCheck::new(c))),
        ("SourceCheck", |c| Arc::new(SourceCheck::new(c))),
        ("DocFilesCheck", |c| Arc::new(DocFilesCheck::new(c))),
        ("FHSCheck", |c| Arc::new(FhsCheck::new(c))),
        ("TagsCheck", |c| Arc::new(TagsCheck::new(c))),
        ("SpecCheck", |c| Arc::new(SpecCheck::new(c))),
    ]
}
