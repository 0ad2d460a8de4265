//! Core data models for rpmlint
//!
//! These models are shared by the checks, the message sink and the
//! reporters: severities, emitted messages and the final run result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Artifact name used for run-global messages
pub const RUN_SCOPE: &str = "(none)";

/// Severity levels for messages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Single-letter tag used in report lines
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "I",
            Severity::Warning => "W",
            Severity::Error => "E",
        }
    }

    /// Whether messages of this severity contribute to the badness score
    pub fn is_scored(&self) -> bool {
        !matches!(self, Severity::Info)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single finding emitted by a check or by the run itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    /// Artifact identity, `None` for run-global messages
    #[serde(default)]
    pub artifact: Option<String>,
    /// Message identifier (e.g. `no-url-tag`)
    pub id: String,
    /// Positional detail arguments
    #[serde(default)]
    pub details: Vec<String>,
    /// Rendered report line
    pub text: String,
}

impl Message {
    pub fn new(
        severity: Severity,
        artifact: Option<&str>,
        id: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        let id = id.into();
        let text = format_line(severity, artifact, &id, &details);
        Self {
            severity,
            artifact: artifact.map(str::to_string),
            id,
            details,
            text,
        }
    }

    /// Run-global message (reported against `(none)`)
    pub fn run_level(severity: Severity, id: impl Into<String>, details: Vec<String>) -> Self {
        Self::new(severity, None, id, details)
    }

    /// Artifact name as printed in the report
    pub fn artifact_label(&self) -> &str {
        self.artifact.as_deref().unwrap_or(RUN_SCOPE)
    }

    /// Deterministic ordering: artifact identity, then id, then details
    pub fn sort_key(&self) -> (&str, &str, &[String]) {
        (self.artifact_label(), self.id.as_str(), self.details.as_slice())
    }
}

fn format_line(severity: Severity, artifact: Option<&str>, id: &str, details: &[String]) -> String {
    let mut line = format!("{}: {}: {}", artifact.unwrap_or(RUN_SCOPE), severity.tag(), id);
    for detail in details {
        line.push(' ');
        line.push_str(detail);
    }
    line
}

/// Raw per-severity tallies (suppressed messages included)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
    }
}

/// Process exit statuses
pub mod exit_code {
    /// Clean run
    pub const OK: i32 = 0;
    /// Usage or input error (missing targets, unreadable config)
    pub const USAGE: i32 = 2;
    /// One or more Error-severity messages
    pub const ERRORS: i32 = 64;
    /// Badness score above the configured threshold
    pub const BADNESS: i32 = 66;
    /// Run cancelled by an interrupt signal
    pub const INTERRUPTED: i32 = 130;
}

/// Terminal output of a lint run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    /// All messages, sorted for reproducibility
    pub messages: Vec<Message>,
    /// Messages that survive display suppression, in report order
    #[serde(skip)]
    pub displayed: Vec<Message>,
    pub counts: SeverityCounts,
    pub packages_checked: usize,
    pub specfiles_checked: usize,
    pub score: u64,
    pub badness_threshold: u64,
    /// Catalog text for displayed ids, filled in verbose mode only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub explanations: BTreeMap<String, String>,
}

impl RunResult {
    /// The stable summary line printed at the end of every completed run
    pub fn summary_line(&self) -> String {
        format!(
            "{} packages and {} specfiles checked; {} errors, {} warnings.",
            self.packages_checked, self.specfiles_checked, self.counts.errors, self.counts.warnings
        )
    }

    /// Whether the aggregate score exceeds a non-zero threshold
    pub fn badness_exceeded(&self) -> bool {
        self.badness_threshold > 0 && self.score > self.badness_threshold
    }

    /// Exit status derived from the run; badness wins over errors
    pub fn exit_code(&self) -> i32 {
        if self.badness_exceeded() {
            exit_code::BADNESS
        } else if self.counts.errors > 0 {
            exit_code::ERRORS
        } else {
            exit_code::OK
        }
    }
}
