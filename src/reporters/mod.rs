//! Output reporters for lint results
//!
//! Supports two output formats:
//! - `text` - One line per message, optional explanations, summary line
//! - `json` - Machine-readable JSON of the whole run

mod json;
mod text;

use crate::models::RunResult;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a run result; `color` only affects text output
pub fn report_with_format(result: &RunResult, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(result, color)),
        OutputFormat::Json => json::render(result),
    }
}

/// Notice printed to stderr when the badness gate fails
pub fn badness_notice(result: &RunResult) -> Option<String> {
    result.badness_exceeded().then(|| {
        format!(
            "{}: E: badness {} exceeds threshold {}, aborting.",
            crate::models::RUN_SCOPE,
            result.score,
            result.badness_threshold
        )
    })
}
