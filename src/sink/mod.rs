//! Message collection, suppression and scoring
//!
//! Workers never touch the [`MessageSink`] directly. Each dispatch gets an
//! [`Emitter`] that pushes [`SinkEvent`]s into a crossbeam channel; a single
//! consumer thread owns the sink and drains the channel until every worker
//! has finished. Ordering of the final report is fixed afterwards by sorting,
//! so the result does not depend on how the pool interleaved its work.

mod filter;
mod scoring;

pub use filter::{FilterSet, Pattern};
pub use scoring::ScoreTable;

use crate::checks::ExplanationCatalog;
use crate::config::Configuration;
use crate::models::{Message, RunResult, Severity, SeverityCounts};
use crossbeam_channel::{Receiver, Sender};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// What a target contributed to the "checked" totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checked {
    Package,
    Specfile,
}

/// Events sent from workers to the sink owner
#[derive(Debug)]
pub enum SinkEvent {
    /// A message, with the configuration in force for its artifact
    Message {
        message: Message,
        config: Arc<Configuration>,
    },
    /// A target was fully dispatched
    Checked(Checked),
}

/// Unbounded channel carrying sink events
pub fn channel() -> (Sender<SinkEvent>, Receiver<SinkEvent>) {
    crossbeam_channel::unbounded()
}

/// Handle used by checks to report findings for one artifact
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: Sender<SinkEvent>,
    artifact: Option<String>,
    config: Arc<Configuration>,
}

impl Emitter {
    /// Emitter for run-level messages
    pub fn run_level(tx: Sender<SinkEvent>, config: Arc<Configuration>) -> Self {
        Self {
            tx,
            artifact: None,
            config,
        }
    }

    /// Emitter bound to an artifact and its effective configuration
    pub fn for_artifact(&self, artifact: &str, config: Arc<Configuration>) -> Self {
        Self {
            tx: self.tx.clone(),
            artifact: Some(artifact.to_string()),
            config,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn emit(&self, severity: Severity, id: &str, details: Vec<String>) {
        let message = Message::new(severity, self.artifact.as_deref(), id, details);
        self.send(SinkEvent::Message {
            message,
            config: Arc::clone(&self.config),
        });
    }

    pub fn error(&self, id: &str, details: Vec<String>) {
        self.emit(Severity::Error, id, details)
    }

    pub fn warning(&self, id: &str, details: Vec<String>) {
        self.emit(Severity::Warning, id, details)
    }

    pub fn info(&self, id: &str, details: Vec<String>) {
        self.emit(Severity::Info, id, details)
    }

    pub fn checked(&self, what: Checked) {
        self.send(SinkEvent::Checked(what));
    }

    fn send(&self, event: SinkEvent) {
        if self.tx.send(event).is_err() {
            // Receiver is gone only after the run was torn down
            debug!("Sink closed, dropping event");
        }
    }
}

#[derive(Debug)]
struct Entry {
    message: Message,
    config: Arc<Configuration>,
}

impl Entry {
    fn weight(&self) -> u64 {
        self.config
            .score_table()
            .message_weight(&self.message, self.config.filters())
    }

    fn displayed(&self) -> bool {
        !self.config.filters().suppresses_display(&self.message)
    }
}

/// Owner of the message log for one run
#[derive(Debug)]
pub struct MessageSink {
    base: Arc<Configuration>,
    catalog: ExplanationCatalog,
    entries: Vec<Entry>,
    counts: SeverityCounts,
    packages_checked: usize,
    specfiles_checked: usize,
}

impl MessageSink {
    pub fn new(base: Arc<Configuration>) -> Self {
        Self {
            base,
            catalog: ExplanationCatalog::new(),
            entries: Vec::new(),
            counts: SeverityCounts::default(),
            packages_checked: 0,
            specfiles_checked: 0,
        }
    }

    pub fn catalog(&self) -> &ExplanationCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ExplanationCatalog {
        &mut self.catalog
    }

    /// Record a message under the run-level configuration
    pub fn emit(&mut self, message: Message) {
        let config = Arc::clone(&self.base);
        self.record(message, config);
    }

    /// Record a message under an artifact-local configuration
    pub fn record(&mut self, message: Message, config: Arc<Configuration>) {
        trace!("{}", message.text);
        self.counts.add(message.severity);
        self.entries.push(Entry { message, config });
    }

    pub fn receive(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::Message { message, config } => self.record(message, config),
            SinkEvent::Checked(Checked::Package) => self.packages_checked += 1,
            SinkEvent::Checked(Checked::Specfile) => self.specfiles_checked += 1,
        }
    }

    /// Drain a channel until every sender has been dropped
    pub fn consume(&mut self, rx: &Receiver<SinkEvent>) {
        for event in rx.iter() {
            self.receive(event);
        }
    }

    /// Raw tallies, suppressed messages included
    pub fn counts(&self) -> SeverityCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Badness score of the current log
    pub fn score(&self) -> u64 {
        self.entries
            .iter()
            .map(Entry::weight)
            .fold(0u64, u64::saturating_add)
    }

    pub fn describe(&self, id: &str) -> &str {
        self.catalog.describe(id)
    }

    /// Non-suppressed messages in report order
    pub fn displayed(&self) -> Vec<&Message> {
        let mut shown: Vec<&Message> = self
            .entries
            .iter()
            .filter(|e| e.displayed())
            .map(|e| &e.message)
            .collect();
        shown.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        shown
    }

    /// Render the non-suppressed messages, one line each
    pub fn format_report(&self, verbose: bool) -> String {
        let shown: Vec<Message> = self.displayed().into_iter().cloned().collect();
        let explanations = if verbose {
            self.explanations_for(&shown)
        } else {
            BTreeMap::new()
        };
        render_lines(&shown, &explanations)
    }

    fn explanations_for(&self, messages: &[Message]) -> BTreeMap<String, String> {
        messages
            .iter()
            .filter_map(|m| {
                self.catalog
                    .get(&m.id)
                    .map(|text| (m.id.clone(), text.to_string()))
            })
            .collect()
    }

    /// Finish the run. Messages are sorted by artifact identity, then id.
    pub fn into_result(mut self, verbose: bool) -> RunResult {
        let score = self.score();
        self.entries
            .sort_by(|a, b| a.message.sort_key().cmp(&b.message.sort_key()));

        let displayed: Vec<Message> = self
            .entries
            .iter()
            .filter(|e| e.displayed())
            .map(|e| e.message.clone())
            .collect();
        let explanations = if verbose {
            self.explanations_for(&displayed)
        } else {
            BTreeMap::new()
        };

        RunResult {
            messages: self.entries.into_iter().map(|e| e.message).collect(),
            displayed,
            counts: self.counts,
            packages_checked: self.packages_checked,
            specfiles_checked: self.specfiles_checked,
            score,
            badness_threshold: self.base.settings().badness_threshold,
            explanations,
        }
    }
}

/// Render report lines; the first occurrence of each explained id is
/// followed by its indented explanation.
pub fn render_lines(messages: &[Message], explanations: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    let mut explained = HashSet::new();
    for message in messages {
        out.push_str(&message.text);
        out.push('\n');
        if let Some(text) = explanations.get(&message.id) {
            if explained.insert(message.id.as_str()) {
                out.push_str(&indent(text, "    "));
                out.push_str("\n\n");
            }
        }
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    let mut lines = Vec::new();
    let mut current = String::from(prefix);
    for word in text.split_whitespace() {
        if current.len() > prefix.len() && current.len() + word.len() + 1 > 79 {
            lines.push(std::mem::replace(&mut current, String::from(prefix)));
        }
        if current.len() > prefix.len() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if current.len() > prefix.len() {
        lines.push(current);
    }
    lines.join("\n")
}
