//! Badness scoring
//!
//! ```text
//! score = Σ weight(m.id)  for every message m
//!         where m.severity ∈ {Warning, Error} and m is not score-suppressed
//! weight(id) = scoring[id] if configured, else default_score
//! ```

use super::FilterSet;
use crate::models::Message;
use std::collections::BTreeMap;

/// Message id -> badness weight
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    weights: BTreeMap<String, u64>,
    default_weight: u64,
}

impl ScoreTable {
    pub fn new(weights: BTreeMap<String, u64>, default_weight: u64) -> Self {
        Self {
            weights,
            default_weight,
        }
    }

    pub fn weight(&self, id: &str) -> u64 {
        self.weights.get(id).copied().unwrap_or(self.default_weight)
    }

    /// Weight contributed by a single message
    pub fn message_weight(&self, message: &Message, filters: &FilterSet) -> u64 {
        if !message.severity.is_scored() || filters.suppresses_score(message) {
            0
        } else {
            self.weight(&message.id)
        }
    }

    /// Aggregate score of a message log
    pub fn score<'a>(
        &self,
        messages: impl IntoIterator<Item = &'a Message>,
        filters: &FilterSet,
    ) -> u64 {
        messages
            .into_iter()
            .map(|m| self.message_weight(m, filters))
            .fold(0u64, u64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn table() -> ScoreTable {
        let mut weights = BTreeMap::new();
        weights.insert("no-url-tag".to_string(), 50);
        weights.insert("prereq-use".to_string(), 30);
        weights.insert("network-checks-disabled".to_string(), 1000);
        ScoreTable::new(weights, 1)
    }

    fn msg(severity: Severity, id: &str) -> Message {
        Message::new(severity, Some("pkg"), id, vec![])
    }

    #[test]
    fn test_weight_lookup() {
        let t = table();
        assert_eq!(t.weight("no-url-tag"), 50);
        assert_eq!(t.weight("unregistered"), 1);
        assert_eq!(ScoreTable::default().weight("anything"), 0);
    }

    #[test]
    fn test_info_never_scores() {
        let t = table();
        let messages = vec![msg(Severity::Info, "network-checks-disabled")];
        assert_eq!(t.score(&messages, &FilterSet::default()), 0);
    }

    #[test]
    fn test_score_sums_warnings_and_errors() {
        let t = table();
        let messages = vec![
            msg(Severity::Warning, "no-url-tag"),
            msg(Severity::Error, "prereq-use"),
            msg(Severity::Warning, "something-else"),
        ];
        assert_eq!(t.score(&messages, &FilterSet::default()), 81);
    }

    #[test]
    fn test_score_suppression() {
        let t = table();
        let filters = FilterSet::from_lists(&[], &["no-url-tag".to_string()], &[]).unwrap();
        let messages = vec![
            msg(Severity::Warning, "no-url-tag"),
            msg(Severity::Error, "prereq-use"),
        ];
        assert_eq!(t.score(&messages, &filters), 30);
    }
}
