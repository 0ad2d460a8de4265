//! Message suppression patterns
//!
//! A pattern that looks like a bare message id (`no-url-tag`) matches that id
//! exactly. Anything else is treated as a regular expression and searched in
//! the formatted report line, so `foo.*: W: .*-not-compressed` works the same
//! way it does in rpmlintrc files.

use crate::models::Message;
use regex::Regex;

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact message id
    Id(String),
    /// Regex searched against the formatted line
    Line(Regex),
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        if is_plain_id(pattern) {
            Ok(Pattern::Id(pattern.to_string()))
        } else {
            Regex::new(pattern).map(Pattern::Line)
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Pattern::Id(id) => message.id == *id,
            Pattern::Line(re) => re.is_match(&message.text),
        }
    }
}

fn is_plain_id(pattern: &str) -> bool {
    !pattern.is_empty()
        && pattern
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

/// Score and display suppression, configured independently.
///
/// `filters` patterns hide a message from both, `score_filters` only from
/// the badness score and `display_filters` only from the printed report.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    both: Vec<Pattern>,
    score_only: Vec<Pattern>,
    display_only: Vec<Pattern>,
}

impl FilterSet {
    pub fn from_lists(
        filters: &[String],
        score_filters: &[String],
        display_filters: &[String],
    ) -> Result<Self, regex::Error> {
        let compile = |list: &[String]| -> Result<Vec<Pattern>, regex::Error> {
            list.iter().map(|p| Pattern::parse(p)).collect()
        };
        Ok(Self {
            both: compile(filters)?,
            score_only: compile(score_filters)?,
            display_only: compile(display_filters)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.both.is_empty() && self.score_only.is_empty() && self.display_only.is_empty()
    }

    pub fn suppresses_score(&self, message: &Message) -> bool {
        any_match(&self.both, message) || any_match(&self.score_only, message)
    }

    pub fn suppresses_display(&self, message: &Message) -> bool {
        any_match(&self.both, message) || any_match(&self.display_only, message)
    }
}

fn any_match(patterns: &[Pattern], message: &Message) -> bool {
    patterns.iter().any(|p| p.matches(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn msg(id: &str, details: &[&str]) -> Message {
        Message::new(
            Severity::Warning,
            Some("foo-1.0-1.noarch"),
            id,
            details.iter().map(|d| d.to_string()).collect(),
        )
    }

    fn lists(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_id_is_exact() {
        let p = Pattern::parse("no-url-tag").unwrap();
        assert!(matches!(p, Pattern::Id(_)));
        assert!(p.matches(&msg("no-url-tag", &[])));
        assert!(!p.matches(&msg("no-url-tag-extra", &[])));
    }

    #[test]
    fn test_regex_searches_line() {
        let p = Pattern::parse(r"W: .*-not-compressed /usr/share/man").unwrap();
        assert!(p.matches(&msg("manpage-not-compressed", &["/usr/share/man/man1/x.1"])));
        assert!(!p.matches(&msg("manpage-not-compressed", &["/opt/man/x.1"])));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(Pattern::parse("(unclosed").is_err());
    }

    #[test]
    fn test_score_and_display_are_independent() {
        let set = FilterSet::from_lists(
            &lists(&["both-id"]),
            &lists(&["score-id"]),
            &lists(&["display-id"]),
        )
        .unwrap();

        let both = msg("both-id", &[]);
        assert!(set.suppresses_score(&both) && set.suppresses_display(&both));

        let score = msg("score-id", &[]);
        assert!(set.suppresses_score(&score) && !set.suppresses_display(&score));

        let display = msg("display-id", &[]);
        assert!(!set.suppresses_score(&display) && set.suppresses_display(&display));

        let other = msg("other", &[]);
        assert!(!set.suppresses_score(&other) && !set.suppresses_display(&other));
    }
}
