//! Message id -> explanation text

use std::collections::BTreeMap;

/// Text printed by `--explain` for ids missing from the catalog
pub const UNKNOWN_MESSAGE: &str =
    "Unknown message, please report a bug if the description should be present.";

#[derive(Debug, Clone, Default)]
pub struct ExplanationCatalog {
    entries: BTreeMap<String, String>,
}

impl ExplanationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explanation. A second registration of the same id keeps
    /// the first text.
    pub fn register(&mut self, id: &str, text: &str) {
        self.entries
            .entry(id.to_string())
            .or_insert_with(|| normalize(text));
    }

    pub fn register_all<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (id, text) in entries {
            self.register(id.as_ref(), text.as_ref());
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Explanation text, or the "unknown message" notice
    pub fn describe(&self, id: &str) -> &str {
        self.get(id).unwrap_or(UNKNOWN_MESSAGE)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collapse the whitespace of multi-line string literals into single spaces
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_and_unknown() {
        let mut catalog = ExplanationCatalog::new();
        catalog.register(
            "no-url-tag",
            "The URL tag is missing.
             Please add a http or ftp link.",
        );

        assert_eq!(
            catalog.describe("no-url-tag"),
            "The URL tag is missing. Please add a http or ftp link."
        );
        assert_eq!(catalog.describe("nope"), UNKNOWN_MESSAGE);
    }

    #[test]
    fn test_first_registration_wins() {
        let mut catalog = ExplanationCatalog::new();
        catalog.register("a", "first");
        catalog.register("a", "second");
        assert_eq!(catalog.get("a"), Some("first"));
        assert_eq!(catalog.len(), 1);
    }
}
