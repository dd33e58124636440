//! Case-insensitive substring matching.

/// Normalized search text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    needle: String,
}

impl TextQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            needle: text.into().trim().to_lowercase(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.needle.is_empty()
    }

    /// Whether `title` or `description` contains the query, ignoring case.
    pub fn matches(&self, title: &str, description: &str) -> bool {
        self.is_blank()
            || title.to_lowercase().contains(&self.needle)
            || description.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::TextQuery;

    #[test]
    fn blank_query_matches_everything() {
        let query = TextQuery::new("   ");
        assert!(query.is_blank());
        assert!(query.matches("", ""));
    }

    #[test]
    fn matches_title_or_description_ignoring_case() {
        let query = TextQuery::new("MILK");
        assert!(query.matches("Buy milk", ""));
        assert!(query.matches("Groceries", "oat Milk and bread"));
        assert!(!query.matches("Groceries", "bread"));
    }

    #[test]
    fn non_ascii_text_is_case_folded() {
        let query = TextQuery::new("ÉPICERIE");
        assert!(query.matches("épicerie du coin", ""));
    }
}
