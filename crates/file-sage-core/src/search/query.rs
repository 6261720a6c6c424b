use chrono::{DateTime, Utc};

/// A user query. Matching is case-insensitive substring matching everywhere,
/// so the only derived form is the lowercase string.
///
/// `now` is fixed when the query is created so every strategy and the ranker
/// judge recency against the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    raw: String,
    lower: String,
    now: DateTime<Utc>,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self::with_now(raw, Utc::now())
    }

    pub fn with_now(raw: &str, now: DateTime<Utc>) -> Self {
        Self {
            raw: raw.to_string(),
            lower: raw.to_lowercase(),
            now,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.lower.split_whitespace()
    }

    /// First keyword of `keywords` that occurs anywhere in the query.
    pub fn first_keyword<'k>(&self, keywords: &[&'k str]) -> Option<&'k str> {
        keywords
            .iter()
            .find(|keyword| self.lower.contains(*keyword))
            .copied()
    }

    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        self.first_keyword(keywords).is_some()
    }
}
