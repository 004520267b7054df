use marquee_common::DEFAULT_QUERY;
use std::fmt;

/// Free-text search term. Blank input falls back to [`DEFAULT_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self::with_default(raw, DEFAULT_QUERY)
    }

    /// Like [`SearchQuery::new`] but with a caller-chosen fallback.
    pub fn with_default(raw: &str, default: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            let fallback = default.trim();
            if fallback.is_empty() {
                return Self(DEFAULT_QUERY.to_string());
            }
            return Self(fallback.to_string());
        }
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self(DEFAULT_QUERY.to_string())
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SearchQuery {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
