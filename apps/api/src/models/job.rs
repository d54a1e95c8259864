use serde::{Deserialize, Serialize};

/// Label used when no publication time could be recovered from a posting.
pub const UNKNOWN_DATE_LABEL: &str = "Sin fecha";

/// Publication time of a posting. `timestamp` is unix seconds, 0 when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAt {
    pub timestamp: i64,
    pub label: String,
}

impl PublishedAt {
    pub fn unknown() -> Self {
        Self {
            timestamp: 0,
            label: UNKNOWN_DATE_LABEL.to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.timestamp > 0
    }
}

impl Default for PublishedAt {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One retrievable unit: a job posting from a provider or a historical case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub source_provider: String,
    pub canonical_url: String,
    /// Derived skill/keyword tokens, capped per provider mapping.
    pub tags: Vec<String>,
    pub score: f64,
    pub published_at: PublishedAt,
    /// Short description excerpt for display. Not used for scoring.
    #[serde(default)]
    pub snippet: String,
    /// Deterministic "search on portal" link rather than a live posting.
    #[serde(default)]
    pub placeholder: bool,
}

impl CandidateRecord {
    pub fn new(
        title: impl Into<String>,
        organization: impl Into<String>,
        location: impl Into<String>,
        source_provider: impl Into<String>,
        canonical_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            organization: organization.into(),
            location: location.into(),
            source_provider: source_provider.into(),
            canonical_url: canonical_url.into(),
            tags: Vec::new(),
            score: 0.0,
            published_at: PublishedAt::unknown(),
            snippet: String::new(),
            placeholder: false,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_published_at(mut self, published_at: PublishedAt) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Raw text the ranking engine matches keywords and geography against.
    pub fn match_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title,
            self.organization,
            self.location,
            self.tags.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_published_at_is_zero() {
        let p = PublishedAt::unknown();
        assert_eq!(p.timestamp, 0);
        assert_eq!(p.label, "Sin fecha");
        assert!(!p.is_known());
    }

    #[test]
    fn test_new_record_defaults() {
        let r = CandidateRecord::new("Dev", "Acme", "Lima", "jsearch", "https://x/1");
        assert_eq!(r.score, 0.0);
        assert!(!r.placeholder);
        assert!(r.tags.is_empty());
        assert!(!r.published_at.is_known());
    }

    #[test]
    fn test_match_text_includes_tags() {
        let r = CandidateRecord::new("Dev", "Acme", "Lima", "jsearch", "https://x/1")
            .with_tags(vec!["rust".to_string(), "sql".to_string()]);
        assert_eq!(r.match_text(), "Dev Acme Lima rust sql");
    }
}
