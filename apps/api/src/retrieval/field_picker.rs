//! Best-effort mapping of untrusted provider JSON into `CandidateRecord`.
//!
//! Each logical field has an ordered list of candidate keys; the first one
//! that holds a usable value wins. Keys may be dotted paths into nested
//! objects (`company.display_name`). Nothing here assumes a field exists.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::matching::recency::{from_unix_seconds, parse_timestamp_str};
use crate::matching::skills::{extract_skills_ordered, Vocabulary};
use crate::models::job::{CandidateRecord, PublishedAt};
use crate::retrieval::MAX_TAGS;

/// Ordered candidate keys per logical field for one provider schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub title: &'static [&'static str],
    pub organization: &'static [&'static str],
    pub location: &'static [&'static str],
    /// Join every present location key with ", " instead of taking the first.
    pub join_location: bool,
    pub url: &'static [&'static str],
    pub published: &'static [&'static str],
    pub description: &'static [&'static str],
}

/// Resolves a dotted path. Array segments are addressed by index (`items.0`).
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// First non-empty string (or number) among `candidates`.
pub fn pick_str(value: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| lookup(value, key).and_then(as_text))
}

/// Every present, distinct value among `candidates`, in order.
pub fn pick_all_str(value: &Value, candidates: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for text in candidates.iter().filter_map(|key| lookup(value, key).and_then(as_text)) {
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(&text)) {
            out.push(text);
        }
    }
    out
}

/// First known publication time among `candidates`. Numbers are unix
/// seconds (or milliseconds when implausibly large); strings are RFC 3339
/// or relative phrases.
pub fn pick_published(value: &Value, candidates: &[&str], now: DateTime<Utc>) -> PublishedAt {
    candidates
        .iter()
        .filter_map(|key| lookup(value, key))
        .map(|v| match v {
            Value::Number(n) => n
                .as_i64()
                .map(|secs| if secs > 100_000_000_000 { secs / 1000 } else { secs })
                .map(from_unix_seconds)
                .unwrap_or_default(),
            Value::String(s) => parse_timestamp_str(s, now),
            _ => PublishedAt::unknown(),
        })
        .find(PublishedAt::is_known)
        .unwrap_or_default()
}

impl FieldMap {
    /// Maps one raw item. `None` when no URL can be found.
    pub fn map_record(
        &self,
        raw: &Value,
        provider: &str,
        vocabulary: Option<&Vocabulary>,
        now: DateTime<Utc>,
    ) -> Option<CandidateRecord> {
        let url = pick_str(raw, self.url)?;
        let title = pick_str(raw, self.title).unwrap_or_default();
        let organization = pick_str(raw, self.organization).unwrap_or_default();
        let location = if self.join_location {
            pick_all_str(raw, self.location).join(", ")
        } else {
            pick_str(raw, self.location).unwrap_or_default()
        };
        let description = pick_str(raw, self.description).unwrap_or_default();
        let tags = extract_skills_ordered(&format!("{title} {description}"), vocabulary, MAX_TAGS);
        let snippet: String = description.chars().take(280).collect();

        Some(
            CandidateRecord::new(title, organization, location, provider, url)
                .with_tags(tags)
                .with_published_at(pick_published(raw, self.published, now))
                .with_snippet(snippet),
        )
    }

    /// Maps every object in `items`, skipping unusable ones.
    pub fn map_all(
        &self,
        items: &[Value],
        provider: &str,
        vocabulary: Option<&Vocabulary>,
        now: DateTime<Utc>,
    ) -> Vec<CandidateRecord> {
        items
            .iter()
            .filter_map(|item| self.map_record(item, provider, vocabulary, now))
            .collect()
    }
}
