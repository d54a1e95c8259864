use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::matching::geo::CountryEntry;
use crate::matching::skills::Vocabulary;
use crate::models::job::CandidateRecord;
use crate::retrieval::field_picker::FieldMap;
use crate::retrieval::http::fetch_json;
use crate::retrieval::{JobProvider, ProviderError, ProviderQuery};

pub const JSEARCH_URL: &str = "https://jsearch.p.rapidapi.com/search";
const JSEARCH_HOST: &str = "jsearch.p.rapidapi.com";

pub const JSEARCH_FIELDS: FieldMap = FieldMap {
    title: &["job_title", "title", "position", "name"],
    organization: &["employer_name", "company_name", "company"],
    location: &["job_city", "job_state", "job_country", "job_location"],
    join_location: true,
    url: &["job_apply_link", "job_google_link", "url", "link"],
    published: &[
        "job_posted_at_timestamp",
        "job_posted_at_datetime_utc",
        "job_posted_at",
    ],
    description: &["job_description", "description"],
};

/// RapidAPI JSearch. Disabled without `JSEARCH_API_KEY`.
pub struct JSearchProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl JSearchProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: JSEARCH_URL.to_string(),
        }
    }

    fn search_text(query: &ProviderQuery) -> String {
        let location = query.location_text();
        if location.is_empty() {
            query.what()
        } else {
            format!("{} in {}", query.what(), location)
        }
    }
}

/// JSearch reports countries as ISO codes ("PE"); spell them out so the
/// geographic filter and ranking recognize them.
fn expand_country_codes(location: &str) -> String {
    location
        .split(", ")
        .map(|part| match CountryEntry::lookup(part) {
            Some(entry) if part.len() == 2 => entry.name.to_string(),
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn parse_response(
    body: &Value,
    vocabulary: Option<&Vocabulary>,
    now: DateTime<Utc>,
) -> Result<Vec<CandidateRecord>, ProviderError> {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("missing 'data' array".to_string()))?;

    Ok(JSEARCH_FIELDS
        .map_all(items, "jsearch", vocabulary, now)
        .into_iter()
        .map(|mut record| {
            record.location = expand_country_codes(&record.location);
            record
        })
        .collect())
}

#[async_trait]
impl JobProvider for JSearchProvider {
    fn name(&self) -> &str {
        "jsearch"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<CandidateRecord>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::Unavailable("JSEARCH_API_KEY not set".to_string()));
        };

        let text = Self::search_text(query);
        debug!("JSearch query: {text}");
        let request = self
            .client
            .get(&self.endpoint)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", JSEARCH_HOST)
            .query(&[("query", text.as_str()), ("page", "1"), ("num_pages", "1")]);

        let body = fetch_json(request).await?;
        parse_response(&body, query.vocabulary.as_deref(), Utc::now())
    }
}
