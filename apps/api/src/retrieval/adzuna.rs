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

pub const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const RESULTS_PER_PAGE: &str = "50";

pub const ADZUNA_FIELDS: FieldMap = FieldMap {
    title: &["title", "job_title", "position", "name"],
    organization: &["company.display_name", "company_name", "company"],
    location: &["location.display_name", "location.area.0", "location"],
    join_location: false,
    url: &["redirect_url", "url", "link"],
    published: &["created", "created_at"],
    description: &["description"],
};

/// Adzuna search API. Needs both credentials and a country Adzuna covers.
pub struct AdzunaProvider {
    client: Client,
    app_id: Option<String>,
    app_key: Option<String>,
    base_url: String,
}

impl AdzunaProvider {
    pub fn new(client: Client, app_id: Option<String>, app_key: Option<String>) -> Self {
        Self {
            client,
            app_id,
            app_key,
            base_url: ADZUNA_BASE_URL.to_string(),
        }
    }

    /// Adzuna market code for the query's country.
    fn market(query: &ProviderQuery) -> Result<&'static str, ProviderError> {
        let country = query
            .country
            .as_deref()
            .ok_or_else(|| ProviderError::Unavailable("Adzuna needs a country".to_string()))?;
        CountryEntry::lookup(country)
            .and_then(|entry| entry.adzuna_market)
            .ok_or_else(|| ProviderError::Unavailable(format!("Adzuna does not cover '{country}'")))
    }
}

pub fn parse_response(
    body: &Value,
    vocabulary: Option<&Vocabulary>,
    now: DateTime<Utc>,
) -> Result<Vec<CandidateRecord>, ProviderError> {
    let items = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("missing 'results' array".to_string()))?;
    Ok(ADZUNA_FIELDS.map_all(items, "adzuna", vocabulary, now))
}

#[async_trait]
impl JobProvider for AdzunaProvider {
    fn name(&self) -> &str {
        "adzuna"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<CandidateRecord>, ProviderError> {
        let (Some(app_id), Some(app_key)) = (self.app_id.as_deref(), self.app_key.as_deref()) else {
            return Err(ProviderError::Unavailable(
                "ADZUNA_APP_ID / ADZUNA_APP_KEY not set".to_string(),
            ));
        };
        let market = Self::market(query)?;

        let url = format!("{}/{}/search/1", self.base_url, market);
        let what = query.what();
        debug!("Adzuna query [{market}]: {what}");

        let mut params = vec![
            ("app_id", app_id.to_string()),
            ("app_key", app_key.to_string()),
            ("results_per_page", RESULTS_PER_PAGE.to_string()),
            ("what", what),
            ("content-type", "application/json".to_string()),
        ];
        if let Some(city) = &query.city_or_region {
            params.push(("where", city.clone()));
        }

        let body = fetch_json(self.client.get(url).query(&params)).await?;
        parse_response(&body, query.vocabulary.as_deref(), Utc::now())
    }
}
