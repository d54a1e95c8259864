//! Multi-source job retrieval.
//!
//! Every provider implements `JobProvider`. The retriever fans out to all of
//! them concurrently, each under its own timeout, and never lets one failure
//! affect the others. Failures become `ProviderStatus` entries. The
//! deterministic fallback generator always contributes placeholder links, so
//! the merged list is never empty.

pub mod adzuna;
pub mod fallback;
pub mod field_picker;
pub mod http;
pub mod jsearch;
pub mod web_search;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::matching::geo::geo_filter;
use crate::matching::profile::{ExperienceLevel, QueryProfile};
use crate::matching::skills::Vocabulary;
use crate::models::job::CandidateRecord;
use crate::retrieval::fallback::FallbackGenerator;

/// Seed keywords sent to fan-out providers per search.
pub const SEED_COUNT: usize = 3;
/// Skill tags kept per mapped posting.
pub const MAX_TAGS: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Errors and status
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing credentials or configuration. No request was made.
    #[error("disabled: {0}")]
    Unavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Per-provider outcome of one retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub provider_name: String,
    pub enabled: bool,
    pub success: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderStatus {
    fn from_result(name: &str, result: &Result<Vec<CandidateRecord>, ProviderError>) -> Self {
        match result {
            Ok(records) => Self {
                provider_name: name.to_string(),
                enabled: true,
                success: true,
                count: records.len(),
                error: None,
            },
            Err(e) => Self {
                provider_name: name.to_string(),
                enabled: !matches!(e, ProviderError::Unavailable(_)),
                success: false,
                count: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider contract
// ────────────────────────────────────────────────────────────────────────────

/// What providers are asked for, derived from the query profile.
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    /// The first `SEED_COUNT` keywords. Bounds per-provider fan-out.
    pub seeds: Vec<String>,
    pub desired_role: Option<String>,
    pub country: Option<String>,
    pub city_or_region: Option<String>,
    pub experience_level: ExperienceLevel,
    pub seniority_terms: Vec<String>,
    pub vocabulary: Option<Arc<Vocabulary>>,
}

impl ProviderQuery {
    pub fn from_profile(profile: &QueryProfile, vocabulary: Option<Arc<Vocabulary>>) -> Self {
        Self {
            seeds: profile.seed_keywords(SEED_COUNT),
            desired_role: profile.desired_role.clone(),
            country: profile.country.clone(),
            city_or_region: profile.city_or_region.clone(),
            experience_level: profile.experience_level,
            seniority_terms: profile.seniority_terms.clone(),
            vocabulary,
        }
    }

    /// "city, country" with whichever parts are present.
    pub fn location_text(&self) -> String {
        [self.city_or_region.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Free-text "what" for API providers: the role when given, else the seeds.
    pub fn what(&self) -> String {
        match &self.desired_role {
            Some(role) => role.clone(),
            None => self.seeds.join(" "),
        }
    }
}

/// A pluggable job source. Implementations must not panic on hostile
/// payloads and must return `Unavailable` without any I/O when unconfigured.
#[async_trait]
pub trait JobProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<CandidateRecord>, ProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Retriever
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    pub records: Vec<CandidateRecord>,
    pub provider_statuses: Vec<ProviderStatus>,
}

pub struct MultiSourceRetriever {
    providers: Vec<Arc<dyn JobProvider>>,
    timeout: Duration,
    fallback: FallbackGenerator,
}

impl MultiSourceRetriever {
    pub fn new(providers: Vec<Arc<dyn JobProvider>>, timeout: Duration) -> Self {
        Self {
            providers,
            timeout,
            fallback: FallbackGenerator::default(),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Queries all providers concurrently, merges their records with the
    /// fallback placeholders and applies the geographic filter.
    pub async fn retrieve(&self, query: &ProviderQuery) -> RetrievalOutcome {
        let calls = self.providers.iter().map(|provider| async move {
            let result = tokio::time::timeout(self.timeout, provider.fetch(query))
                .await
                .unwrap_or(Err(ProviderError::Timeout));
            (provider.name().to_string(), result)
        });
        let settled = join_all(calls).await;

        let mut records = Vec::new();
        let mut provider_statuses = Vec::with_capacity(settled.len());
        for (name, result) in settled {
            let status = ProviderStatus::from_result(&name, &result);
            match result {
                Ok(found) => {
                    info!("Provider '{}' returned {} records", name, found.len());
                    records.extend(found);
                }
                Err(ProviderError::Unavailable(reason)) => {
                    info!("Provider '{}' skipped: {}", name, reason);
                }
                Err(e) => warn!("Provider '{}' failed: {}", name, e),
            }
            provider_statuses.push(status);
        }

        let genuine = records.len();
        records.extend(self.fallback.generate(query));
        let records = geo_filter(records, query.country.as_deref());

        info!(
            "Retrieved {} records ({} genuine before geo filter) from {} providers",
            records.len(),
            genuine,
            provider_statuses.len()
        );

        RetrievalOutcome {
            records,
            provider_statuses,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::MatchRequest;

    enum Behavior {
        Records(Vec<CandidateRecord>),
        Fail(fn() -> ProviderError),
        Hang,
    }

    struct FakeProvider {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl JobProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(
            &self,
            _query: &ProviderQuery,
        ) -> Result<Vec<CandidateRecord>, ProviderError> {
            match &self.behavior {
                Behavior::Records(records) => Ok(records.clone()),
                Behavior::Fail(make) => Err(make()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn provider(name: &'static str, behavior: Behavior) -> Arc<dyn JobProvider> {
        Arc::new(FakeProvider { name, behavior })
    }

    fn query(resume: &str, role: Option<&str>, country: Option<&str>) -> ProviderQuery {
        let profile = QueryProfile::build(
            &MatchRequest {
                raw_resume_text: resume.to_string(),
                desired_role: role.map(str::to_string),
                country: country.map(str::to_string),
                ..Default::default()
            },
            None,
        );
        ProviderQuery::from_profile(&profile, None)
    }

    fn job(title: &str, location: &str) -> CandidateRecord {
        CandidateRecord::new(title, "Acme", location, "jsearch", format!("https://x/{title}"))
    }

    #[tokio::test]
    async fn test_all_providers_disabled_still_returns_fallback() {
        let retriever = MultiSourceRetriever::new(
            vec![
                provider("jsearch", Behavior::Fail(|| ProviderError::Unavailable("no key".into()))),
                provider("adzuna", Behavior::Fail(|| ProviderError::Unavailable("no key".into()))),
                provider("web_search", Behavior::Fail(|| ProviderError::Http { status: 503 })),
            ],
            Duration::from_secs(5),
        );
        let outcome = retriever.retrieve(&query("python", None, Some("Peru"))).await;

        assert!(!outcome.records.is_empty());
        assert!(outcome.records.iter().all(|r| r.placeholder));
        assert_eq!(outcome.provider_statuses.len(), 3);
        assert!(outcome.provider_statuses.iter().all(|s| !s.enabled || !s.success));
        assert!(!outcome.provider_statuses[0].enabled);
        assert!(outcome.provider_statuses[2].enabled);
        assert_eq!(outcome.provider_statuses[2].error.as_deref(), Some("HTTP status 503"));
    }

    #[tokio::test]
    async fn test_empty_query_still_yields_placeholders() {
        let retriever = MultiSourceRetriever::new(Vec::new(), Duration::from_secs(5));
        let outcome = retriever.retrieve(&query("", None, None)).await;
        assert!(!outcome.records.is_empty());
        assert!(outcome.provider_statuses.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_siblings() {
        let retriever = MultiSourceRetriever::new(
            vec![
                provider("broken", Behavior::Fail(|| ProviderError::Malformed("bad".into()))),
                provider("good", Behavior::Records(vec![job("Rust Dev", "Lima")])),
            ],
            Duration::from_secs(5),
        );
        let outcome = retriever.retrieve(&query("rust", None, Some("Peru"))).await;

        let genuine: Vec<_> = outcome.records.iter().filter(|r| !r.placeholder).collect();
        assert_eq!(genuine.len(), 1);
        assert!(!outcome.provider_statuses[0].success);
        assert_eq!(outcome.provider_statuses[1].count, 1);
        assert!(outcome.provider_statuses[1].success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_provider_times_out() {
        let retriever = MultiSourceRetriever::new(
            vec![
                provider("slow", Behavior::Hang),
                provider("good", Behavior::Records(vec![job("Rust Dev", "Lima")])),
            ],
            Duration::from_secs(20),
        );
        let outcome = retriever.retrieve(&query("rust", None, None)).await;

        assert_eq!(outcome.provider_statuses[0].error.as_deref(), Some("request timed out"));
        assert!(outcome.provider_statuses[0].enabled);
        assert!(outcome.provider_statuses[1].success);
    }

    #[tokio::test]
    async fn test_geo_filter_applies_after_merge() {
        let retriever = MultiSourceRetriever::new(
            vec![provider(
                "good",
                Behavior::Records(vec![job("Dev A", "Lima, Peru"), job("Dev B", "Madrid")]),
            )],
            Duration::from_secs(5),
        );
        let outcome = retriever.retrieve(&query("rust", None, Some("Peru"))).await;
        let genuine: Vec<_> = outcome.records.iter().filter(|r| !r.placeholder).collect();
        assert_eq!(genuine.len(), 1);
        assert_eq!(genuine[0].title, "Dev A");
    }

    #[test]
    fn test_provider_query_helpers() {
        let mut q = query("python sql docker aws", Some("Data Engineer"), Some("Peru"));
        assert_eq!(q.seeds.len(), SEED_COUNT);
        assert_eq!(q.seeds[..2], ["data", "engineer"]);
        assert_eq!(q.what(), "Data Engineer");
        assert_eq!(q.location_text(), "Peru");
        q.city_or_region = Some("Lima".to_string());
        assert_eq!(q.location_text(), "Lima, Peru");
    }
}
