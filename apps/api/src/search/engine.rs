//! The job-match pipeline: profile → retrieval → dedup → ranking → learning.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::{FeedbackWeightStore, LEARNING_WINDOW};
use crate::matching::dedup::dedupe;
use crate::matching::gaps::{compute_skill_gaps, SkillGap};
use crate::matching::profile::{MatchRequest, QueryProfile};
use crate::matching::ranking::RankingEngine;
use crate::matching::skills::Vocabulary;
use crate::models::job::CandidateRecord;
use crate::retrieval::{MultiSourceRetriever, ProviderQuery, ProviderStatus};

/// Upper bound on accepted résumé text, in characters.
pub const MAX_RESUME_CHARS: usize = 50_000;
pub const SKILL_GAP_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub search_id: Uuid,
    pub profile: QueryProfile,
    pub jobs: Vec<CandidateRecord>,
    pub provider_statuses: Vec<ProviderStatus>,
    pub skill_gaps: Vec<SkillGap>,
}

pub struct JobMatchEngine {
    retriever: MultiSourceRetriever,
    ranking: RankingEngine,
    feedback: FeedbackWeightStore,
    vocabulary: Option<Arc<Vocabulary>>,
    top_k: usize,
}

impl JobMatchEngine {
    pub fn new(
        retriever: MultiSourceRetriever,
        ranking: RankingEngine,
        feedback: FeedbackWeightStore,
        vocabulary: Option<Arc<Vocabulary>>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            ranking,
            feedback,
            vocabulary,
            top_k,
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.retriever.provider_names()
    }

    pub fn build_profile(&self, request: &MatchRequest) -> Result<QueryProfile, AppError> {
        if request.raw_resume_text.chars().count() > MAX_RESUME_CHARS {
            return Err(AppError::Validation(format!(
                "raw_resume_text exceeds {MAX_RESUME_CHARS} characters"
            )));
        }
        if request.limit == Some(0) {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        Ok(QueryProfile::build(request, self.vocabulary.as_deref()))
    }

    /// Runs one search. Learning from the results happens in the
    /// background and never delays or fails the response.
    pub async fn match_jobs(&self, request: &MatchRequest) -> Result<MatchResponse, AppError> {
        let search_id = Uuid::new_v4();
        let profile = self.build_profile(request)?;
        if profile.used_generic_seeds {
            info!("Search {search_id}: no usable keywords, using generic seeds");
        }

        let query = ProviderQuery::from_profile(&profile, self.vocabulary.clone());
        let outcome = self.retriever.retrieve(&query).await;

        let level = profile.experience_level.as_str();
        let records = dedupe(outcome.records);
        let feedback = self
            .feedback
            .get_profile(profile.country.as_deref(), Some(level))
            .await;
        let ranked = self
            .ranking
            .rank(records, &profile, Some(&feedback), Utc::now(), self.top_k);

        let skill_gaps = compute_skill_gaps(&profile.normalized_keywords, &ranked, SKILL_GAP_LIMIT);
        self.spawn_learning(search_id, &profile, &ranked);

        let limit = request.limit.unwrap_or(self.top_k).min(self.top_k);
        let mut jobs = ranked;
        jobs.truncate(limit);

        info!(
            "Search {search_id}: {} jobs returned ({} providers)",
            jobs.len(),
            outcome.provider_statuses.len()
        );

        Ok(MatchResponse {
            search_id,
            profile,
            jobs,
            provider_statuses: outcome.provider_statuses,
            skill_gaps,
        })
    }

    fn spawn_learning(&self, search_id: Uuid, profile: &QueryProfile, ranked: &[CandidateRecord]) {
        let feedback = self.feedback.clone();
        let country = profile.country.clone();
        let level = profile.experience_level.as_str();
        let keywords = profile.normalized_keywords.clone();
        let top: Vec<CandidateRecord> = ranked
            .iter()
            .filter(|r| !r.placeholder)
            .take(LEARNING_WINDOW)
            .cloned()
            .collect();

        tokio::spawn(async move {
            if let Err(e) = feedback
                .learn_from_results(country.as_deref(), Some(level), &keywords, &top)
                .await
            {
                warn!("Search {search_id}: feedback learning failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::feedback::json_store::JsonFeedbackStore;
    use crate::retrieval::web_search::JOB_BOARDS;
    use crate::retrieval::{JobProvider, ProviderError, SEED_COUNT};

    struct StaticProvider(Vec<CandidateRecord>);

    #[async_trait]
    impl JobProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(
            &self,
            _query: &ProviderQuery,
        ) -> Result<Vec<CandidateRecord>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    fn engine(
        records: Vec<CandidateRecord>,
        dir: &tempfile::TempDir,
    ) -> (JobMatchEngine, FeedbackWeightStore) {
        let feedback = FeedbackWeightStore::new(Arc::new(JsonFeedbackStore::new(
            dir.path().join("memory.json"),
        )));
        let retriever = MultiSourceRetriever::new(
            vec![Arc::new(StaticProvider(records))],
            Duration::from_secs(5),
        );
        let engine = JobMatchEngine::new(
            retriever,
            RankingEngine::default(),
            feedback.clone(),
            None,
            200,
        );
        (engine, feedback)
    }

    fn job(title: &str, url: &str) -> CandidateRecord {
        CandidateRecord::new(title, "Acme", "Lima, Peru", "jsearch", url)
    }

    fn request(resume: &str) -> MatchRequest {
        MatchRequest {
            raw_resume_text: resume.to_string(),
            country: Some("Peru".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_match_dedupes_ranks_and_keeps_placeholders_last() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(
            vec![
                job("Java Developer", "https://x/2"),
                job("Python Developer", "https://x/1?ref=a"),
                job("Python Developer", "https://x/1?ref=b"),
            ],
            &dir,
        );

        let response = engine.match_jobs(&request("python")).await.unwrap();
        let genuine: Vec<_> = response.jobs.iter().filter(|j| !j.placeholder).collect();
        assert_eq!(genuine.len(), 2);
        assert_eq!(genuine[0].title, "Python Developer");
        assert!(response.jobs.last().unwrap().placeholder);
        assert_eq!(response.provider_statuses.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_returns_fallback_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(Vec::new(), &dir);
        let response = engine.match_jobs(&MatchRequest::default()).await.unwrap();
        assert!(!response.jobs.is_empty());
        assert!(response.jobs.iter().all(|j| j.placeholder));
        assert!(response.profile.used_generic_seeds);
    }

    #[tokio::test]
    async fn test_every_fallback_link_survives_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(Vec::new(), &dir);
        let response = engine.match_jobs(&request("python sql docker")).await.unwrap();

        let placeholders: Vec<&CandidateRecord> =
            response.jobs.iter().filter(|j| j.placeholder).collect();
        assert_eq!(placeholders.len(), SEED_COUNT * JOB_BOARDS.len());
        let urls: std::collections::HashSet<&str> =
            placeholders.iter().map(|j| j.canonical_url.as_str()).collect();
        assert_eq!(urls.len(), placeholders.len());
    }

    #[tokio::test]
    async fn test_limit_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(vec![job("Python Developer", "https://x/1")], &dir);

        let mut req = request("python");
        req.limit = Some(1);
        assert_eq!(engine.match_jobs(&req).await.unwrap().jobs.len(), 1);

        req.limit = Some(0);
        assert!(matches!(engine.match_jobs(&req).await, Err(AppError::Validation(_))));

        let huge = request(&"a".repeat(MAX_RESUME_CHARS + 1));
        assert!(matches!(engine.match_jobs(&huge).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_background_learning_updates_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, feedback) = engine(vec![job("Python Developer", "https://x/1")], &dir);
        let response = engine.match_jobs(&request("python")).await.unwrap();
        let level = response.profile.experience_level.as_str();

        let mut bucket = None;
        for _ in 0..50 {
            bucket = feedback.bucket(Some("Peru"), Some(level)).await.unwrap();
            if bucket.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let bucket = bucket.expect("bucket learned in background");
        assert!(bucket.keyword_weights.contains_key("python"));
        assert!(bucket.source_weights.contains_key("jsearch"));
        assert!(!bucket.source_weights.contains_key("fallback"));
    }
}
