//! Feedback weights: per (country, level) bucket keyword and source weights,
//! learned from the top results of past searches and fed back into ranking.
//!
//! The scheme is positive-only and capped. Weights never decay.

pub mod handlers;
pub mod json_store;
pub mod pg_store;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::matching::normalize::normalize;
use crate::models::job::CandidateRecord;

pub const KEYWORD_WEIGHT_CAP: f64 = 6.0;
pub const SOURCE_WEIGHT_CAP: f64 = 8.0;
/// Increment per top result containing a searched keyword.
pub const KEYWORD_STEP: f64 = 0.2;
/// Only the first N ranked results teach the bucket.
pub const LEARNING_WINDOW: usize = 20;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackBucket {
    #[serde(default)]
    pub keyword_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub source_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// The read-side view the ranking engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackProfile {
    pub keyword_weights: BTreeMap<String, f64>,
    pub source_weights: BTreeMap<String, f64>,
}

impl From<FeedbackBucket> for FeedbackProfile {
    fn from(bucket: FeedbackBucket) -> Self {
        Self {
            keyword_weights: bucket.keyword_weights,
            source_weights: bucket.source_weights,
        }
    }
}

/// Bucket id: `normalize(country)|normalize(level)`, `global` / `unknown` when absent.
pub fn bucket_key(country: Option<&str>, level: Option<&str>) -> String {
    let part = |value: Option<&str>, fallback: &str| {
        value
            .map(normalize)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    format!("{}|{}", part(country, "global"), part(level, "unknown"))
}

impl FeedbackBucket {
    /// Applies one learning event. Returns false (and leaves the bucket
    /// untouched) when there is nothing to learn from.
    pub fn learn(
        &mut self,
        searched_keywords: &[String],
        top_results: &[CandidateRecord],
        now: DateTime<Utc>,
    ) -> bool {
        let keywords: Vec<String> = searched_keywords
            .iter()
            .map(|k| normalize(k))
            .filter(|k| !k.is_empty())
            .collect();
        let results: Vec<&CandidateRecord> = top_results
            .iter()
            .filter(|r| !r.placeholder)
            .take(LEARNING_WINDOW)
            .collect();
        if keywords.is_empty() || results.is_empty() {
            return false;
        }

        let result_texts: Vec<String> = results
            .iter()
            .map(|r| normalize(&format!("{} {}", r.title, r.tags.join(" "))))
            .collect();

        for keyword in &keywords {
            let count = result_texts.iter().filter(|t| t.contains(keyword.as_str())).count();
            if count > 0 {
                let weight = self.keyword_weights.entry(keyword.clone()).or_insert(0.0);
                *weight = (*weight + count as f64 * KEYWORD_STEP).min(KEYWORD_WEIGHT_CAP);
            }
        }

        for (rank, record) in results.iter().enumerate() {
            let source = normalize(&record.source_provider);
            if source.is_empty() {
                continue;
            }
            let bonus = (1.2 - rank as f64 * 0.05).max(0.2);
            let weight = self.source_weights.entry(source).or_insert(0.0);
            *weight = (*weight + bonus).min(SOURCE_WEIGHT_CAP);
        }

        self.update_count += 1;
        self.last_updated_at = Some(now);
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage backends
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FeedbackStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-full / write-full persistence keyed by bucket id.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn load_bucket(&self, key: &str) -> Result<Option<FeedbackBucket>, FeedbackStoreError>;

    async fn save_bucket(&self, key: &str, bucket: &FeedbackBucket)
        -> Result<(), FeedbackStoreError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// FeedbackWeightStore: the service the engine talks to
// ────────────────────────────────────────────────────────────────────────────

/// Wraps a `FeedbackStore` and serializes read-modify-write per bucket id.
#[derive(Clone)]
pub struct FeedbackWeightStore {
    store: Arc<dyn FeedbackStore>,
    bucket_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl FeedbackWeightStore {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self {
            store,
            bucket_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.bucket_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Raw bucket, `None` when nothing was learned yet.
    pub async fn bucket(
        &self,
        country: Option<&str>,
        level: Option<&str>,
    ) -> Result<Option<FeedbackBucket>, FeedbackStoreError> {
        self.store.load_bucket(&bucket_key(country, level)).await
    }

    /// Current weights for the bucket. Never fails: storage errors are
    /// logged and yield empty weights.
    pub async fn get_profile(&self, country: Option<&str>, level: Option<&str>) -> FeedbackProfile {
        let key = bucket_key(country, level);
        match self.store.load_bucket(&key).await {
            Ok(Some(bucket)) => bucket.into(),
            Ok(None) => FeedbackProfile::default(),
            Err(e) => {
                warn!("Feedback bucket '{key}' unreadable, ranking without boost: {e}");
                FeedbackProfile::default()
            }
        }
    }

    /// Reinforces the bucket from the top results of a search.
    /// Returns whether the bucket was written.
    pub async fn learn_from_results(
        &self,
        country: Option<&str>,
        level: Option<&str>,
        searched_keywords: &[String],
        top_results: &[CandidateRecord],
    ) -> Result<bool, FeedbackStoreError> {
        if searched_keywords.is_empty() || top_results.is_empty() {
            debug!("Skipping feedback learning: nothing searched or nothing found");
            return Ok(false);
        }

        let key = bucket_key(country, level);
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        let mut bucket = self.store.load_bucket(&key).await?.unwrap_or_default();
        if !bucket.learn(searched_keywords, top_results, Utc::now()) {
            return Ok(false);
        }
        self.store.save_bucket(&key, &bucket).await?;

        info!(
            "Feedback bucket '{}' updated (update #{}, {} keywords, {} sources)",
            key,
            bucket.update_count,
            bucket.keyword_weights.len(),
            bucket.source_weights.len()
        );
        Ok(true)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
