use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::feedback::{FeedbackBucket, FeedbackStore, FeedbackStoreError};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS search_memory_buckets (
    bucket_key      TEXT PRIMARY KEY,
    keyword_weights JSONB NOT NULL DEFAULT '{}'::jsonb,
    source_weights  JSONB NOT NULL DEFAULT '{}'::jsonb,
    update_count    BIGINT NOT NULL DEFAULT 0,
    last_updated_at TIMESTAMPTZ
)"#;

#[derive(Debug, FromRow)]
struct BucketRow {
    keyword_weights: Json<BTreeMap<String, f64>>,
    source_weights: Json<BTreeMap<String, f64>>,
    update_count: i64,
    last_updated_at: Option<DateTime<Utc>>,
}

impl From<BucketRow> for FeedbackBucket {
    fn from(row: BucketRow) -> Self {
        Self {
            keyword_weights: row.keyword_weights.0,
            source_weights: row.source_weights.0,
            update_count: row.update_count.max(0) as u64,
            last_updated_at: row.last_updated_at,
        }
    }
}

/// Row-per-bucket table with JSONB weight maps.
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the bucket table if missing. Called once at startup.
    pub async fn ensure_schema(&self) -> Result<(), FeedbackStoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        info!("Feedback table search_memory_buckets ready");
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn load_bucket(&self, key: &str) -> Result<Option<FeedbackBucket>, FeedbackStoreError> {
        let row = sqlx::query_as::<_, BucketRow>(
            "SELECT keyword_weights, source_weights, update_count, last_updated_at
             FROM search_memory_buckets WHERE bucket_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FeedbackBucket::from))
    }

    async fn save_bucket(
        &self,
        key: &str,
        bucket: &FeedbackBucket,
    ) -> Result<(), FeedbackStoreError> {
        sqlx::query(
            "INSERT INTO search_memory_buckets
                (bucket_key, keyword_weights, source_weights, update_count, last_updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (bucket_key) DO UPDATE SET
                keyword_weights = EXCLUDED.keyword_weights,
                source_weights  = EXCLUDED.source_weights,
                update_count    = EXCLUDED.update_count,
                last_updated_at = EXCLUDED.last_updated_at",
        )
        .bind(key)
        .bind(Json(&bucket.keyword_weights))
        .bind(Json(&bucket.source_weights))
        .bind(i64::try_from(bucket.update_count).unwrap_or(i64::MAX))
        .bind(bucket.last_updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_maps_to_bucket() {
        let row = BucketRow {
            keyword_weights: Json(BTreeMap::from([("sql".to_string(), 1.4)])),
            source_weights: Json(BTreeMap::new()),
            update_count: 7,
            last_updated_at: None,
        };
        let bucket = FeedbackBucket::from(row);
        assert_eq!(bucket.keyword_weights["sql"], 1.4);
        assert_eq!(bucket.update_count, 7);
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        let row = BucketRow {
            keyword_weights: Json(BTreeMap::new()),
            source_weights: Json(BTreeMap::new()),
            update_count: -3,
            last_updated_at: None,
        };
        assert_eq!(FeedbackBucket::from(row).update_count, 0);
    }
}
