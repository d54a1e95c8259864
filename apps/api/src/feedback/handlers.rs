use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::feedback::{bucket_key, FeedbackBucket};
use crate::matching::profile::ExperienceLevel;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FeedbackBucketResponse {
    pub bucket_key: String,
    pub backend: &'static str,
    #[serde(flatten)]
    pub bucket: FeedbackBucket,
}

/// GET /api/v1/feedback/:country/:level
///
/// `global` and `unknown` address the fallback buckets.
pub async fn handle_get_bucket(
    State(state): State<AppState>,
    Path((country, level)): Path<(String, String)>,
) -> Result<Json<FeedbackBucketResponse>, AppError> {
    let country = (country != "global").then_some(country);
    let level = match level.as_str() {
        "unknown" => None,
        other => Some(
            other
                .parse::<ExperienceLevel>()
                .map_err(AppError::Validation)?
                .as_str(),
        ),
    };

    let key = bucket_key(country.as_deref(), level);
    let bucket = state
        .feedback
        .bucket(country.as_deref(), level)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No feedback learned yet for '{key}'")))?;

    Ok(Json(FeedbackBucketResponse {
        bucket_key: key,
        backend: state.feedback.backend(),
        bucket,
    }))
}
