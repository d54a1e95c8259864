use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::matching::profile::MatchRequest;
use crate::search::engine::MatchResponse;
use crate::state::AppState;

/// POST /api/v1/jobs/match
pub async fn handle_match_jobs(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let response = state.engine.match_jobs(&req).await?;
    Ok(Json(response))
}
