use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::matching::profile::{MatchRequest, QueryProfile};
use crate::models::job::CandidateRecord;
use crate::state::AppState;

const DEFAULT_CASE_LIMIT: usize = 5;
const MAX_CASE_LIMIT: usize = 50;

#[derive(Serialize)]
pub struct SimilarCasesResponse {
    pub profile: QueryProfile,
    pub cases: Vec<CandidateRecord>,
}

/// POST /api/v1/cases/similar
pub async fn handle_similar_cases(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<SimilarCasesResponse>, AppError> {
    let profile = state.engine.build_profile(&req)?;
    let limit = req.limit.unwrap_or(DEFAULT_CASE_LIMIT).min(MAX_CASE_LIMIT);
    let cases = state.cases.similar_cases(&profile, limit);
    Ok(Json(SimilarCasesResponse { profile, cases }))
}
