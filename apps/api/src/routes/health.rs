use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the configured provider set.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobmatch-api",
        "providers": state.engine.provider_names(),
        "feedback_backend": state.feedback.backend(),
        "ranking_top_k": state.config.ranking_top_k,
        "cases_loaded": state.cases.len(),
    }))
}
