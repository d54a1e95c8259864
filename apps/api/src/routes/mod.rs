pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cases::handlers as cases;
use crate::feedback::handlers as feedback;
use crate::search::handlers as search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs/match", post(search::handle_match_jobs))
        .route(
            "/api/v1/feedback/:country/:level",
            get(feedback::handle_get_bucket),
        )
        .route("/api/v1/cases/similar", post(cases::handle_similar_cases))
        .with_state(state)
}
