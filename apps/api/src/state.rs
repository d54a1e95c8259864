use std::sync::Arc;

use crate::cases::CaseMemory;
use crate::config::Config;
use crate::feedback::FeedbackWeightStore;
use crate::search::engine::JobMatchEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Retrieval, dedup and ranking pipeline. Owns the provider set.
    pub engine: Arc<JobMatchEngine>,
    pub feedback: FeedbackWeightStore,
    pub cases: Arc<CaseMemory>,
}
