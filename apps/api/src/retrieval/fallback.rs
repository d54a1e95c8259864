use url::Url;

use crate::matching::profile::GENERIC_SEED_KEYWORDS;
use crate::models::job::CandidateRecord;
use crate::retrieval::web_search::{JobBoard, JOB_BOARDS};
use crate::retrieval::ProviderQuery;

pub const FALLBACK_PROVIDER: &str = "fallback";
const SEARCH_ENGINE_URL: &str = "https://duckduckgo.com/";

/// Deterministic "search on portal" links, one per seed × job board.
/// Needs no I/O, so it runs even when every live provider is down.
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    boards: &'static [JobBoard],
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self {
            boards: JOB_BOARDS,
        }
    }
}

impl FallbackGenerator {
    pub fn generate(&self, query: &ProviderQuery) -> Vec<CandidateRecord> {
        let seeds: Vec<String> = if query.seeds.is_empty() {
            GENERIC_SEED_KEYWORDS.iter().map(|s| s.to_string()).collect()
        } else {
            query.seeds.clone()
        };
        let location = query.location_text();

        let mut placeholders = Vec::with_capacity(seeds.len() * self.boards.len());
        for seed in &seeds {
            for board in self.boards {
                let q = format!("site:{} {} {}", board.domain, seed, location);
                let Ok(url) = Url::parse_with_params(SEARCH_ENGINE_URL, &[("q", q.trim())]) else {
                    continue;
                };

                let mut record = CandidateRecord::new(
                    format!("Buscar \"{seed}\" en {}", board.name),
                    board.name,
                    location.clone(),
                    FALLBACK_PROVIDER,
                    url.to_string(),
                )
                .with_tags(vec![seed.clone()]);
                record.placeholder = true;
                placeholders.push(record);
            }
        }
        placeholders
    }
}
