use std::collections::HashSet;

use crate::matching::normalize::normalize;

/// Fraction of the query's tokens that also appear in the candidate text.
///
/// Asymmetric on purpose: `score(a, b) != score(b, a)` in general.
/// Returns 0.0 when the query has no tokens.
pub fn token_overlap(query_text: &str, candidate_text: &str) -> f64 {
    let query = normalize(query_text);
    let candidate = normalize(candidate_text);

    let query_tokens: HashSet<&str> = query.split(' ').filter(|t| !t.is_empty()).collect();
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens: HashSet<&str> =
        candidate.split(' ').filter(|t| !t.is_empty()).collect();

    let shared = query_tokens.intersection(&candidate_tokens).count();
    shared as f64 / query_tokens.len() as f64
}
