//! Composite, additive scoring of candidate records against a
//! query profile, boosted by learned feedback weights.
//!
//! Every term is independent:
//! keyword hits + geography + recency bucket + provider trust + level fit + feedback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackProfile;
use crate::matching::geo::{matches_city, matches_country};
use crate::matching::normalize::{contains_word, normalize, word_text};
use crate::matching::profile::{ExperienceLevel, QueryProfile};
use crate::matching::recency::age_hours;
use crate::models::job::CandidateRecord;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingWeights {
    pub keyword_hit: f64,
    pub country_match: f64,
    pub city_match: f64,
    pub fresh_24h: f64,
    pub fresh_72h: f64,
    pub fresh_168h: f64,
    pub level_match: f64,
    pub level_mismatch_penalty: f64,
    /// Additive bonus per normalized provider name. Unlisted providers get 0.
    pub provider_trust: HashMap<String, f64>,
    pub keyword_boost_cap: f64,
    pub source_boost_cap: f64,
    /// Fixed score of fallback placeholders; they are never re-scored.
    pub placeholder_score: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            keyword_hit: 12.0,
            country_match: 8.0,
            city_match: 6.0,
            fresh_24h: 10.0,
            fresh_72h: 6.0,
            fresh_168h: 3.0,
            level_match: 8.0,
            level_mismatch_penalty: 10.0,
            provider_trust: HashMap::from([
                ("jsearch".to_string(), 10.0),
                ("adzuna".to_string(), 8.0),
            ]),
            keyword_boost_cap: 12.0,
            source_boost_cap: 8.0,
            placeholder_score: 1.0,
        }
    }
}

const ENTRY_LEVEL_TERMS: &[&str] = &[
    "intern",
    "internship",
    "trainee",
    "junior",
    "jr",
    "entry level",
    "practicante",
    "pasante",
    "practicas",
    "sin experiencia",
];

const SENIOR_TERMS: &[&str] = &[
    "senior", "sr", "lead", "manager", "principal", "head", "jefe", "gerente", "director",
];

// ────────────────────────────────────────────────────────────────────────────
// Score breakdown
// ────────────────────────────────────────────────────────────────────────────

/// Per-term contributions, kept separate so callers can explain a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub keyword: f64,
    pub keyword_hits: usize,
    pub geography: f64,
    pub recency: f64,
    pub provider_trust: f64,
    pub level_fit: f64,
    pub feedback: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.keyword + self.geography + self.recency + self.provider_trust + self.level_fit
            + self.feedback
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    weights: RankingWeights,
}

impl RankingEngine {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    pub fn breakdown(
        &self,
        record: &CandidateRecord,
        profile: &QueryProfile,
        feedback: Option<&FeedbackProfile>,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let w = &self.weights;
        let raw_text = record.match_text();
        let text = normalize(&raw_text);
        let padded = word_text(&raw_text);

        let matched: Vec<&str> = profile
            .normalized_keywords
            .iter()
            .map(String::as_str)
            .filter(|kw| !kw.is_empty() && text.contains(kw))
            .collect();

        let mut breakdown = ScoreBreakdown {
            keyword_hits: matched.len(),
            keyword: matched.len() as f64 * w.keyword_hit,
            ..Default::default()
        };

        if let Some(country) = profile.country.as_deref() {
            if matches_country(&raw_text, country) {
                breakdown.geography += w.country_match;
            }
            if matches_city(&raw_text, country, profile.city_or_region.as_deref()) {
                breakdown.geography += w.city_match;
            }
        }

        breakdown.recency = match age_hours(&record.published_at, now) {
            Some(h) if h <= 24.0 => w.fresh_24h,
            Some(h) if h <= 72.0 => w.fresh_72h,
            Some(h) if h <= 168.0 => w.fresh_168h,
            _ => 0.0,
        };

        breakdown.provider_trust = w
            .provider_trust
            .get(&normalize(&record.source_provider))
            .copied()
            .unwrap_or(0.0);

        breakdown.level_fit = self.level_fit(&padded, profile.experience_level);

        if let Some(feedback) = feedback {
            let keyword_boost: f64 = matched
                .iter()
                .filter_map(|kw| feedback.keyword_weights.get(*kw))
                .sum();
            let source_boost = feedback
                .source_weights
                .get(&normalize(&record.source_provider))
                .copied()
                .unwrap_or(0.0);
            breakdown.feedback = keyword_boost.min(w.keyword_boost_cap)
                + source_boost.min(w.source_boost_cap);
        }

        breakdown
    }

    /// Rewards postings whose seniority matches the profile, penalizes the
    /// opposite end. Mid-level profiles are neutral.
    fn level_fit(&self, padded: &str, level: ExperienceLevel) -> f64 {
        let has_entry = ENTRY_LEVEL_TERMS.iter().any(|t| contains_word(padded, t));
        let has_senior = SENIOR_TERMS.iter().any(|t| contains_word(padded, t));
        let w = &self.weights;

        match level {
            ExperienceLevel::Intern | ExperienceLevel::Junior => {
                if has_senior {
                    -w.level_mismatch_penalty
                } else if has_entry {
                    w.level_match
                } else {
                    0.0
                }
            }
            ExperienceLevel::Senior => {
                if has_entry {
                    -w.level_mismatch_penalty
                } else if has_senior {
                    w.level_match
                } else {
                    0.0
                }
            }
            ExperienceLevel::Mid => 0.0,
        }
    }

    pub fn score(
        &self,
        record: &CandidateRecord,
        profile: &QueryProfile,
        feedback: Option<&FeedbackProfile>,
        now: DateTime<Utc>,
    ) -> f64 {
        if record.placeholder {
            return self.weights.placeholder_score;
        }
        self.breakdown(record, profile, feedback, now).total()
    }

    /// Scores, sorts (score desc, newer first on ties, placeholders last)
    /// and truncates to `top_k`.
    pub fn rank(
        &self,
        mut records: Vec<CandidateRecord>,
        profile: &QueryProfile,
        feedback: Option<&FeedbackProfile>,
        now: DateTime<Utc>,
        top_k: usize,
    ) -> Vec<CandidateRecord> {
        for record in records.iter_mut() {
            record.score = self.score(record, profile, feedback, now);
        }

        records.sort_by(|a, b| {
            a.placeholder
                .cmp(&b.placeholder)
                .then_with(|| b.score.total_cmp(&a.score))
                .then_with(|| b.published_at.timestamp.cmp(&a.published_at.timestamp))
        });
        records.truncate(top_k);
        records
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
