//! Case memory: past candidate outcomes retrieved by similarity to the
//! current profile, used as grounding examples for roadmap generation.

pub mod handlers;

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matching::dedup::dedupe;
use crate::matching::geo::CountryEntry;
use crate::matching::normalize::normalize;
use crate::matching::overlap::token_overlap;
use crate::matching::profile::{ExperienceLevel, QueryProfile};
use crate::matching::skills::extract_skills;
use crate::models::job::CandidateRecord;
use crate::retrieval::MAX_TAGS;

pub const CASE_PROVIDER: &str = "case_memory";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub level: Option<ExperienceLevel>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub outcome: String,
}

impl Case {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.role, self.skills.join(" "), self.summary)
    }

    /// Listed skills first, then any known skill mentioned in the summary.
    /// Capped at `MAX_TAGS` like every other record source.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let listed = self.skills.iter().map(|s| normalize(s));
        for tag in listed.chain(extract_skills(&self.summary, None)) {
            if tags.len() >= MAX_TAGS {
                break;
            }
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn to_record(&self) -> CandidateRecord {
        CandidateRecord::new(
            self.role.clone(),
            self.outcome.clone(),
            self.country.clone().unwrap_or_default(),
            CASE_PROVIDER,
            format!("case://{}", self.id),
        )
        .with_tags(self.tags())
        .with_snippet(self.summary.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaseMemory {
    cases: Vec<Case>,
}

struct Scored<'a> {
    case: &'a Case,
    overlap: f64,
    same_level: bool,
    same_country: bool,
}

impl CaseMemory {
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    /// Loads a JSON array of cases.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read cases file: {}", path.display()))?;
        let cases: Vec<Case> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid cases file: {}", path.display()))?;
        info!("Loaded {} historical cases from {}", cases.len(), path.display());
        Ok(Self::new(cases))
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases most similar to `profile`: keyword overlap first, then level
    /// and country agreement. Zero-overlap cases are dropped.
    /// Each returned record's `score` is its overlap ratio.
    pub fn similar_cases(&self, profile: &QueryProfile, limit: usize) -> Vec<CandidateRecord> {
        let query = profile.normalized_keywords.join(" ");
        let country = profile.country.as_deref().and_then(CountryEntry::lookup);

        let mut scored: Vec<Scored<'_>> = self
            .cases
            .iter()
            .map(|case| Scored {
                case,
                overlap: token_overlap(&query, &case.search_text()),
                same_level: case.level == Some(profile.experience_level),
                same_country: match (country, case.country.as_deref()) {
                    (Some(entry), Some(c)) => {
                        CountryEntry::lookup(c).is_some_and(|other| other.iso == entry.iso)
                    }
                    _ => false,
                },
            })
            .filter(|s| s.overlap > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.overlap
                .partial_cmp(&a.overlap)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.same_level.cmp(&a.same_level))
                .then_with(|| b.same_country.cmp(&a.same_country))
                .then_with(|| a.case.id.cmp(&b.case.id))
        });

        let records = scored
            .into_iter()
            .map(|s| {
                let mut record = s.case.to_record();
                record.score = s.overlap;
                record
            })
            .collect();

        let mut records = dedupe(records);
        records.truncate(limit);
        records
    }
}
