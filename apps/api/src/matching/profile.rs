//! Query profile: the normalized view of a searcher's résumé and intent.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::normalize::{contains_word, normalize, word_text};
use crate::matching::skills::{extract_skills_ordered, Vocabulary, MAX_EXTRACTED_SKILLS};

/// Seeds used when neither the résumé nor the role yields any keyword.
pub const GENERIC_SEED_KEYWORDS: &[&str] = &["developer", "analyst", "engineer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[serde(alias = "practicante", alias = "trainee")]
    Intern,
    Junior,
    #[serde(alias = "semi-senior", alias = "mid-level")]
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Intern => "intern",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }

    pub fn is_entry_level(&self) -> bool {
        matches!(self, ExperienceLevel::Intern | ExperienceLevel::Junior)
    }

    /// Extra search/ranking seeds associated with the level.
    pub fn seniority_terms(&self) -> &'static [&'static str] {
        match self {
            ExperienceLevel::Intern => &["practicante", "intern", "trainee"],
            ExperienceLevel::Junior => &["junior", "entry level", "trainee"],
            ExperienceLevel::Mid => &["semi senior", "mid level"],
            ExperienceLevel::Senior => &["senior", "lead"],
        }
    }

    fn from_years(years: u32) -> Self {
        match years {
            0 => ExperienceLevel::Intern,
            1..=2 => ExperienceLevel::Junior,
            3..=5 => ExperienceLevel::Mid,
            _ => ExperienceLevel::Senior,
        }
    }

    /// Infers a level from free text. Explicit level words win over a
    /// "N years" statement; `None` when neither is present.
    pub fn infer(text: &str) -> Option<Self> {
        let padded = word_text(text);
        if padded.trim().is_empty() {
            return None;
        }

        let has_any = |terms: &[&str]| terms.iter().any(|t| contains_word(&padded, t));
        if has_any(SENIOR_WORDS) {
            return Some(ExperienceLevel::Senior);
        }
        if has_any(JUNIOR_WORDS) {
            return Some(ExperienceLevel::Junior);
        }
        if has_any(INTERN_WORDS) {
            return Some(ExperienceLevel::Intern);
        }

        let normalized = normalize(text);
        YEARS_RE
            .captures_iter(&normalized)
            .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
            .max()
            .map(Self::from_years)
    }
}

const SENIOR_WORDS: &[&str] = &["senior", "sr", "lead", "tech lead", "principal", "staff engineer"];
const JUNIOR_WORDS: &[&str] = &["junior", "jr", "entry level"];
const INTERN_WORDS: &[&str] = &[
    "intern",
    "internship",
    "practicante",
    "pasante",
    "practicas",
    "trainee",
    "estudiante",
];

static YEARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*\+?\s*(?:years?|yrs?|anos?)").expect("valid years regex")
});

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "intern" | "practicante" | "trainee" => Ok(ExperienceLevel::Intern),
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" | "semi-senior" | "semi senior" | "mid-level" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            other => Err(format!("unknown experience level '{other}'")),
        }
    }
}

/// Inbound match request as supplied by the HTTP layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub raw_resume_text: String,
    pub desired_role: Option<String>,
    pub country: Option<String>,
    pub city_or_region: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub limit: Option<usize>,
}

/// Ephemeral, per-request search profile.
#[derive(Debug, Clone, Serialize)]
pub struct QueryProfile {
    /// Ordered, de-duplicated, normalized keywords. The role phrase leads.
    pub normalized_keywords: Vec<String>,
    pub desired_role: Option<String>,
    pub country: Option<String>,
    pub city_or_region: Option<String>,
    pub experience_level: ExperienceLevel,
    pub prefers_entry_level: bool,
    pub seniority_terms: Vec<String>,
    /// The keywords are the generic seeds because nothing usable was found.
    pub used_generic_seeds: bool,
}

impl QueryProfile {
    pub fn build(request: &MatchRequest, vocabulary: Option<&Vocabulary>) -> Self {
        let desired_role = non_blank(request.desired_role.as_deref());
        let country = non_blank(request.country.as_deref());
        let city_or_region = non_blank(request.city_or_region.as_deref());

        let mut seen = HashSet::new();
        let mut keywords = Vec::new();
        let mut push = |kw: String| {
            if !kw.is_empty() && keywords.len() < MAX_EXTRACTED_SKILLS && seen.insert(kw.clone()) {
                keywords.push(kw);
            }
        };

        if let Some(role) = &desired_role {
            for token in role_tokens(role) {
                push(token);
            }
            for skill in extract_skills_ordered(role, vocabulary, MAX_EXTRACTED_SKILLS) {
                push(skill);
            }
        }
        let resume_skills =
            extract_skills_ordered(&request.raw_resume_text, vocabulary, MAX_EXTRACTED_SKILLS);
        for skill in resume_skills {
            push(skill);
        }

        let used_generic_seeds = keywords.is_empty();
        if used_generic_seeds {
            keywords = GENERIC_SEED_KEYWORDS.iter().map(|s| s.to_string()).collect();
        }

        let experience_level = request
            .experience_level
            .or_else(|| desired_role.as_deref().and_then(ExperienceLevel::infer))
            .or_else(|| ExperienceLevel::infer(&request.raw_resume_text))
            .unwrap_or(ExperienceLevel::Mid);

        Self {
            normalized_keywords: keywords,
            desired_role,
            country,
            city_or_region,
            experience_level,
            prefers_entry_level: experience_level.is_entry_level(),
            seniority_terms: experience_level
                .seniority_terms()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            used_generic_seeds,
        }
    }

    /// The first `n` keywords, used to bound provider fan-out.
    pub fn seed_keywords(&self, n: usize) -> Vec<String> {
        self.normalized_keywords.iter().take(n).cloned().collect()
    }
}

/// Connectives dropped from role titles ("Analista de Datos").
const ROLE_STOPWORDS: &[&str] = &[
    "a", "an", "and", "the", "of", "for", "in", "at", "to", "or", "de", "del", "la", "las", "el",
    "los", "en", "y", "e", "o", "con", "para",
];

/// Normalized words of a role title, minus connectives and one-letter tokens.
pub fn role_tokens(role: &str) -> Vec<String> {
    word_text(role)
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2 && !ROLE_STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
