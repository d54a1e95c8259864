use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::matching::normalize::normalize;
use crate::models::job::CandidateRecord;

/// How many top genuine postings feed the demand counts.
pub const GAP_WINDOW: usize = 20;

/// A skill the market asks for that the candidate does not list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGap {
    pub skill: String,
    /// Number of considered postings tagged with the skill.
    pub demand: usize,
    /// `demand / records_considered`, in `[0, 1]`.
    pub demand_share: f64,
}

/// Counts, across the top ranked genuine postings, the tags the candidate
/// lacks. Sorted by demand descending, then name.
pub fn compute_skill_gaps(
    profile_skills: &[String],
    ranked_records: &[CandidateRecord],
    limit: usize,
) -> Vec<SkillGap> {
    let owned: HashSet<String> = profile_skills.iter().map(|s| normalize(s)).collect();

    let considered: Vec<&CandidateRecord> = ranked_records
        .iter()
        .filter(|r| !r.placeholder)
        .take(GAP_WINDOW)
        .collect();
    if considered.is_empty() {
        return Vec::new();
    }

    let mut demand: BTreeMap<String, usize> = BTreeMap::new();
    for record in &considered {
        let tags: HashSet<String> = record.tags.iter().map(|t| normalize(t)).collect();
        for tag in tags {
            if !tag.is_empty() && !owned.contains(&tag) {
                *demand.entry(tag).or_default() += 1;
            }
        }
    }

    let total = considered.len() as f64;
    let mut gaps: Vec<SkillGap> = demand
        .into_iter()
        .map(|(skill, count)| SkillGap {
            skill,
            demand: count,
            demand_share: count as f64 / total,
        })
        .collect();

    // BTreeMap iteration already orders by name; a stable sort keeps it as the tie-break.
    gaps.sort_by(|a, b| b.demand.cmp(&a.demand));
    gaps.truncate(limit);
    gaps
}
