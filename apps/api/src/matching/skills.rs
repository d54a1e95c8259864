//! Skill extraction: finds known technology terms in free text.
//!
//! Matching is substring-based over normalized text, against a built-in
//! lexicon plus an optional vocabulary loaded from import data.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::matching::normalize::normalize;

/// Upper bound on extracted skills per document.
pub const MAX_EXTRACTED_SKILLS: usize = 40;

/// Vocabulary entries shorter than this (in normalized chars) are ignored.
const MIN_TERM_CHARS: usize = 2;

/// Built-in technology lexicon. Entries are already normalized.
pub const BUILTIN_LEXICON: &[&str] = &[
    // languages
    "python",
    "java",
    "javascript",
    "typescript",
    "c#",
    "c++",
    "golang",
    "rust",
    "kotlin",
    "swift",
    "php",
    "ruby",
    "scala",
    "sql",
    // frontend
    "html",
    "css",
    "react",
    "angular",
    "vue",
    "next.js",
    "tailwind",
    "redux",
    // backend
    "node",
    "express.js",
    "django",
    "flask",
    "fastapi",
    "spring",
    ".net",
    "laravel",
    "graphql",
    "rest api",
    // data
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "elasticsearch",
    "power bi",
    "microsoft excel",
    "tableau",
    "pandas",
    "spark",
    "machine learning",
    "tensorflow",
    "pytorch",
    // platforms and tools
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "linux",
    "github",
    "gitlab",
    "jenkins",
    "ci/cd",
    "figma",
    "scrum",
    "jira",
];

/// Externally supplied skill vocabulary (from training/import data).
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary, normalizing and de-duplicating terms and
    /// dropping ones shorter than two characters.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for term in terms {
            let term = normalize(term.as_ref());
            if term.chars().count() < MIN_TERM_CHARS {
                continue;
            }
            if seen.insert(term.clone()) {
                out.push(term);
            }
        }
        Self { terms: out }
    }

    /// Loads a vocabulary file: either a JSON array of strings or one term per line.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read skill vocabulary: {}", path.display()))?;

        let vocabulary = match serde_json::from_str::<Vec<String>>(&content) {
            Ok(terms) => Self::from_terms(terms),
            Err(_) => Self::from_terms(content.lines()),
        };

        info!(
            "Loaded {} vocabulary terms from {}",
            vocabulary.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Extracts known skills from `text`.
///
/// Built-in lexicon hits come first, then vocabulary hits; the union is
/// de-duplicated and capped at [`MAX_EXTRACTED_SKILLS`].
pub fn extract_skills(text: &str, vocabulary: Option<&Vocabulary>) -> BTreeSet<String> {
    extract_skills_ordered(text, vocabulary, MAX_EXTRACTED_SKILLS)
        .into_iter()
        .collect()
}

/// Same as [`extract_skills`] but keeps discovery order and a custom cap.
/// Used for record tags, where the first few hits are the most telling.
pub fn extract_skills_ordered(
    text: &str,
    vocabulary: Option<&Vocabulary>,
    cap: usize,
) -> Vec<String> {
    let haystack = normalize(text);
    if haystack.is_empty() {
        return Vec::new();
    }

    let builtin = BUILTIN_LEXICON.iter().copied();
    let extra = vocabulary
        .into_iter()
        .flat_map(|v| v.terms.iter().map(String::as_str));

    let mut seen = BTreeSet::new();
    let mut found = Vec::new();
    for term in builtin.chain(extra) {
        if found.len() >= cap {
            break;
        }
        if haystack.contains(term) && seen.insert(term) {
            found.push(term.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_builtin_terms() {
        let skills = extract_skills("Senior React + Node developer, AWS and Docker", None);
        assert!(skills.contains("react"));
        assert!(skills.contains("node"));
        assert!(skills.contains("aws"));
        assert!(skills.contains("docker"));
        assert!(!skills.contains("python"));
    }

    #[test]
    fn test_matching_ignores_case_and_accents() {
        let skills = extract_skills("Experiencia en PYTHON y Machine Learning", None);
        assert!(skills.contains("python"));
        assert!(skills.contains("machine learning"));
    }

    #[test]
    fn test_empty_text_yields_empty_set() {
        assert!(extract_skills("", None).is_empty());
        assert!(extract_skills("   ", None).is_empty());
    }

    #[test]
    fn test_vocabulary_augments_builtin() {
        let vocab = Vocabulary::from_terms(["SAP", "Salesforce", "x", " "]);
        assert_eq!(vocab.len(), 2);
        let skills = extract_skills("Consultor SAP con SQL y Salesforce", Some(&vocab));
        assert!(skills.contains("sap"));
        assert!(skills.contains("salesforce"));
        assert!(skills.contains("sql"));
    }

    #[test]
    fn test_single_char_vocabulary_terms_are_ignored() {
        let vocab = Vocabulary::from_terms(["r", "C"]);
        assert!(vocab.is_empty());
        assert!(extract_skills("r c r c", Some(&vocab)).is_empty());
    }

    #[test]
    fn test_vocabulary_duplicates_of_builtin_are_unioned() {
        let vocab = Vocabulary::from_terms(["Python", "python"]);
        assert_eq!(vocab.len(), 1);
        let skills = extract_skills("python", Some(&vocab));
        assert_eq!(skills.len(), 1);
    }

    #[test]
    fn test_result_is_capped() {
        let terms: Vec<String> = (0..100).map(|i| format!("skill{i:03}")).collect();
        let text = terms.join(" ");
        let vocab = Vocabulary::from_terms(&terms);
        let skills = extract_skills(&text, Some(&vocab));
        assert_eq!(skills.len(), MAX_EXTRACTED_SKILLS);
    }

    #[test]
    fn test_ordered_extraction_respects_cap() {
        let tags = extract_skills_ordered("python java sql docker aws", None, 2);
        assert_eq!(tags, vec!["python".to_string(), "java".to_string()]);
    }

    #[tokio::test]
    async fn test_load_json_and_line_vocabularies() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("vocab.json");
        tokio::fs::write(&json_path, r#"["Snowflake", "dbt", "a"]"#)
            .await
            .unwrap();
        let vocab = Vocabulary::load(&json_path).await.unwrap();
        assert_eq!(vocab.len(), 2);
        let skills = extract_skills("Snowflake + dbt pipelines", Some(&vocab));
        assert!(skills.contains("snowflake") && skills.contains("dbt"));

        let txt_path = dir.path().join("vocab.txt");
        tokio::fs::write(&txt_path, "Airflow\n\nLooker\n").await.unwrap();
        let vocab = Vocabulary::load(&txt_path).await.unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(extract_skills("Looker dashboards", Some(&vocab)).contains("looker"));
    }
}
