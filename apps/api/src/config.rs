use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Where learned feedback weights are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackBackend {
    Json { path: PathBuf },
    Postgres { database_url: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub feedback_backend: FeedbackBackend,
    pub jsearch_api_key: Option<String>,
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub web_search_enabled: bool,
    /// Per-provider timeout in seconds, clamped to 15..=25.
    pub provider_timeout_secs: u64,
    /// Ranked list bound, clamped to 150..=250.
    pub ranking_top_k: usize,
    pub skill_vocabulary_path: Option<PathBuf>,
    pub cases_path: Option<PathBuf>,
}

pub const DEFAULT_FEEDBACK_JSON_PATH: &str = "data/search_memory.json";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let feedback_backend = match optional_env("FEEDBACK_BACKEND")
            .unwrap_or_else(|| "json".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => FeedbackBackend::Json {
                path: optional_env("FEEDBACK_JSON_PATH")
                    .unwrap_or_else(|| DEFAULT_FEEDBACK_JSON_PATH.to_string())
                    .into(),
            },
            "postgres" => FeedbackBackend::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
            other => bail!("FEEDBACK_BACKEND must be 'json' or 'postgres', got '{other}'"),
        };

        Ok(Config {
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            feedback_backend,
            jsearch_api_key: optional_env("JSEARCH_API_KEY"),
            adzuna_app_id: optional_env("ADZUNA_APP_ID"),
            adzuna_app_key: optional_env("ADZUNA_APP_KEY"),
            web_search_enabled: parse_env("WEB_SEARCH_ENABLED", true)
                .context("WEB_SEARCH_ENABLED must be true or false")?,
            provider_timeout_secs: parse_env::<u64>("PROVIDER_TIMEOUT_SECS", 20)
                .context("PROVIDER_TIMEOUT_SECS must be an integer")?
                .clamp(15, 25),
            ranking_top_k: parse_env::<usize>("RANKING_TOP_K", 200)
                .context("RANKING_TOP_K must be an integer")?
                .clamp(150, 250),
            skill_vocabulary_path: optional_env("SKILL_VOCABULARY_PATH").map(PathBuf::from),
            cases_path: optional_env("CASES_PATH").map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Set and non-blank, else `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the process environment is shared.

    #[test]
    fn test_parse_env_default_and_value() {
        assert_eq!(parse_env::<u64>("JOBMATCH_TEST_UNSET", 20).unwrap(), 20);
        std::env::set_var("JOBMATCH_TEST_TIMEOUT", "17");
        assert_eq!(parse_env::<u64>("JOBMATCH_TEST_TIMEOUT", 20).unwrap(), 17);
        std::env::set_var("JOBMATCH_TEST_BAD", "soon");
        assert!(parse_env::<u64>("JOBMATCH_TEST_BAD", 20).is_err());
    }

    #[test]
    fn test_optional_env_treats_blank_as_unset() {
        std::env::set_var("JOBMATCH_TEST_BLANK", "   ");
        assert_eq!(optional_env("JOBMATCH_TEST_BLANK"), None);
        assert!(require_env("JOBMATCH_TEST_MISSING").is_err());
    }
}
