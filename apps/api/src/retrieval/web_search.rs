//! Scrape-based provider: DuckDuckGo HTML results restricted to known job
//! boards with `site:` queries, one request per seed × board.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::matching::geo::CountryEntry;
use crate::matching::normalize::normalize;
use crate::matching::recency::parse_published;
use crate::matching::skills::{extract_skills_ordered, Vocabulary};
use crate::models::job::CandidateRecord;
use crate::retrieval::http::fetch_text;
use crate::retrieval::{JobProvider, ProviderError, ProviderQuery, MAX_TAGS};

pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBoard {
    pub name: &'static str,
    pub domain: &'static str,
}

pub const JOB_BOARDS: &[JobBoard] = &[
    JobBoard {
        name: "LinkedIn",
        domain: "linkedin.com",
    },
    JobBoard {
        name: "Indeed",
        domain: "indeed.com",
    },
    JobBoard {
        name: "Computrabajo",
        domain: "computrabajo.com",
    },
    JobBoard {
        name: "Bumeran",
        domain: "bumeran.com",
    },
    JobBoard {
        name: "Glassdoor",
        domain: "glassdoor.com",
    },
];

impl JobBoard {
    /// True for the board's own host and any of its subdomains (`pe.indeed.com`).
    pub fn owns(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            host == self.domain || host.ends_with(&format!(".{}", self.domain))
        })
    }
}

// "Acme hiring Backend Engineer in Lima, Peru"
static HIRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(?:hiring|busca|contrata)\s+(.+?)(?:\s+(?:in|en)\s+(.+))?$")
        .expect("valid hiring regex")
});

// ────────────────────────────────────────────────────────────────────────────
// Provider
// ────────────────────────────────────────────────────────────────────────────

pub struct WebSearchProvider {
    client: Client,
    enabled: bool,
    endpoint: String,
    boards: &'static [JobBoard],
}

impl WebSearchProvider {
    pub fn new(client: Client, enabled: bool) -> Self {
        Self {
            client,
            enabled,
            endpoint: DUCKDUCKGO_HTML_URL.to_string(),
            boards: JOB_BOARDS,
        }
    }

    /// `site:<board> <seed> [entry-level term] <city or country>`
    fn search_phrase(board: &JobBoard, seed: &str, query: &ProviderQuery) -> String {
        let mut parts = vec![format!("site:{}", board.domain), seed.to_string()];
        if query.experience_level.is_entry_level() {
            if let Some(term) = query.seniority_terms.first() {
                parts.push(term.clone());
            }
        }
        if let Some(place) = query.city_or_region.as_ref().or(query.country.as_ref()) {
            parts.push(place.clone());
        }
        parts.join(" ")
    }

    async fn search_board(
        &self,
        board: &JobBoard,
        seed: &str,
        query: &ProviderQuery,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        let phrase = Self::search_phrase(board, seed, query);
        debug!("Web search: {phrase}");
        let request = self.client.get(&self.endpoint).query(&[("q", phrase.as_str())]);
        let html = fetch_text(request).await?;
        Ok(parse_results(
            &html,
            board,
            query.country.as_deref(),
            query.vocabulary.as_deref(),
            Utc::now(),
        ))
    }
}

#[async_trait]
impl JobProvider for WebSearchProvider {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<CandidateRecord>, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::Unavailable(
                "web search disabled (WEB_SEARCH_ENABLED=false)".to_string(),
            ));
        }

        let searches = query
            .seeds
            .iter()
            .flat_map(|seed| self.boards.iter().map(move |board| (seed, board)))
            .map(|(seed, board)| self.search_board(board, seed, query));
        let settled = join_all(searches).await;

        let mut records = Vec::new();
        let mut first_error = None;
        let mut failures = 0;
        let attempts = settled.len();
        for result in settled {
            match result {
                Ok(found) => records.extend(found),
                Err(e) => {
                    failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if failures > 0 {
            warn!("Web search: {failures}/{attempts} board queries failed");
        }
        // Only a total wipe-out counts as a provider failure.
        match first_error {
            Some(e) if failures == attempts => Err(e),
            _ => Ok(records),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTML parsing
// ────────────────────────────────────────────────────────────────────────────

/// Resolves a result href to the target URL, unwrapping DuckDuckGo's
/// `/l/?uddg=` redirect when present.
pub fn resolve_link(href: &str) -> Option<Url> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href.trim()).ok()?;
    let is_redirect = url
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if !is_redirect {
        return Some(url);
    }
    let target = url.query_pairs().find(|(k, _)| k == "uddg")?.1;
    Url::parse(&target).ok()
}

/// Title, company and location heuristically split out of a result title.
#[derive(Debug, Default, PartialEq)]
pub struct TitleParts {
    pub title: String,
    pub company: String,
    pub location: String,
}

pub fn split_title(raw: &str, board: &JobBoard) -> TitleParts {
    let board_key = normalize(board.name);
    let mut segments: Vec<&str> = raw
        .split(['|', '\u{2013}', '\u{2014}'])
        .flat_map(|s| s.split(" - "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    // Trailing "LinkedIn", "Indeed.com", "Computrabajo Perú", ...
    if segments.len() > 1
        && segments
            .last()
            .is_some_and(|last| normalize(last).contains(&board_key))
    {
        segments.pop();
    }

    if let Some(first) = segments.first() {
        if let Some(caps) = HIRING_RE.captures(first) {
            let location = caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .or_else(|| segments.get(1).map(|s| s.to_string()))
                .unwrap_or_default();
            return TitleParts {
                title: caps[2].trim().to_string(),
                company: caps[1].trim().to_string(),
                location,
            };
        }
    }

    let mut it = segments.into_iter();
    TitleParts {
        title: it.next().unwrap_or_default().to_string(),
        company: it.next().unwrap_or_default().to_string(),
        location: it.collect::<Vec<_>>().join(", "),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a DuckDuckGo HTML result page into records for `board`.
/// Links outside the board's domain are dropped.
pub fn parse_results(
    html: &str,
    board: &JobBoard,
    country: Option<&str>,
    vocabulary: Option<&Vocabulary>,
    now: DateTime<Utc>,
) -> Vec<CandidateRecord> {
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let country_entry = country.and_then(CountryEntry::lookup);

    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let url = resolve_link(link.value().attr("href")?)?;
            if !board.owns(&url) {
                return None;
            }

            let raw_title = element_text(link);
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            let mut parts = split_title(&raw_title, board);
            if parts.title.is_empty() {
                return None;
            }

            let context = format!("{raw_title} {snippet}");
            if parts.location.is_empty() {
                if let Some(entry) = country_entry {
                    parts.location = match entry.find_city(&context) {
                        Some(city) => city.to_string(),
                        None if entry.matches(&context) => entry.name.to_string(),
                        None => String::new(),
                    };
                }
            }

            let tags = extract_skills_ordered(&context, vocabulary, MAX_TAGS);
            Some(
                CandidateRecord::new(parts.title, parts.company, parts.location, board.name, url)
                    .with_tags(tags)
                    .with_published_at(parse_published(&snippet, now))
                    .with_snippet(snippet),
            )
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profile::{ExperienceLevel, MatchRequest, QueryProfile};
    use chrono::TimeZone;

    const LINKEDIN: JobBoard = JobBoard {
        name: "LinkedIn",
        domain: "linkedin.com",
    };
    const COMPUTRABAJO: JobBoard = JobBoard {
        name: "Computrabajo",
        domain: "computrabajo.com",
    };

    const FIXTURE: &str = r#"
    <html><body>
      <div class="result results_links">
        <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fpe.linkedin.com%2Fjobs%2Fview%2F123%3FrefId%3Dabc&rut=x">Acme hiring React Developer in Lima, Peru | LinkedIn</a></h2>
        <a class="result__snippet">Posted 2 days ago. React, Node and TypeScript for our fintech team.</a>
      </div>
      <div class="result results_links">
        <h2><a class="result__a" href="https://www.linkedin.com/jobs/view/456">Backend Engineer - Globex - LinkedIn</a></h2>
        <a class="result__snippet">Python and Django. Arequipa.</a>
      </div>
      <div class="result results_links">
        <h2><a class="result__a" href="https://spam.example.com/jobs/1">React Developer Lima</a></h2>
        <a class="result__snippet">Not a job board.</a>
      </div>
      <div class="result results_links">
        <h2><span>no link here</span></h2>
      </div>
    </body></html>
    "#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_results_filters_to_board_and_maps_fields() {
        let records = parse_results(FIXTURE, &LINKEDIN, Some("Peru"), None, now());
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "React Developer");
        assert_eq!(first.organization, "Acme");
        assert_eq!(first.location, "Lima, Peru");
        assert_eq!(first.source_provider, "LinkedIn");
        assert_eq!(first.canonical_url, "https://pe.linkedin.com/jobs/view/123?refId=abc");
        assert_eq!(first.published_at.timestamp, now().timestamp() - 2 * 86_400);
        assert!(first.tags.contains(&"react".to_string()));
        assert!(first.tags.contains(&"typescript".to_string()));

        let second = &records[1];
        assert_eq!(second.title, "Backend Engineer");
        assert_eq!(second.organization, "Globex");
        assert_eq!(second.location, "arequipa");
        assert!(!second.published_at.is_known());
    }

    #[test]
    fn test_parse_results_tolerates_garbage() {
        assert!(parse_results("<<<not html", &LINKEDIN, None, None, now()).is_empty());
        assert!(parse_results("", &LINKEDIN, Some("Peru"), None, now()).is_empty());
    }

    #[test]
    fn test_resolve_link() {
        let url = resolve_link("//duckduckgo.com/l/?uddg=https%3A%2F%2Fx.com%2Fa&rut=1").unwrap();
        assert_eq!(url.as_str(), "https://x.com/a");
        let url = resolve_link("https://indeed.com/viewjob?jk=1").unwrap();
        assert_eq!(url.host_str(), Some("indeed.com"));
        assert!(resolve_link("//duckduckgo.com/l/?rut=1").is_none());
    }

    #[test]
    fn test_board_owns_subdomains_only() {
        let board = JobBoard {
            name: "Indeed",
            domain: "indeed.com",
        };
        assert!(board.owns(&Url::parse("https://pe.indeed.com/x").unwrap()));
        assert!(board.owns(&Url::parse("https://indeed.com/x").unwrap()));
        assert!(!board.owns(&Url::parse("https://notindeed.com/x").unwrap()));
    }

    #[test]
    fn test_split_title_variants() {
        assert_eq!(
            split_title("Analista de Datos - Banco X - Lima | Computrabajo", &COMPUTRABAJO),
            TitleParts {
                title: "Analista de Datos".to_string(),
                company: "Banco X".to_string(),
                location: "Lima".to_string(),
            }
        );
        assert_eq!(split_title("QA Tester", &COMPUTRABAJO).title, "QA Tester");
        assert_eq!(split_title("", &COMPUTRABAJO), TitleParts::default());
    }

    #[test]
    fn test_search_phrase_adds_entry_level_term_and_place() {
        let profile = QueryProfile::build(
            &MatchRequest {
                raw_resume_text: "python".to_string(),
                country: Some("Peru".to_string()),
                city_or_region: Some("Lima".to_string()),
                experience_level: Some(ExperienceLevel::Intern),
                ..Default::default()
            },
            None,
        );
        let query = ProviderQuery::from_profile(&profile, None);
        assert_eq!(
            WebSearchProvider::search_phrase(&LINKEDIN, "python", &query),
            "site:linkedin.com python practicante Lima"
        );
    }

    #[tokio::test]
    async fn test_disabled_provider_makes_no_request() {
        let provider = WebSearchProvider::new(Client::new(), false);
        let profile = QueryProfile::build(&MatchRequest::default(), None);
        let result = provider.fetch(&ProviderQuery::from_profile(&profile, None)).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }
}
