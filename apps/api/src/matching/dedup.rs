use std::collections::HashSet;

use url::Url;

use crate::matching::normalize::normalize;
use crate::models::job::CandidateRecord;

/// Query parameters that name the posting itself rather than a visit to it
/// (Indeed `viewjob?jk=`, LinkedIn `currentJobId`, Google Jobs `htidocid`).
const JOB_ID_PARAMS: &[&str] = &["jk", "vjk", "job_id", "jobid", "currentjobid", "htidocid"];

/// URL with query string and fragment removed.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// URL with query and fragment removed, except for job-id parameters,
/// which are kept in sorted order.
pub fn key_url(url: &str) -> String {
    let base = strip_query(url);
    let Ok(parsed) = Url::parse(url) else {
        return base.to_string();
    };
    let mut ids: Vec<String> = parsed
        .query_pairs()
        .filter_map(|(k, v)| {
            let k = k.to_ascii_lowercase();
            (!v.is_empty() && JOB_ID_PARAMS.contains(&k.as_str())).then(|| format!("{k}={v}"))
        })
        .collect();
    if ids.is_empty() {
        return base.to_string();
    }
    ids.sort();
    format!("{base}?{}", ids.join("&"))
}

/// Uniqueness key: `normalize(provider | url-without-query)`, with job-id
/// parameters kept (see [`key_url`]).
///
/// Placeholders are search links whose identity is the query itself, so they
/// key on the full URL.
pub fn dedupe_key(record: &CandidateRecord) -> String {
    let url = record.canonical_url.trim();
    let url = if record.placeholder {
        url.to_string()
    } else {
        key_url(url)
    };
    normalize(&format!("{}|{}", record.source_provider, url))
}

/// Collapses duplicates, first seen wins. Records without a URL are dropped.
///
/// Order is preserved; ranking re-sorts afterwards, so insertion order does
/// not bias the final rank.
pub fn dedupe(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| !r.canonical_url.trim().is_empty())
        .filter(|r| seen.insert(dedupe_key(r)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(provider: &str, url: &str, title: &str) -> CandidateRecord {
        CandidateRecord::new(title, "Acme", "Lima", provider, url)
    }

    #[test]
    fn test_query_string_variants_collapse() {
        let records = vec![
            record("Indeed", "https://x/job?ref=1", "first"),
            record("Indeed", "https://x/job?ref=2", "second"),
        ];
        let out = dedupe(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "first");
    }

    #[test]
    fn test_different_providers_do_not_collapse() {
        let records = vec![
            record("Indeed", "https://x/job", "a"),
            record("LinkedIn", "https://x/job", "b"),
        ];
        assert_eq!(dedupe(records).len(), 2);
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let a = record("INDEED", "https://X/Job#top", "a");
        let b = record("indeed", "https://x/job", "b");
        assert_eq!(dedupe_key(&a), dedupe_key(&b));
    }

    #[test]
    fn test_records_without_url_are_dropped() {
        let records = vec![record("Indeed", "", "a"), record("Indeed", "  ", "b")];
        assert!(dedupe(records).is_empty());
    }

    #[test]
    fn test_dedupe_is_idempotent_and_never_grows() {
        let records = vec![
            record("Indeed", "https://x/1?a=1", "a"),
            record("Indeed", "https://x/1?a=2", "b"),
            record("Indeed", "https://x/2", "c"),
            record("Adzuna", "https://x/2", "d"),
            record("Adzuna", "", "e"),
        ];
        let input_len = records.len();
        let once = dedupe(records);
        assert!(once.len() <= input_len);
        let keys_once: Vec<String> = once.iter().map(dedupe_key).collect();
        let twice = dedupe(once);
        let keys_twice: Vec<String> = twice.iter().map(dedupe_key).collect();
        assert_eq!(keys_once, keys_twice);
    }

    #[test]
    fn test_placeholders_key_on_full_url() {
        let search = "https://duckduckgo.com/?q=site%3A";
        let mut a = record("fallback", &format!("{search}indeed.com+python"), "a");
        let mut b = record("fallback", &format!("{search}linkedin.com+python"), "b");
        a.placeholder = true;
        b.placeholder = true;
        let dup = a.clone();
        assert_eq!(dedupe(vec![a, b, dup]).len(), 2);
    }

    #[test]
    fn test_job_id_params_keep_postings_apart() {
        let records = vec![
            record("Indeed", "https://pe.indeed.com/viewjob?jk=111&from=serp", "a"),
            record("Indeed", "https://pe.indeed.com/viewjob?jk=222", "b"),
            record("Indeed", "https://pe.indeed.com/viewjob?from=mail&jk=111", "c"),
        ];
        let out = dedupe(records);
        let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_key_url() {
        assert_eq!(key_url("https://a/b?ref=1#x"), "https://a/b");
        assert_eq!(
            key_url("https://www.google.com/search?q=dev&htidocid=XyZ"),
            "https://www.google.com/search?htidocid=XyZ"
        );
        assert_eq!(key_url("not a url?x=1"), "not a url");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a/b?c=d#e"), "https://a/b");
        assert_eq!(strip_query("https://a/b#e"), "https://a/b");
        assert_eq!(strip_query("https://a/b"), "https://a/b");
    }
}
