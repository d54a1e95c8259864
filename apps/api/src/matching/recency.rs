//! Publication-time parsing from snippets and the age helpers ranking needs.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::matching::normalize::normalize;
use crate::models::job::PublishedAt;

// "5 hours ago" or "hace 5 horas". A bare "40 hours" is a schedule, not an age.
static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3})\s*hours?\s+ago\b|\bhace\s+(?:mas de\s+)?(\d{1,3})\s*horas?\b")
        .expect("valid hours regex")
});
static DAYS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3})\s*days?\s+ago\b|\bhace\s+(?:mas de\s+)?(\d{1,3})\s*dias?\b")
        .expect("valid days regex")
});
static WEEKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*weeks?\s+ago\b|\bhace\s+(?:mas de\s+)?(\d{1,2})\s*semanas?\b")
        .expect("valid weeks regex")
});
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid date regex"));

/// Extracts a publication time from free text.
///
/// Priority: hours, days, weeks ago (`N units ago` / `hace N unidades`),
/// then an ISO `YYYY-MM-DD` date.
/// Anything else is unknown (`timestamp == 0`).
pub fn parse_published(text: &str, now: DateTime<Utc>) -> PublishedAt {
    let text = normalize(text);

    if let Some(n) = first_number(&HOURS_RE, &text) {
        return relative(now, Duration::hours(n), format!("Hace {n} horas"));
    }
    if let Some(n) = first_number(&DAYS_RE, &text) {
        return relative(now, Duration::days(n), format!("Hace {n} días"));
    }
    if let Some(n) = first_number(&WEEKS_RE, &text) {
        return relative(now, Duration::weeks(n), format!("Hace {n} semanas"));
    }
    if let Some(published) = parse_iso_date(&text) {
        return published;
    }
    PublishedAt::unknown()
}

/// Parses an RFC 3339 timestamp, falling back to snippet parsing.
pub fn parse_timestamp_str(value: &str, now: DateTime<Utc>) -> PublishedAt {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(dt) => from_datetime(dt.with_timezone(&Utc)),
        Err(_) => parse_published(value, now),
    }
}

/// Builds a `PublishedAt` from unix seconds. Non-positive values are unknown.
pub fn from_unix_seconds(seconds: i64) -> PublishedAt {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(dt) if seconds > 0 => from_datetime(dt),
        _ => PublishedAt::unknown(),
    }
}

fn from_datetime(dt: DateTime<Utc>) -> PublishedAt {
    if dt.timestamp() <= 0 {
        return PublishedAt::unknown();
    }
    PublishedAt {
        timestamp: dt.timestamp(),
        label: dt.format("%Y-%m-%d").to_string(),
    }
}

/// Age in hours, `None` when the publication time is unknown.
/// Future timestamps count as age zero.
pub fn age_hours(published: &PublishedAt, now: DateTime<Utc>) -> Option<f64> {
    if !published.is_known() {
        return None;
    }
    let secs = (now.timestamp() - published.timestamp).max(0);
    Some(secs as f64 / 3600.0)
}

/// The number from whichever alternative (English or Spanish) matched.
fn first_number(re: &Regex, text: &str) -> Option<i64> {
    let caps = re.captures(text)?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}

fn relative(now: DateTime<Utc>, ago: Duration, label: String) -> PublishedAt {
    PublishedAt {
        timestamp: (now - ago).timestamp(),
        label,
    }
}

fn parse_iso_date(text: &str) -> Option<PublishedAt> {
    let caps = ISO_DATE_RE.captures(text)?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(PublishedAt {
        timestamp: dt.timestamp(),
        label: date.format("%Y-%m-%d").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_hours_ago() {
        let p = parse_published("Posted 5 hours ago", now());
        assert_eq!(p.timestamp, now().timestamp() - 5 * 3600);
        assert_eq!(p.label, "Hace 5 horas");
    }

    #[test]
    fn test_spanish_days() {
        let p = parse_published("Publicado hace 3 días · Lima", now());
        assert_eq!(p.timestamp, now().timestamp() - 3 * 86_400);
    }

    #[test]
    fn test_weeks() {
        let p = parse_published("hace 2 semanas", now());
        assert_eq!(p.timestamp, now().timestamp() - 14 * 86_400);
    }

    #[test]
    fn test_hours_take_priority_over_days() {
        let p = parse_published("3 days ago ... updated 2 hours ago", now());
        assert_eq!(p.timestamp, now().timestamp() - 2 * 3600);
    }

    #[test]
    fn test_iso_date() {
        let p = parse_published("Fecha: 2025-03-01", now());
        assert_eq!(p.label, "2025-03-01");
        assert_eq!(
            p.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn test_invalid_iso_date_is_unknown() {
        assert!(!parse_published("2025-13-45", now()).is_known());
    }

    #[test]
    fn test_hace_mas_de() {
        let p = parse_published("Hace más de 30 días", now());
        assert_eq!(p.timestamp, now().timestamp() - 30 * 86_400);
    }

    #[test]
    fn test_schedules_are_not_ages() {
        for text in [
            "Full-time, 40 hours per week.",
            "Jornada de 48 horas semanales",
            "Trabajo 5 días a la semana",
            "Contrato por 12 semanas",
            "2 days a week on site",
        ] {
            assert!(!parse_published(text, now()).is_known(), "{text:?}");
        }
    }

    #[test]
    fn test_unmatched_text_is_unknown() {
        let p = parse_published("Great company, apply now", now());
        assert_eq!(p.timestamp, 0);
        assert_eq!(p.label, "Sin fecha");
    }

    #[test]
    fn test_rfc3339_and_fallback() {
        let p = parse_timestamp_str("2025-03-09T12:00:00Z", now());
        assert_eq!(age_hours(&p, now()), Some(24.0));
        let p = parse_timestamp_str("hace 1 día", now());
        assert_eq!(age_hours(&p, now()), Some(24.0));
    }

    #[test]
    fn test_unix_seconds() {
        assert!(!from_unix_seconds(0).is_known());
        assert!(!from_unix_seconds(-5).is_known());
        let p = from_unix_seconds(now().timestamp());
        assert_eq!(age_hours(&p, now()), Some(0.0));
    }

    #[test]
    fn test_age_unknown_and_future() {
        assert_eq!(age_hours(&PublishedAt::unknown(), now()), None);
        let future = PublishedAt {
            timestamp: now().timestamp() + 3600,
            label: String::new(),
        };
        assert_eq!(age_hours(&future, now()), Some(0.0));
    }
}
