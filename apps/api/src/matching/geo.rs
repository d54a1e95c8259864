//! Country / city alias table and the geographic filter built on it.

use serde::Serialize;

use crate::matching::normalize::{contains_word, normalize, word_text};
use crate::models::job::CandidateRecord;

/// One supported market. All strings are normalized.
#[derive(Debug, Clone, Serialize)]
pub struct CountryEntry {
    pub name: &'static str,
    pub iso: &'static str,
    /// Words that identify the country in free text (name variants, safe codes).
    pub aliases: &'static [&'static str],
    pub cities: &'static [&'static str],
    /// Adzuna market code, when the API covers the country.
    pub adzuna_market: Option<&'static str>,
}

pub const COUNTRIES: &[CountryEntry] = &[
    CountryEntry {
        name: "peru",
        iso: "pe",
        aliases: &["peru", "peruvian", "peruano"],
        cities: &["lima", "arequipa", "trujillo", "cusco", "chiclayo", "piura", "callao"],
        adzuna_market: None,
    },
    CountryEntry {
        name: "mexico",
        iso: "mx",
        aliases: &["mexico", "mexicano", "mex"],
        cities: &[
            "ciudad de mexico",
            "cdmx",
            "guadalajara",
            "monterrey",
            "puebla",
            "queretaro",
        ],
        adzuna_market: Some("mx"),
    },
    CountryEntry {
        name: "colombia",
        iso: "co",
        aliases: &["colombia", "colombiano"],
        cities: &["bogota", "medellin", "cali", "barranquilla", "cartagena"],
        adzuna_market: None,
    },
    CountryEntry {
        name: "chile",
        iso: "cl",
        aliases: &["chile", "chileno"],
        cities: &["santiago", "valparaiso", "concepcion", "vina del mar"],
        adzuna_market: None,
    },
    CountryEntry {
        name: "argentina",
        iso: "ar",
        aliases: &["argentina", "argentino"],
        cities: &["buenos aires", "caba", "cordoba", "rosario", "mendoza"],
        adzuna_market: None,
    },
    CountryEntry {
        name: "spain",
        iso: "es",
        aliases: &["spain", "espana", "espanol"],
        cities: &["madrid", "barcelona", "valencia", "sevilla", "bilbao", "malaga"],
        adzuna_market: Some("es"),
    },
    CountryEntry {
        name: "united states",
        iso: "us",
        aliases: &["united states", "usa", "eeuu", "estados unidos"],
        cities: &[
            "new york",
            "san francisco",
            "austin",
            "seattle",
            "chicago",
            "boston",
        ],
        adzuna_market: Some("us"),
    },
];

impl CountryEntry {
    /// Finds a country by normalized name, alias or ISO code.
    pub fn lookup(country: &str) -> Option<&'static CountryEntry> {
        let key = normalize(country);
        if key.is_empty() {
            return None;
        }
        COUNTRIES
            .iter()
            .find(|c| c.name == key || c.iso == key || c.aliases.iter().any(|a| *a == key))
    }

    /// Every token that places a text inside this country.
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> {
        self.aliases.iter().chain(self.cities.iter()).copied()
    }

    pub fn matches(&self, text: &str) -> bool {
        let padded = word_text(text);
        self.tokens().any(|t| contains_word(&padded, t))
    }

    /// First known city of this country mentioned in `text`.
    pub fn find_city(&self, text: &str) -> Option<&'static str> {
        let padded = word_text(text);
        self.cities.iter().copied().find(|c| contains_word(&padded, c))
    }
}

/// Country token set for a free-form country name; empty when unknown.
pub fn country_tokens(country: &str) -> Vec<&'static str> {
    CountryEntry::lookup(country)
        .map(|c| c.tokens().collect())
        .unwrap_or_default()
}

pub fn matches_country(text: &str, country: &str) -> bool {
    let padded = word_text(text);
    country_tokens(country)
        .iter()
        .any(|t| contains_word(&padded, t))
}

/// True when the requested city appears in `text`. Without a requested city,
/// any known city of the country counts.
pub fn matches_city(text: &str, country: &str, city: Option<&str>) -> bool {
    let padded = word_text(text);
    match city.map(normalize).filter(|c| !c.is_empty()) {
        Some(city) => contains_word(&padded, &city),
        None => CountryEntry::lookup(country)
            .is_some_and(|c| c.cities.iter().any(|city| contains_word(&padded, city))),
    }
}

/// Keeps records located in `country`. Placeholders always pass.
///
/// If the filter would drop every genuine record it is skipped: an
/// over-inclusive list beats an empty one.
pub fn geo_filter(records: Vec<CandidateRecord>, country: Option<&str>) -> Vec<CandidateRecord> {
    let Some(entry) = country.and_then(CountryEntry::lookup) else {
        return records;
    };

    let genuine_kept = records
        .iter()
        .filter(|r| !r.placeholder && entry.matches(&r.match_text()))
        .count();
    if genuine_kept == 0 {
        return records;
    }

    records
        .into_iter()
        .filter(|r| r.placeholder || entry.matches(&r.match_text()))
        .collect()
}
