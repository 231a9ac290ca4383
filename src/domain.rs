//! Domain age lookup over RDAP.
//!
//! Resolves the parent domain of a URL, asks the registry responsible for its
//! top-level label when the domain was registered, and turns the answer into
//! a display string. Lookups never fail: every problem degrades to a sentinel.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Sentinel shown when no registry endpoint is known for the TLD
pub const UNSUPPORTED_TLD: &str = "unsupported TLD";
/// Sentinel shown when the registry answers with a non-success status
pub const NOT_FOUND: &str = "not found";
/// Sentinel shown when the registry record has no usable registration event
pub const NO_DATA: &str = "no data";
/// Sentinel shown when the lookup itself failed
pub const LOOKUP_ERROR: &str = "error";

/// Whole years since registration, or unknown for any sentinel result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Years {
    Known(i32),
    Unknown,
}

impl fmt::Display for Years {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Years::Known(years) => write!(f, "{}", years),
            Years::Unknown => f.write_str("unknown"),
        }
    }
}

/// Result of one domain age lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAge {
    /// Registrable parent domain the lookup was made for
    pub parent_domain: String,
    /// Human-readable age ("12y 3m") or a sentinel
    pub display: String,
    pub years: Years,
}

impl DomainAge {
    fn sentinel(parent_domain: &str, display: &str) -> Self {
        Self {
            parent_domain: parent_domain.to_string(),
            display: display.to_string(),
            years: Years::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    events: Option<Vec<RdapEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    #[serde(default)]
    event_action: String,
    #[serde(default)]
    event_date: Option<String>,
}

/// Derive the parent domain: drop a leading `www.` and keep the last two labels.
///
/// Multi-part public suffixes are not recognised, so `www.sub.example.co.uk`
/// yields `co.uk`.
pub fn get_parent_domain(hostname: &str) -> String {
    let host = hostname.strip_prefix("www.").unwrap_or(hostname);
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// Years and months elapsed between registration and `now`
pub fn calculate_domain_age(created: DateTime<Utc>, now: DateTime<Utc>) -> (i32, u32) {
    let mut years = now.year() - created.year();
    let mut months = now.month() as i32 - created.month() as i32;
    if months < 0 {
        years -= 1;
        months += 12;
    }
    (years, months as u32)
}

fn parse_event_date(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return Some(parsed.with_timezone(&Utc));
    }
    let day = date.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Looks up registration dates through per-TLD RDAP endpoints
#[derive(Debug, Clone)]
pub struct DomainAgeResolver {
    client: Client,
    endpoints: BTreeMap<String, String>,
}

impl DomainAgeResolver {
    pub fn new(client: Client, endpoints: BTreeMap<String, String>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|(tld, url)| (tld.to_lowercase(), url))
            .collect();
        Self { client, endpoints }
    }

    /// Registry endpoint for a parent domain's top-level label
    fn endpoint_for(&self, parent_domain: &str) -> Option<&str> {
        let tld = parent_domain.rsplit('.').next()?.to_lowercase();
        self.endpoints.get(&tld).map(String::as_str)
    }

    /// Resolve the age of the domain behind `url`
    pub async fn resolve(&self, url: &str) -> DomainAge {
        self.resolve_at(url, Utc::now()).await
    }

    /// Resolve against a fixed clock
    pub async fn resolve_at(&self, url: &str, now: DateTime<Utc>) -> DomainAge {
        let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(host) => host,
            None => {
                log::warn!("Cannot derive a host from {}", url);
                return DomainAge::sentinel("", LOOKUP_ERROR);
            }
        };
        let parent_domain = get_parent_domain(&host);

        let Some(endpoint) = self.endpoint_for(&parent_domain) else {
            log::debug!("No RDAP endpoint for {}", parent_domain);
            return DomainAge::sentinel(&parent_domain, UNSUPPORTED_TLD);
        };

        let lookup_url = format!("{}{}", endpoint, parent_domain);
        log::debug!("RDAP lookup: {}", lookup_url);

        let response = match self.client.get(&lookup_url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("RDAP lookup for {} failed: {}", parent_domain, e);
                return DomainAge::sentinel(&parent_domain, LOOKUP_ERROR);
            }
        };
        if !response.status().is_success() {
            log::warn!(
                "RDAP lookup for {} returned {}",
                parent_domain,
                response.status()
            );
            return DomainAge::sentinel(&parent_domain, NOT_FOUND);
        }

        let record: RdapDomain = match response.json().await {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Unreadable RDAP answer for {}: {}", parent_domain, e);
                return DomainAge::sentinel(&parent_domain, LOOKUP_ERROR);
            }
        };

        let events = record.events.unwrap_or_default();
        let dated = |action: &str| {
            events
                .iter()
                .filter(|e| e.event_action == action)
                .find_map(|e| e.event_date.as_deref().and_then(parse_event_date))
        };

        let Some(created) = dated("registration").or_else(|| dated("created")) else {
            return DomainAge::sentinel(&parent_domain, NO_DATA);
        };

        let (years, months) = calculate_domain_age(created, now);
        DomainAge {
            parent_domain,
            display: format!("{}y {}m", years, months),
            years: Years::Known(years),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parent_domain_keeps_last_two_labels() {
        assert_eq!(get_parent_domain("www.example.com"), "example.com");
        assert_eq!(get_parent_domain("login.accounts.example.org"), "example.org");
        assert_eq!(get_parent_domain("www.sub.example.co.uk"), "co.uk");
        assert_eq!(get_parent_domain("localhost"), "localhost");
    }

    #[test]
    fn only_leading_www_is_stripped() {
        assert_eq!(get_parent_domain("www.com"), "www.com");
        assert_eq!(get_parent_domain("wwwx.example.net"), "example.net");
    }

    #[test]
    fn age_without_borrow() {
        assert_eq!(calculate_domain_age(date(2010, 3, 1), date(2024, 8, 15)), (14, 5));
        assert_eq!(calculate_domain_age(date(2024, 8, 1), date(2024, 8, 30)), (0, 0));
    }

    #[test]
    fn age_borrows_a_year_when_month_is_later() {
        // Registration in November, now in February
        let (years, months) = calculate_domain_age(date(2015, 11, 20), date(2024, 2, 1));
        assert_eq!(years, 2024 - 2015 - 1);
        assert_eq!(months, 12 + 2 - 11);
    }

    #[test]
    fn event_dates_accept_rfc3339_and_plain_dates() {
        assert_eq!(
            parse_event_date("1997-09-15T04:00:00Z"),
            Some(date(1997, 9, 15) + chrono::Duration::hours(4))
        );
        assert_eq!(parse_event_date("2001-02-03"), Some(date(2001, 2, 3)));
        assert_eq!(parse_event_date("yesterday"), None);
    }

    #[test]
    fn years_display_unknown() {
        assert_eq!(Years::Unknown.to_string(), "unknown");
        assert_eq!(Years::Known(7).to_string(), "7");
    }

    #[tokio::test]
    async fn unsupported_tld_short_circuits() {
        let resolver = DomainAgeResolver::new(Client::new(), BTreeMap::new());
        let age = resolver.resolve("https://www.example.io/page").await;
        assert_eq!(age.parent_domain, "example.io");
        assert_eq!(age.display, UNSUPPORTED_TLD);
        assert_eq!(age.years, Years::Unknown);
    }

    #[tokio::test]
    async fn unparseable_url_is_an_error_sentinel() {
        let resolver = DomainAgeResolver::new(Client::new(), BTreeMap::new());
        let age = resolver.resolve("not a url").await;
        assert_eq!(age.display, LOOKUP_ERROR);
        assert_eq!(age.years, Years::Unknown);
    }
}
