//! Heuristic page analysis.
//!
//! Pure functions over the page URL and its links. None of them fail: a URL
//! that does not parse degrades to an "unable to ..." marker so the overall
//! assessment still goes ahead.

use crate::scraper::LinkRecord;
use std::collections::HashMap;
use url::Url;

pub const PRESENT: &str = "Present";
pub const NONE_DETECTED: &str = "None detected";
pub const SOME_DETECTED: &str = "Some detected";
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze";
pub const UNABLE_TO_VERIFY: &str = "Unable to verify";

/// Labels longer than this are flagged as long subdomains
const LONG_LABEL: usize = 20;

/// Summary of the page's outgoing links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMetrics {
    pub number_of_external_links: usize,
    /// Percentage of external links with one decimal, e.g. "30.0"
    pub proportion_external_links: String,
    /// Up to three hosts as "host (count)", comma separated, or "None"
    pub top_external_domains: String,
}

/// Outcome of the URL pattern checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPatterns {
    pub uncommon_characters: String,
    pub suspicious_patterns: String,
    pub long_subdomains: String,
}

/// Trust signals that can be read off the URL alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityIndicators {
    pub domain_registration: String,
    pub contact_information: String,
    pub security_practices: String,
}

/// Content checks the model is asked to carry out on the page text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhishingIndicators {
    pub urgency_fear_tactics: &'static str,
    pub rewards: &'static str,
    pub transparency: &'static str,
    pub typographical_errors: &'static str,
    pub design: &'static str,
}

impl PhishingIndicators {
    pub fn content_review() -> Self {
        Self {
            urgency_fear_tactics: "Based on content analysis",
            rewards: "Based on content analysis",
            transparency: "Based on content analysis",
            typographical_errors: "Based on content quality check",
            design: "Based on page structure analysis",
        }
    }
}

fn parse_host(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// True when the host is under `.edu` or `.gov`
pub fn is_trusted_domain(url: &str) -> bool {
    match parse_host(url) {
        Some(host) => {
            let host = host.to_lowercase();
            host.ends_with(".edu") || host.ends_with(".gov")
        }
        None => {
            log::debug!("Cannot check trust for unparseable URL {}", url);
            false
        }
    }
}

/// Count external links and rank the hosts they point at
pub fn analyze_links(links: &[LinkRecord]) -> LinkMetrics {
    let external: Vec<&LinkRecord> = links.iter().filter(|l| l.is_external).collect();
    let number_of_external_links = external.len();

    let proportion = if links.is_empty() {
        0.0
    } else {
        number_of_external_links as f64 / links.len() as f64 * 100.0
    };

    // First-seen order breaks ties
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for link in external {
        let Some(host) = parse_host(&link.href) else {
            log::debug!("Skipping unparseable link {}", link.href);
            continue;
        };
        match index.get(&host) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(host.clone(), counts.len());
                counts.push((host, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let top = counts
        .iter()
        .take(3)
        .map(|(host, count)| format!("{} ({})", host, count))
        .collect::<Vec<_>>()
        .join(", ");

    LinkMetrics {
        number_of_external_links,
        proportion_external_links: format!("{:.1}", proportion),
        top_external_domains: if top.is_empty() { "None".to_string() } else { top },
    }
}

/// Look for host name tricks common on phishing pages
pub fn analyze_url_patterns(url: &str) -> UrlPatterns {
    let Some(host) = parse_host(url) else {
        return UrlPatterns {
            uncommon_characters: UNABLE_TO_ANALYZE.to_string(),
            suspicious_patterns: UNABLE_TO_ANALYZE.to_string(),
            long_subdomains: UNABLE_TO_ANALYZE.to_string(),
        };
    };

    let has_numbers = host.chars().any(|c| c.is_ascii_digit());
    let has_dashes = host.contains('-');
    let has_unusual_chars = host
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    let has_long_labels = host.split('.').any(|label| label.len() > LONG_LABEL);

    let flag = |present: bool, label: &str| -> String {
        let value = if present { label } else { NONE_DETECTED };
        value.to_string()
    };

    UrlPatterns {
        uncommon_characters: flag(has_unusual_chars, PRESENT),
        suspicious_patterns: flag(has_numbers || has_dashes, SOME_DETECTED),
        long_subdomains: flag(has_long_labels, PRESENT),
    }
}

/// Read basic security practices off the URL
pub fn analyze_security_indicators(url: &str) -> SecurityIndicators {
    match Url::parse(url) {
        Ok(parsed) => SecurityIndicators {
            domain_registration: "Based on domain age above".to_string(),
            contact_information: "Contact information requires manual review".to_string(),
            security_practices: if parsed.scheme() == "https" {
                "Basic security practices observed (HTTPS)"
            } else {
                "Basic security practices missing (HTTP)"
            }
            .to_string(),
        },
        Err(e) => {
            log::debug!("Cannot analyze security indicators for {}: {}", url, e);
            SecurityIndicators {
                domain_registration: UNABLE_TO_VERIFY.to_string(),
                contact_information: UNABLE_TO_VERIFY.to_string(),
                security_practices: UNABLE_TO_VERIFY.to_string(),
            }
        }
    }
}
