//! LLM agent module for phishing-risk assessment.
//!
//! Builds a single prompt out of the page text and the heuristic signals and
//! sends it to the Gemini `generateContent` endpoint. Every failure is turned
//! into a display string, so callers always get something to render.

use crate::analysis::{
    analyze_links, analyze_security_indicators, analyze_url_patterns, is_trusted_domain,
    PhishingIndicators,
};
use crate::config::AgentConfig;
use crate::domain::Years;
use crate::scraper::LinkRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Returned instead of calling the API when no key has been saved
pub const MISSING_KEY_MESSAGE: &str =
    "Please set Gemini API key with `phishscope key set` (⚙️)";

const TRUST_CONTEXT: &str = "This is a .edu or .gov domain which are officially registered and restricted to educational and government institutions respectively. These domains are generally trustworthy due to strict registration requirements.";

const TRUSTED_RISK_NOTE: &str = "Note that as an official .edu or .gov domain, this should be considered Low risk unless there's overwhelming evidence of compromise.";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("API error: {0}")]
    Status(u16),
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("response contained no text")]
    EmptyResponse,
}

/// Everything gathered about a page that goes into the prompt
#[derive(Debug, Clone)]
pub struct SummaryRequest<'a> {
    pub url: &'a str,
    pub content: &'a str,
    pub domain_age_years: Years,
    pub links: &'a [LinkRecord],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Assemble the analysis prompt
pub fn build_prompt(request: &SummaryRequest<'_>) -> String {
    let link_metrics = analyze_links(request.links);
    let security = analyze_security_indicators(request.url);
    let phishing = PhishingIndicators::content_review();
    let patterns = analyze_url_patterns(request.url);

    let is_trusted = is_trusted_domain(request.url);
    let trust_context = if is_trusted { TRUST_CONTEXT } else { "" };
    let trusted_note = if is_trusted { TRUSTED_RISK_NOTE } else { "" };

    format!(
        r#"Analyze this webpage for phishing risks. Consider the following:
- **URL:** {url}
- **Content:** {content}
- **Domain Age:** {years} years old.
- **Links Analysis:**
  - Number of external links: {external}
  - Proportion of external links: {proportion}%
  - Top external domains: {top}
- **Trust Context:**
  - Domain Registration: {registration}
  - Contact Information: {contact}
  - Security Practices: {practices}
- **Phishing Indicators:**
  - Urgency/Fear Tactics: {urgency}
  - Excessive Rewards: {rewards}
  - Lack of Transparency: {transparency}
  - Typographical Errors: {typos}
  - Generic Website Design: {design}
- **URL Pattern Analysis:**
  - Uncommon Characters: {uncommon}
  - Suspicious Patterns: {suspicious}
  - Long Subdomains: {long}
{trust_context}
Provide a concise summary of the risks, including any suspicious elements or tactics.
{trusted_note}
**Assign a risk level of 'Low', 'Medium', or 'High' based on your analysis.**
Explain why you assigned this risk level. Don't display back analyzed URL in response."#,
        url = request.url,
        content = request.content,
        years = request.domain_age_years,
        external = link_metrics.number_of_external_links,
        proportion = link_metrics.proportion_external_links,
        top = link_metrics.top_external_domains,
        registration = security.domain_registration,
        contact = security.contact_information,
        practices = security.security_practices,
        urgency = phishing.urgency_fear_tactics,
        rewards = phishing.rewards,
        transparency = phishing.transparency,
        typos = phishing.typographical_errors,
        design = phishing.design,
        uncommon = patterns.uncommon_characters,
        suspicious = patterns.suspicious_patterns,
        long = patterns.long_subdomains,
    )
}

/// Client for the generative-language API
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: Client,
    endpoint: String,
    model: String,
}

impl Summarizer {
    pub fn new(client: Client, config: &AgentConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Full `generateContent` URL for the configured model
    fn generate_url(&self, api_key: &str) -> Result<Url, url::ParseError> {
        let base = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        Url::parse_with_params(&base, &[("key", api_key)])
    }

    /// Ask the model for a phishing-risk summary.
    ///
    /// Without a credential no request is made and [`MISSING_KEY_MESSAGE`] is
    /// returned. Request failures come back as `Error analyzing: ...`.
    pub async fn generate_summary(
        &self,
        credential: Option<&str>,
        request: &SummaryRequest<'_>,
    ) -> String {
        let Some(api_key) = credential.filter(|key| !key.trim().is_empty()) else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        let prompt = build_prompt(request);
        match self.request(api_key, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Analysis error: {}", e);
                format!("Error analyzing: {}", e)
            }
        }
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, AgentError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        log::info!("Requesting assessment from {}", self.model);
        // The request URL carries the key; keep it out of error text
        let response = self
            .client
            .post(self.generate_url(api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Status(status.as_u16()));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;
        data.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or(AgentError::EmptyResponse)
    }
}
