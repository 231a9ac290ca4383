//! One analysis cycle: domain age, page extraction, heuristics and summary.

use crate::agent::{Summarizer, SummaryRequest};
use crate::analysis::{analyze_links, LinkMetrics};
use crate::config::{Config, ConfigError};
use crate::domain::{DomainAge, DomainAgeResolver};
use crate::messages::ContentResponse;
use crate::scraper::{self, ScraperError};
use crate::storage::{KeyStore, StorageError};
use crate::summary::Assessment;
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("unable to read the page: {0}")]
    Scraper(#[from] ScraperError),
    #[error("unable to read stored options: {0}")]
    Storage(#[from] StorageError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Everything the panel shows for an analysed page
#[derive(Debug, Clone)]
pub struct Report {
    /// Extracted page as returned to a `getContent` request
    pub page: ContentResponse,
    pub domain_age: DomainAge,
    pub link_metrics: LinkMetrics,
    pub assessment: Assessment,
}

/// True for pages the pipeline can analyse
pub fn is_supported_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Runs the analysis pipeline for one page
#[derive(Clone)]
pub struct Inspector {
    client: Client,
    resolver: DomainAgeResolver,
    summarizer: Summarizer,
    configured_key: Option<String>,
    key_store: Option<KeyStore>,
}

impl Inspector {
    /// Build an inspector from configuration and the options store
    pub fn new(config: &Config, key_store: Option<KeyStore>) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        Ok(Self {
            resolver: DomainAgeResolver::new(client.clone(), config.rdap.endpoints.clone()),
            summarizer: Summarizer::new(client.clone(), &config.agent),
            configured_key: config.api_key().ok().map(str::to_string),
            key_store,
            client,
        })
    }

    /// Credential from config or environment, then the options store
    fn credential(&self) -> Result<Option<String>, StorageError> {
        if let Some(key) = &self.configured_key {
            return Ok(Some(key.clone()));
        }
        match &self.key_store {
            Some(store) => store.api_key(),
            None => Ok(None),
        }
    }

    /// Analyse the page at `url`. Each step is awaited in turn.
    pub async fn inspect(&self, url: &str) -> Result<Report, InspectError> {
        log::info!("Analysing {}", url);

        let domain_age = self.resolver.resolve(url).await;
        log::debug!(
            "Domain {} is {}",
            domain_age.parent_domain,
            domain_age.display
        );

        let page = scraper::fetch_content(&self.client, url).await?;
        let link_metrics = analyze_links(&page.links);

        let credential = self.credential()?;
        let request = SummaryRequest {
            url: &page.url,
            content: &page.content,
            domain_age_years: domain_age.years,
            links: &page.links,
        };
        let text = self
            .summarizer
            .generate_summary(credential.as_deref(), &request)
            .await;

        Ok(Report {
            page: ContentResponse::from(&page),
            domain_age,
            link_metrics,
            assessment: Assessment::from_response(text),
        })
    }
}
