//! Page fetching and content extraction.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. The parsed document
//! plays the role of the live page: readable text comes from the first main
//! content container, and every anchor becomes a [`LinkRecord`].

use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

lazy_static! {
    /// Main content containers, matched in document order
    static ref CONTENT_SELECTOR: Selector =
        Selector::parse(r#"article, main, [role="main"], .main-content, #main-content"#).unwrap();
    static ref PARAGRAPH_SELECTOR: Selector = Selector::parse("p").unwrap();
    static ref TITLE_SELECTOR: Selector = Selector::parse("title").unwrap();
    static ref H1_SELECTOR: Selector = Selector::parse("h1").unwrap();
    static ref LINK_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
}

/// Elements whose text never renders
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line in rendered text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A link found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Visible link text
    pub text: String,
    /// Absolute href, resolved against the page URL
    pub href: String,
    /// True when the link leaves the page's host over http(s)
    pub is_external: bool,
}

/// Extracted content from a webpage
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page title
    pub title: Option<String>,
    /// Main readable text, trimmed; empty when the page has none
    pub content: String,
    /// The page URL after redirects
    pub url: String,
    /// Every usable link on the page
    pub links: Vec<LinkRecord>,
}

/// Raw page as delivered by the server
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    pub html: String,
}

/// Fetch a page. Error statuses still produce a page, like a browser tab would.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, ScraperError> {
    let response = client.get(url).send().await?;
    let final_url = response.url().clone();
    if !response.status().is_success() {
        log::warn!("{} answered with status {}", final_url, response.status());
    }
    let html = response.text().await?;
    Ok(FetchedPage {
        url: final_url,
        html,
    })
}

/// Fetch a page and extract its readable content and links
pub async fn fetch_content(client: &Client, url: &str) -> Result<PageContent, ScraperError> {
    let page = fetch_page(client, url).await?;
    Ok(extract_readable_content(&page.html, &page.url))
}

/// Extract title, main text and links from an HTML document
pub fn extract_readable_content(html: &str, page_url: &Url) -> PageContent {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let content = extract_text(&document);
    let links = extract_links(&document, page_url);

    log::debug!(
        "Extracted {} characters and {} links from {}",
        content.len(),
        links.len(),
        page_url
    );

    PageContent {
        title,
        content,
        url: page_url.to_string(),
        links,
    }
}

/// Extract the page title from <title> or <h1>
fn extract_title(document: &Html) -> Option<String> {
    [&*TITLE_SELECTOR, &*H1_SELECTOR]
        .into_iter()
        .filter_map(|selector| document.select(selector).next())
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|title| !title.is_empty())
}

/// Text of the first content container, or every paragraph as a fallback
fn extract_text(document: &Html) -> String {
    if let Some(container) = document.select(&CONTENT_SELECTOR).next() {
        return inner_text(container).trim().to_string();
    }

    document
        .select(&PARAGRAPH_SELECTOR)
        .map(inner_text)
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

/// Collect every anchor with non-empty text and href
pub fn extract_links(document: &Html, page_url: &Url) -> Vec<LinkRecord> {
    let page_host = page_url.host_str();

    document
        .select(&LINK_SELECTOR)
        .filter_map(|anchor| {
            let text = collapse_whitespace(&inner_text(anchor));
            let raw_href = anchor.value().attr("href")?.trim();
            if text.is_empty() || raw_href.is_empty() {
                return None;
            }
            let href = page_url.join(raw_href).ok()?;
            let is_external = matches!(href.scheme(), "http" | "https")
                && href.host_str() != page_host;
            Some(LinkRecord {
                text,
                href: href.to_string(),
                is_external,
            })
        })
        .collect()
}

/// Approximate the rendered text of an element.
///
/// Block elements and `<br>` break lines; whitespace inside a line collapses.
fn inner_text(element: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);

    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines().map(collapse_whitespace) {
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn collect_text(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            // Source line breaks are plain whitespace
            out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
        }
    }
    if block {
        out.push('\n');
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
