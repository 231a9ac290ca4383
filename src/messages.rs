//! Messages exchanged between the navigation source, the extractor and the panel.

use crate::scraper::PageContent;
use serde::{Deserialize, Serialize};

/// Requests and notifications, tagged by `action` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Ask the extractor for the current page's content
    GetContent,
    /// Navigation to `url` completed
    PageChanged { url: String },
    /// Re-run the analysis of the current page
    Refresh,
}

impl Message {
    /// Parse one line of input: either a JSON message or a bare URL
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        if line.starts_with('{') {
            return match serde_json::from_str(line) {
                Ok(message) => Some(message),
                Err(e) => {
                    log::warn!("Ignoring malformed message {:?}: {}", line, e);
                    None
                }
            };
        }
        Some(Message::PageChanged {
            url: line.to_string(),
        })
    }
}

/// Reply to [`Message::GetContent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    pub title: String,
    pub content: String,
    pub url: String,
}

impl From<&PageContent> for ContentResponse {
    fn from(page: &PageContent) -> Self {
        Self {
            title: page.title.clone().unwrap_or_default(),
            content: page.content.clone(),
            url: page.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_action_tag() {
        let json = serde_json::to_string(&Message::PageChanged {
            url: "https://example.com/".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"pageChanged","url":"https://example.com/"}"#);
        assert_eq!(
            serde_json::to_string(&Message::GetContent).unwrap(),
            r#"{"action":"getContent"}"#
        );
    }

    #[test]
    fn lines_parse_as_urls_or_messages() {
        assert_eq!(
            Message::from_line("  https://example.com/a \n"),
            Some(Message::PageChanged {
                url: "https://example.com/a".to_string()
            })
        );
        assert_eq!(
            Message::from_line(r#"{"action":"refresh"}"#),
            Some(Message::Refresh)
        );
        assert_eq!(Message::from_line("# comment"), None);
        assert_eq!(Message::from_line(""), None);
        assert_eq!(Message::from_line(r#"{"action":"reload"}"#), None);
    }

    #[test]
    fn content_response_from_page() {
        let page = PageContent {
            title: None,
            content: "text".to_string(),
            url: "https://example.com/".to_string(),
            links: Vec::new(),
        };
        let response = ContentResponse::from(&page);
        assert_eq!(response.title, "");
        assert_eq!(response.content, "text");
    }
}
