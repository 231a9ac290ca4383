//! Navigation source for line-oriented input.
//!
//! Each line is a navigation event (a bare URL) or a JSON message. Navigation
//! and refresh requests go to the panel; `getContent` is answered here from
//! whatever page the panel currently shows.

use crate::messages::Message;
use crate::panel::PanelState;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};

/// Forward messages read from `reader` until end of input.
///
/// `getContent` replies are written to `out` as one JSON line each.
/// Returns how many messages were sent to the panel.
pub async fn forward_lines<R, W>(
    reader: R,
    messages: mpsc::Sender<Message>,
    state: watch::Receiver<PanelState>,
    out: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(message) = Message::from_line(&line) else {
            continue;
        };
        if message == Message::GetContent {
            answer_get_content(&state, out)?;
            continue;
        }
        if messages.send(message).await.is_err() {
            log::warn!("Panel stopped, no longer forwarding navigation");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

fn answer_get_content<W: Write>(
    state: &watch::Receiver<PanelState>,
    out: &mut W,
) -> std::io::Result<()> {
    let json = match &*state.borrow() {
        PanelState::Rendered(report) => match serde_json::to_string(&report.page) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to encode page content: {}", e);
                return Ok(());
            }
        },
        _ => {
            log::warn!("No analysed page to return content for");
            return Ok(());
        }
    };
    writeln!(out, "{}", json)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_links;
    use crate::domain::{DomainAge, Years};
    use crate::inspect::Report;
    use crate::messages::ContentResponse;
    use crate::summary::Assessment;

    fn rendered() -> PanelState {
        PanelState::Rendered(Box::new(Report {
            page: ContentResponse {
                title: "Sign in".to_string(),
                content: "Enter your password".to_string(),
                url: "https://a.example/login".to_string(),
            },
            domain_age: DomainAge {
                parent_domain: "a.example".to_string(),
                display: "2y 1m".to_string(),
                years: Years::Known(2),
            },
            link_metrics: analyze_links(&[]),
            assessment: Assessment::from_response("Risk level: low".to_string()),
        }))
    }

    #[tokio::test]
    async fn forwards_urls_and_skips_noise() {
        let input: &[u8] = b"https://a.example/\n\n# comment\n{\"action\":\"refresh\"}\n{\"action\":\"getContent\"}\nchrome://settings\n";
        let (tx, mut rx) = mpsc::channel(8);
        let (_state_tx, state) = watch::channel(PanelState::Idle);

        let mut out = Vec::new();
        let forwarded = forward_lines(input, tx, state, &mut out).await.unwrap();
        assert_eq!(forwarded, 3);

        assert_eq!(
            rx.recv().await,
            Some(Message::PageChanged {
                url: "https://a.example/".to_string()
            })
        );
        assert_eq!(rx.recv().await, Some(Message::Refresh));
        assert_eq!(
            rx.recv().await,
            Some(Message::PageChanged {
                url: "chrome://settings".to_string()
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn get_content_answers_with_rendered_page() {
        let input: &[u8] = b"{\"action\":\"getContent\"}\n";
        let (tx, _rx) = mpsc::channel(1);
        let (_state_tx, state) = watch::channel(rendered());

        let mut out = Vec::new();
        let forwarded = forward_lines(input, tx, state, &mut out).await.unwrap();
        assert_eq!(forwarded, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"title\":\"Sign in\",\"content\":\"Enter your password\",\"url\":\"https://a.example/login\"}\n"
        );
    }

    #[tokio::test]
    async fn get_content_is_silent_until_a_page_is_shown() {
        let input: &[u8] = b"{\"action\":\"getContent\"}\n";
        for shown in [
            PanelState::Idle,
            PanelState::Loading {
                url: "https://a.example/".to_string(),
            },
        ] {
            let (tx, _rx) = mpsc::channel(1);
            let (_state_tx, state) = watch::channel(shown);

            let mut out = Vec::new();
            forward_lines(input, tx, state, &mut out).await.unwrap();
            assert!(out.is_empty());
        }
    }
}
