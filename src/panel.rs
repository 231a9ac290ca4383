//! Panel orchestrator.
//!
//! Reacts to navigation messages by running one analysis cycle per page and
//! publishing what the panel should show. A new navigation cancels the cycle
//! still in flight, and a cycle only publishes while its generation is current,
//! so a slow answer for an old page never replaces a newer one.

use crate::inspect::{is_supported_url, Inspector, Report};
use crate::messages::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the panel currently shows
#[derive(Debug, Clone)]
pub enum PanelState {
    /// Nothing analysed yet
    Idle,
    /// A cycle is running for `url`
    Loading { url: String },
    Rendered(Box<Report>),
    /// The page cannot be analysed (non-http scheme)
    Unsupported { url: String },
    /// The cycle failed before producing a report
    Failed { url: String, message: String },
}

impl PanelState {
    pub fn url(&self) -> Option<&str> {
        match self {
            PanelState::Idle => None,
            PanelState::Loading { url }
            | PanelState::Unsupported { url }
            | PanelState::Failed { url, .. } => Some(url),
            PanelState::Rendered(report) => Some(&report.page.url),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading { .. })
    }
}

struct Cycle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives analysis cycles for a single panel
pub struct Panel {
    inspector: Inspector,
    state: watch::Sender<PanelState>,
    generation: Arc<AtomicU64>,
    last_url: Option<String>,
    in_flight: Option<Cycle>,
}

impl Panel {
    pub fn new(inspector: Inspector) -> (Self, watch::Receiver<PanelState>) {
        let (state, receiver) = watch::channel(PanelState::Idle);
        let panel = Self {
            inspector,
            state,
            generation: Arc::new(AtomicU64::new(0)),
            last_url: None,
            in_flight: None,
        };
        (panel, receiver)
    }

    /// Subscribe another view to the panel state
    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    /// Number of cycles started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Consume messages until the sender side closes, then let the last cycle finish
    pub async fn run(mut self, mut messages: mpsc::Receiver<Message>) {
        while let Some(message) = messages.recv().await {
            self.handle(message);
        }
        if let Some(cycle) = self.in_flight.take() {
            if let Err(e) = cycle.handle.await {
                log::error!("Analysis task failed: {}", e);
            }
        }
    }

    /// Apply one message
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::PageChanged { url } => {
                if self.last_url.as_deref() == Some(url.as_str()) {
                    log::debug!("Ignoring repeated navigation to {}", url);
                    return;
                }
                self.navigate(url);
            }
            Message::Refresh => match self.last_url.clone() {
                Some(url) => self.navigate(url),
                None => log::debug!("Nothing to refresh"),
            },
            Message::GetContent => {
                log::debug!("getContent is answered by the extractor, not the panel");
            }
        }
    }

    fn navigate(&mut self, url: String) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_url = Some(url.clone());

        if !is_supported_url(&url) {
            log::info!("Unsupported page {}", url);
            self.state.send_replace(PanelState::Unsupported { url });
            return;
        }

        self.state
            .send_replace(PanelState::Loading { url: url.clone() });

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_cycle(
            self.inspector.clone(),
            url,
            generation,
            Arc::clone(&self.generation),
            self.state.clone(),
            cancel.clone(),
        ));
        self.in_flight = Some(Cycle { cancel, handle });
    }
}

async fn run_cycle(
    inspector: Inspector,
    url: String,
    generation: u64,
    current: Arc<AtomicU64>,
    state: watch::Sender<PanelState>,
    cancel: CancellationToken,
) {
    let next = tokio::select! {
        _ = cancel.cancelled() => {
            log::debug!("Cycle {} for {} cancelled", generation, url);
            return;
        }
        result = inspector.inspect(&url) => match result {
            Ok(report) => PanelState::Rendered(Box::new(report)),
            Err(e) => {
                log::error!("Failed to analyse {}: {}", url, e);
                PanelState::Failed {
                    url: url.clone(),
                    message: format!("Unable to analyze this page: {}", e),
                }
            }
        },
    };

    let published = state.send_if_modified(|shown| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        *shown = next;
        true
    });
    if published {
        log::info!("Cycle {} for {} rendered", generation, url);
    } else {
        log::debug!("Dropping stale result for {}", url);
    }
}
