//! TUI module using ratatui.
//!
//! The side panel: a URL bar that acts as the browser's address bar, a header
//! with page facts and the risk badge, and the rendered assessment below.

use crate::inspect::Inspector;
use crate::markdown::{self, LineKind};
use crate::messages::Message;
use crate::panel::{Panel, PanelState};
use crate::render::{LOADING_MESSAGE, UNSUPPORTED_MESSAGE};
use crate::summary::RiskLevel;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct App {
    input: String,
    scroll: u16,
    quit: bool,
}

/// Run the panel until the user quits
pub async fn run(inspector: Inspector, initial_url: Option<String>) -> std::io::Result<()> {
    let (panel, mut state) = Panel::new(inspector);
    let (messages, inbox) = mpsc::channel(16);
    let panel_task = tokio::spawn(panel.run(inbox));

    let mut app = App {
        input: initial_url.clone().unwrap_or_default(),
        scroll: 0,
        quit: false,
    };
    if let Some(url) = initial_url {
        send_or_quit(&mut app, Message::PageChanged { url }, &messages).await;
        if app.quit {
            panel_task.abort();
            return Ok(());
        }
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app, &mut state, &messages).await;
    ratatui::restore();

    drop(messages);
    panel_task.abort();
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    state: &mut watch::Receiver<PanelState>,
    messages: &mpsc::Sender<Message>,
) -> std::io::Result<()> {
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    // crossterm's reader blocks, so it gets its own thread
    std::thread::spawn(move || loop {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key_tx.send(key).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Failed to read terminal event: {}", e);
                    break;
                }
            },
            Ok(false) if key_tx.is_closed() => break,
            Ok(false) => {}
            Err(e) => {
                log::error!("Failed to poll terminal events: {}", e);
                break;
            }
        }
    });

    while !app.quit {
        let shown = state.borrow_and_update().clone();
        terminal.draw(|frame| draw(frame, app, &shown))?;

        tokio::select! {
            key = keys.recv() => match key {
                Some(key) => handle_key(app, key, messages).await,
                None => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                app.scroll = 0;
            }
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent, messages: &mpsc::Sender<Message>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let message = match key.code {
        KeyCode::Esc => {
            app.quit = true;
            None
        }
        KeyCode::Char('c') if ctrl => {
            app.quit = true;
            None
        }
        KeyCode::F(5) => Some(Message::Refresh),
        KeyCode::Char('r') if ctrl => Some(Message::Refresh),
        KeyCode::Enter => {
            let url = app.input.trim();
            if url.is_empty() {
                None
            } else {
                Some(Message::PageChanged {
                    url: url.to_string(),
                })
            }
        }
        KeyCode::Backspace => {
            app.input.pop();
            None
        }
        KeyCode::PageDown => {
            app.scroll = app.scroll.saturating_add(5);
            None
        }
        KeyCode::PageUp => {
            app.scroll = app.scroll.saturating_sub(5);
            None
        }
        KeyCode::Char(c) if !ctrl => {
            app.input.push(c);
            None
        }
        _ => None,
    };

    if let Some(message) = message {
        send_or_quit(app, message, messages).await;
    }
}

async fn send_or_quit(app: &mut App, message: Message, messages: &mpsc::Sender<Message>) {
    if messages.send(message).await.is_err() {
        log::error!("Panel is no longer running");
        app.quit = true;
    }
}

fn risk_style(risk: RiskLevel) -> Style {
    let color = match risk {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
        RiskLevel::Unknown => Color::Gray,
    };
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}

fn draw(frame: &mut Frame, app: &App, state: &PanelState) {
    let [url_bar, header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(6),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(app.input.as_str()).block(Block::bordered().title(" URL ")),
        url_bar,
    );
    let cursor_x = url_bar.x + 1 + app.input.chars().count() as u16;
    frame.set_cursor_position(Position::new(
        cursor_x.min(url_bar.right().saturating_sub(2)),
        url_bar.y + 1,
    ));

    frame.render_widget(
        Paragraph::new(header_text(state))
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(" Page ")),
        header,
    );

    frame.render_widget(
        Paragraph::new(body_text(state))
            .wrap(Wrap { trim: false })
            .scroll((app.scroll, 0))
            .block(Block::bordered().title(" Assessment ")),
        body,
    );

    frame.render_widget(
        Paragraph::new("Enter: analyse  F5: refresh  PgUp/PgDn: scroll  Esc: quit")
            .style(Style::new().fg(Color::DarkGray)),
        footer,
    );
}

fn header_text(state: &PanelState) -> Text<'static> {
    let bold = Style::new().add_modifier(Modifier::BOLD);
    match state {
        PanelState::Rendered(report) => {
            let title = if report.page.title.is_empty() {
                "No title".to_string()
            } else {
                report.page.title.clone()
            };
            let risk = report.assessment.risk;
            Text::from(vec![
                Line::from(Span::styled(title, bold)),
                Line::from(report.page.url.clone()),
                Line::from(format!(
                    "{} (age: {})",
                    report.domain_age.parent_domain, report.domain_age.display
                )),
                Line::from(Span::styled(
                    format!("{} {} risk", risk.icon(), risk.label().to_uppercase()),
                    risk_style(risk),
                )),
            ])
        }
        PanelState::Unsupported { url } => Text::from(vec![
            Line::from(Span::styled("Unsupported page", bold)),
            Line::from(url.clone()),
        ]),
        other => match other.url() {
            Some(url) => Text::from(Line::from(url.to_string())),
            None => Text::from("No page yet"),
        },
    }
}

fn body_text(state: &PanelState) -> Text<'static> {
    match state {
        PanelState::Idle => Text::from("Type a URL and press Enter to check it."),
        PanelState::Loading { .. } => {
            Text::from(Span::styled(LOADING_MESSAGE, Style::new().fg(Color::DarkGray)))
        }
        PanelState::Unsupported { .. } => Text::from(UNSUPPORTED_MESSAGE),
        PanelState::Failed { message, .. } => Text::from(Span::styled(
            format!("Error: {}", message),
            Style::new().fg(Color::Red),
        )),
        PanelState::Rendered(report) => {
            let lines: Vec<Line> = markdown::parse(&report.assessment.explanation)
                .into_iter()
                .map(|line| {
                    let bold = Style::new().add_modifier(Modifier::BOLD);
                    let mut spans = Vec::new();
                    match line.kind {
                        LineKind::Heading => {
                            return Line::from(Span::styled(
                                line.plain(),
                                bold.add_modifier(Modifier::UNDERLINED),
                            ));
                        }
                        LineKind::Bullet => {
                            spans.push(Span::raw(format!("{}• ", "  ".repeat(line.indent + 1))))
                        }
                        LineKind::Text | LineKind::Blank => {}
                    }
                    for segment in line.segments {
                        if segment.bold {
                            spans.push(Span::styled(segment.text, bold));
                        } else {
                            spans.push(Span::raw(segment.text));
                        }
                    }
                    Line::from(spans)
                })
                .collect();
            Text::from(lines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App {
            input: String::new(),
            scroll: 0,
            quit: false,
        }
    }

    #[tokio::test]
    async fn control_chords_do_not_type() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut app = app();

        for c in ['a', 'l', 'x'] {
            let chord = KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
            handle_key(&mut app, chord, &tx).await;
        }
        assert_eq!(app.input, "");

        let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        handle_key(&mut app, shifted, &tx).await;
        assert_eq!(app.input, "A");

        let refresh = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        handle_key(&mut app, refresh, &tx).await;
        assert_eq!(rx.try_recv().ok(), Some(Message::Refresh));
        assert!(!app.quit);
    }

    #[tokio::test]
    async fn stopped_panel_quits() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut app = app();

        send_or_quit(
            &mut app,
            Message::PageChanged {
                url: "https://a.example/".to_string(),
            },
            &tx,
        )
        .await;
        assert!(app.quit);
    }
}
