//! Minimal markdown rendering for model answers.
//!
//! Handles the subset the model actually produces: headings, bullet and
//! numbered lists, and `**bold**` runs. Everything else passes through as text.

/// Kind of a rendered line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Bullet,
    Text,
    Blank,
}

/// A run of text with uniform emphasis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdLine {
    pub kind: LineKind,
    /// Nesting depth for list items
    pub indent: usize,
    pub segments: Vec<Segment>,
}

impl MdLine {
    /// Line text without emphasis markers
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Parse markdown text into renderable lines
pub fn parse(text: &str) -> Vec<MdLine> {
    let mut lines: Vec<MdLine> = Vec::new();

    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let indent = (raw.len() - trimmed.len()) / 2;

        let line = if trimmed.trim().is_empty() {
            // Collapse runs of blank lines
            if lines.last().is_none_or(|l| l.kind == LineKind::Blank) {
                continue;
            }
            MdLine {
                kind: LineKind::Blank,
                indent: 0,
                segments: Vec::new(),
            }
        } else if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim();
            MdLine {
                kind: LineKind::Heading,
                indent: 0,
                segments: vec![Segment {
                    text: strip_markers(heading),
                    bold: true,
                }],
            }
        } else if let Some(item) = list_item(trimmed) {
            MdLine {
                kind: LineKind::Bullet,
                indent,
                segments: inline(item),
            }
        } else {
            MdLine {
                kind: LineKind::Text,
                indent: 0,
                segments: inline(trimmed.trim_end()),
            }
        };
        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.kind == LineKind::Blank) {
        lines.pop();
    }
    lines
}

/// Content of a `* `, `- ` or `1. ` list item
fn list_item(line: &str) -> Option<&str> {
    for marker in ["* ", "- ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return Some(rest.trim());
        }
    }
    None
}

/// Split a line on `**` markers into plain and bold segments
fn inline(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut bold = false;
    for (i, part) in text.split("**").enumerate() {
        if i > 0 {
            bold = !bold;
        }
        if part.is_empty() {
            continue;
        }
        segments.push(Segment {
            text: part.replace("__", ""),
            bold,
        });
    }
    // An unmatched marker leaves the tail bold; treat it as plain text
    if text.matches("**").count() % 2 == 1 {
        if let Some(last) = segments.last_mut() {
            last.bold = false;
        }
    }
    segments
}

fn strip_markers(text: &str) -> String {
    text.replace("**", "")
}
