//! Plain terminal rendering of the panel.

use crate::inspect::Report;
use crate::markdown::{self, LineKind, MdLine};
use crate::panel::PanelState;
use crate::summary::RiskLevel;
use colored::{ColoredString, Colorize};

/// Shown instead of the pipeline for non-http pages
pub const UNSUPPORTED_MESSAGE: &str =
    "This page can't be analyzed. Open an http:// or https:// page to check it for phishing.";

/// Shown while a cycle is running
pub const LOADING_MESSAGE: &str = "Analyzing page...";

/// Colored badge for a risk level
pub fn risk_badge(risk: RiskLevel) -> ColoredString {
    let text = format!("{} {} risk", risk.icon(), risk.label().to_uppercase());
    match risk {
        RiskLevel::Low => text.green().bold(),
        RiskLevel::Medium => text.yellow().bold(),
        RiskLevel::High => text.red().bold(),
        RiskLevel::Unknown => text.dimmed(),
    }
}

/// Print a panel state to stdout
pub fn print_state(state: &PanelState) {
    match state {
        PanelState::Idle => {}
        PanelState::Loading { url } => {
            println!("{} {}", "⏳".dimmed(), url);
            println!("   {}\n", LOADING_MESSAGE.dimmed());
        }
        PanelState::Unsupported { url } => {
            println!("=== {} ===\n", "Unsupported page".bold());
            println!("🔗 {}", url);
            println!("   {}\n", UNSUPPORTED_MESSAGE);
        }
        PanelState::Failed { url, message } => {
            println!("🔗 {}", url);
            println!("{} {}\n", "Error:".red().bold(), message);
        }
        PanelState::Rendered(report) => print_report(report),
    }
}

/// Print a finished analysis
pub fn print_report(report: &Report) {
    let title = if report.page.title.is_empty() {
        "No title"
    } else {
        report.page.title.as_str()
    };
    println!("=== {} ===\n", title.bold());
    println!("🔗 {}", report.page.url);

    let domain = &report.domain_age;
    if domain.parent_domain.is_empty() {
        println!("🌐 Domain age: {}", domain.display);
    } else {
        println!("🌐 {} (age: {})", domain.parent_domain, domain.display);
    }
    let metrics = &report.link_metrics;
    println!(
        "🔀 External links: {} ({}%), top: {}",
        metrics.number_of_external_links,
        metrics.proportion_external_links,
        metrics.top_external_domains
    );
    println!("\n{}\n", risk_badge(report.assessment.risk));

    for line in markdown::parse(&report.assessment.explanation) {
        println!("{}", format_line(&line));
    }
    println!();
}

fn format_line(line: &MdLine) -> String {
    let body: String = line
        .segments
        .iter()
        .map(|segment| {
            if segment.bold {
                segment.text.bold().to_string()
            } else {
                segment.text.clone()
            }
        })
        .collect();

    match line.kind {
        LineKind::Heading => line.plain().bold().underline().to_string(),
        LineKind::Bullet => format!("{}• {}", "  ".repeat(line.indent + 1), body),
        LineKind::Text => body,
        LineKind::Blank => String::new(),
    }
}
