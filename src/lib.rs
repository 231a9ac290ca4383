//! # phishscope
//!
//! A terminal side panel that assesses the phishing risk of webpages using an LLM.
//!
//! ## Features
//!
//! - **Page extraction**: readable main text and outgoing links, via scraper
//! - **Domain age**: registration date over RDAP for com, net and org
//! - **Heuristics**: external link metrics, URL pattern checks, .edu/.gov trust
//! - **Assessment**: a Gemini summary with an extracted Low/Medium/High risk label
//! - **Panel**: every navigation cancels the previous analysis, so stale results never show

pub mod agent;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod inspect;
pub mod markdown;
pub mod messages;
pub mod navigation;
pub mod panel;
pub mod render;
pub mod scraper;
pub mod storage;
pub mod summary;
pub mod ui;

pub use config::Config;
pub use inspect::{Inspector, Report};
pub use panel::{Panel, PanelState};
pub use storage::KeyStore;
pub use summary::{Assessment, RiskLevel};
