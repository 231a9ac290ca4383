//! phishscope CLI - phishing-risk assessment for webpages
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use phishscope::inspect::is_supported_url;
use phishscope::messages::ContentResponse;
use phishscope::storage::mask_key;
use phishscope::{navigation, render, scraper, ui, Config, Inspector, KeyStore, Panel, PanelState};
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "phishscope")]
#[command(author, version, about = "Phishing-risk side panel for webpages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single webpage by URL
    Analyse {
        /// URL to analyse
        url: String,
        /// Show the extracted page content and links instead of an assessment
        #[arg(long)]
        raw: bool,
    },
    /// Read navigation events (URLs or JSON messages) from stdin and render each page
    Watch,
    /// Open the interactive panel
    Panel {
        /// Page to open first
        url: Option<String>,
    },
    /// Manage the stored Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save a new API key
    Set {
        /// Echo the key while typing
        #[arg(long)]
        show: bool,
    },
    /// Show the stored API key (masked)
    Show {
        /// Print the key in full
        #[arg(long)]
        reveal: bool,
    },
    /// Remove the stored API key
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        Some(Commands::Panel { .. }) => true,
        None => atty::is(atty::Stream::Stdin),
        Some(_) => false,
    };
    // Log lines would tear the TUI apart
    let default_filter = if interactive { "off" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Some(Commands::Analyse { url, raw }) => analyse(url, raw).await?,
        Some(Commands::Watch) => watch().await?,
        Some(Commands::Panel { url }) => {
            let config = Config::load()?;
            ui::run(build_inspector(&config)?, url).await?;
        }
        Some(Commands::Key { action }) => manage_key(action)?,
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "phishscope", &mut std::io::stdout());
        }
        None if interactive => {
            // Default: launch the TUI
            let config = Config::load()?;
            ui::run(build_inspector(&config)?, None).await?;
        }
        None => watch().await?,
    }

    Ok(())
}

fn open_key_store(config: &Config) -> anyhow::Result<KeyStore> {
    let path = config.key_store_path();
    KeyStore::open(&path).with_context(|| format!("failed to open options at {}", path.display()))
}

fn build_inspector(config: &Config) -> anyhow::Result<Inspector> {
    let key_store = open_key_store(config)?;
    Ok(Inspector::new(config, Some(key_store))?)
}

async fn analyse(url: String, raw: bool) -> anyhow::Result<()> {
    if !is_supported_url(&url) {
        render::print_state(&PanelState::Unsupported { url });
        return Ok(());
    }

    let config = Config::load()?;

    if raw {
        println!("Fetching: {}", url);
        let client = config.http_client()?;
        let content = scraper::fetch_content(&client, &url).await?;
        let reply = ContentResponse::from(&content);
        println!("\n=== {} ===\n", content.title.as_deref().unwrap_or("No title"));
        println!("{}", reply.content);
        println!("\n--- Extracted {} characters ---", reply.content.len());
        println!("\n🔗 Links ({}):", content.links.len());
        for link in &content.links {
            let marker = if link.is_external { "↗" } else { " " };
            println!("  {} {} <{}>", marker, link.text, link.href);
        }
        return Ok(());
    }

    println!("Analysing: {}\n", url);
    let inspector = build_inspector(&config)?;
    let state = match inspector.inspect(&url).await {
        Ok(report) => PanelState::Rendered(Box::new(report)),
        Err(e) => PanelState::Failed {
            url,
            message: format!("Unable to analyze this page: {}", e),
        },
    };
    render::print_state(&state);
    Ok(())
}

async fn watch() -> anyhow::Result<()> {
    let config = Config::load()?;
    let (panel, state) = Panel::new(build_inspector(&config)?);
    let (messages, inbox) = mpsc::channel(16);
    let panel_task = tokio::spawn(panel.run(inbox));

    let mut shown = state.clone();
    let printer = tokio::spawn(async move {
        while shown.changed().await.is_ok() {
            let current = shown.borrow_and_update().clone();
            render::print_state(&current);
        }
    });

    let reader = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let forwarded = navigation::forward_lines(reader, messages, state, &mut stdout).await?;

    panel_task.await?;
    printer.await?;
    log::info!("Processed {} navigation events", forwarded);
    Ok(())
}

fn manage_key(action: KeyAction) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = open_key_store(&config)?;

    match action {
        KeyAction::Set { show } => {
            let key = if show {
                dialoguer::Input::<String>::new()
                    .with_prompt("Gemini API key")
                    .allow_empty(true)
                    .interact_text()?
            } else {
                dialoguer::Password::new()
                    .with_prompt("Gemini API key")
                    .allow_empty_password(true)
                    .interact()?
            };
            store.set_api_key(&key)?;
            if key.trim().is_empty() {
                println!("Key cleared.");
            } else {
                println!("Key Saved!");
            }
        }
        KeyAction::Show { reveal } => match store.api_key()? {
            Some(key) if reveal => println!("{}", key),
            Some(key) => println!("{}", mask_key(&key)),
            None => println!("No API key saved."),
        },
        KeyAction::Clear => {
            if store.clear()? {
                println!("Key removed.");
            } else {
                println!("No API key saved.");
            }
        }
    }

    if config.api.gemini_key.is_some() {
        println!("Note: GEMINI_API_KEY or phishscope.toml provides a key, which takes precedence.");
    }
    Ok(())
}
