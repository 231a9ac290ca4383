//! Configuration loading and management for phishscope.
//!
//! Loads settings from `phishscope.toml` with environment variable overrides for sensitive data.
//! Every section has defaults, so running without a config file works out of the box.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file name looked up in the working directory and the user config dir
const CONFIG_FILE: &str = "phishscope.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to build HTTP client: {0}")]
    ClientError(#[from] reqwest::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
}

/// Generative-language provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier (e.g., "gemini-1.5-flash")
    pub model: String,
    /// Base URL of the generative-language API, without the `/models/...` suffix
    pub endpoint: String,
}

/// API keys configuration (loaded from file or environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// Registry lookup endpoints, keyed by top-level label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RdapConfig {
    pub endpoints: BTreeMap<String, String>,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

/// Outbound HTTP settings shared by every request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds; 0 disables the timeout
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rdap: RdapConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from the default location (phishscope.toml in cwd or home).
    ///
    /// Falls back to defaults when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::parse_file(&path)?,
            None => {
                log::debug!("No {} found, using defaults", CONFIG_FILE);
                Config::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.api.gemini_key = Some(key);
            }
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("phishscope").join(CONFIG_FILE);
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Get the configured API key, if any
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .gemini_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string()))
    }

    /// Path of the sled database holding the stored credential
    pub fn key_store_path(&self) -> PathBuf {
        self.storage.path.join("options")
    }

    /// Build the HTTP client used for page fetches, registry lookups and the LLM call
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(&self.http.user_agent);
        if self.http.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.http.timeout_secs));
        }
        Ok(builder.build()?)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl Default for RdapConfig {
    fn default() -> Self {
        let endpoints = [
            ("com", "https://rdap.verisign.com/com/v1/domain/"),
            ("net", "https://rdap.verisign.com/net/v1/domain/"),
            ("org", "https://rdap.publicinterestregistry.org/rdap/domain/"),
        ]
        .into_iter()
        .map(|(tld, url)| (tld.to_string(), url.to_string()))
        .collect();
        Self { endpoints }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("phishscope"))
            .unwrap_or_else(|| PathBuf::from("./data"));
        Self { path }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("phishscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
