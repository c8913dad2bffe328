use crate::{Result, SeekError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "whatyouseek.toml";
/// The prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "WHATYOUSEEK";
/// Fallback environment variable for the API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// The `AppConfig` struct holds every setting of the application.
/// It is loaded once at startup and passed by reference to the components that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endpoint and credentials of the completion service.
    pub api: ApiConfig,
    /// Model settings used for searches.
    pub search: ModelConfig,
    /// Model settings used for recommendations.
    pub recommend: ModelConfig,
    /// The directory favorites are persisted in.
    pub favorites_dir: PathBuf,
}

/// The `ApiConfig` struct holds the endpoint URL, the API key and the
/// attribution headers sent along with search requests.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// The chat-completion endpoint URL.
    pub endpoint: String,
    /// The bearer token for the endpoint.
    pub api_key: String,
    /// Sent as `HTTP-Referer` on search requests.
    pub referer: String,
    /// Sent as `X-Title` on search requests.
    pub title: String,
}

/// The `ModelConfig` struct holds the settings for one kind of completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// The model identifier.
    pub model: String,
    /// The temperature setting, controlling the randomness of the output.
    pub temperature: f32,
    /// The maximum number of tokens allowed in the response.
    pub max_tokens: u32,
    /// How many websites the prompt asks for.
    pub result_count: usize,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: String::from(crate::DEFAULT_ENDPOINT),
                api_key: String::new(),
                referer: String::from("https://whatyouseek.co"),
                title: String::from("WhatYouSeek"),
            },
            search: ModelConfig {
                model: String::from("mistralai/mistral-7b-instruct"),
                temperature: 0.7,
                max_tokens: 300,
                result_count: crate::DEFAULT_RESULT_COUNT,
            },
            recommend: ModelConfig {
                model: String::from("llama-4-maverick-free"),
                temperature: 0.7,
                max_tokens: 300,
                result_count: crate::DEFAULT_RESULT_COUNT,
            },
            favorites_dir: default_favorites_dir(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the defaults, `whatyouseek.toml` in the working
    /// directory (if present) and `WHATYOUSEEK_*` environment variables, in that order.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Same as [`AppConfig::load`] with an explicit configuration file path.
    /// A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;

        let mut config: Self = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        if config.api.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                debug!("Using API key from {}", API_KEY_ENV);
                config.api.api_key = key;
            }
        }

        debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }
}

impl ApiConfig {
    /// Checks that an API key is present and plausibly formed.
    pub fn validate_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(SeekError::Config(format!(
                "No API key found. Please set {}_API__API_KEY or {}",
                ENV_PREFIX, API_KEY_ENV
            )));
        }
        if self.api_key.chars().count() < crate::MIN_API_KEY_LEN {
            return Err(SeekError::Config("Invalid API key".to_string()));
        }
        Ok(())
    }
}

fn default_favorites_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("whatyouseek"))
        .unwrap_or_else(|| PathBuf::from(".whatyouseek"))
}

fn config_error(e: config::ConfigError) -> SeekError {
    SeekError::Config(e.to_string())
}
