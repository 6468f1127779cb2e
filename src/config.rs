use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tweet_store::TweetLayout;

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub service: ServiceConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub tweets_path: String,
    pub has_headers: bool,
    pub delimiter: String,
    pub content_column: usize,
    pub timestamp_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub results_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                tweets_path: "cleaned_tweets.csv".to_string(),
                has_headers: false,
                delimiter: ",".to_string(),
                content_column: 3,
                timestamp_column: 4,
            },
            output: OutputConfig {
                results_path: "model_responses.csv".to_string(),
            },
            service: ServiceConfig {
                endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
                model: "mistral-large-2411".to_string(),
                api_key: None,
                timeout_secs: 60,
                max_retries: 2,
                retry_backoff_ms: 500,
            },
            batch: BatchConfig { delay_secs: 5 },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from multiple sources with precedence:
    /// defaults, `config/default`, `config/local`, `tweet_triage`, an explicit file, then
    /// `TWEET_TRIAGE__SECTION__KEY` environment variables.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let mut builder = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("tweet_triage").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("TWEET_TRIAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate input config
        if self.input.tweets_path.trim().is_empty() {
            return Err(anyhow::anyhow!("input.tweets_path must not be empty"));
        }
        if self.input.delimiter.len() != 1 {
            return Err(anyhow::anyhow!(
                "input.delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            ));
        }
        if self.input.content_column == self.input.timestamp_column {
            return Err(anyhow::anyhow!("content_column and timestamp_column must differ"));
        }

        // Validate output config
        if self.output.results_path.trim().is_empty() {
            return Err(anyhow::anyhow!("output.results_path must not be empty"));
        }

        // Validate service config
        if !self.service.endpoint.starts_with("http://") && !self.service.endpoint.starts_with("https://") {
            return Err(anyhow::anyhow!("service.endpoint must be an http(s) URL: {}", self.service.endpoint));
        }
        if self.service.model.trim().is_empty() {
            return Err(anyhow::anyhow!("service.model must not be empty"));
        }
        if self.service.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Column layout for the tweet store
    #[must_use]
    pub fn tweet_layout(&self) -> TweetLayout {
        TweetLayout {
            has_headers: self.input.has_headers,
            delimiter: self.input.delimiter.bytes().next().unwrap_or(b','),
            content_column: self.input.content_column,
            timestamp_column: self.input.timestamp_column,
        }
    }

    /// Path of the tweet export
    #[must_use]
    pub fn tweets_path(&self) -> PathBuf {
        PathBuf::from(&self.input.tweets_path)
    }

    /// Path of the result table
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        PathBuf::from(&self.output.results_path)
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Effective log level: an explicit flag, then `RUST_LOG`, then the configured level
    #[must_use]
    pub fn resolve_log_level(&self, flag: Option<&str>) -> String {
        flag.map_or_else(|| self.get_log_level(), ToString::to_string)
    }
}

impl ServiceConfig {
    /// API key from config, falling back to `MISTRAL_API_KEY`
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("MISTRAL_API_KEY").ok().filter(|key| !key.trim().is_empty()))
    }
}
