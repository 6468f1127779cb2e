use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Duration;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Longest accepted batch delay
    pub const MAX_DELAY: Duration = Duration::from_secs(3600);

    /// Validate file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        if path_str.contains('\0') {
            return Err(anyhow!("File path contains a NUL byte"));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate model identifier
    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(anyhow!("Model name cannot be empty"));
        }

        if model.len() > 100 {
            return Err(anyhow!("Model name too long (max 100 characters)"));
        }

        // Check for valid characters (alphanumeric, dots, dashes, underscores, slashes)
        if !model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '/' | ':'))
        {
            return Err(anyhow!("Model name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate completion endpoint URL
    pub fn validate_endpoint(endpoint: &str) -> Result<()> {
        let Some(rest) = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
        else {
            return Err(anyhow!("Endpoint must start with http:// or https://"));
        };

        if rest.is_empty() || rest.starts_with('/') {
            return Err(anyhow!("Endpoint has no host"));
        }

        if endpoint.chars().any(char::is_whitespace) {
            return Err(anyhow!("Endpoint contains whitespace"));
        }

        Ok(())
    }

    /// Validate the pause between batch calls
    pub fn validate_delay(delay: Duration) -> Result<()> {
        if delay > Self::MAX_DELAY {
            return Err(anyhow!("Batch delay too large (max {} seconds)", Self::MAX_DELAY.as_secs()));
        }

        if delay.is_zero() {
            tracing::warn!("Batch delay is zero; the service may rate-limit the run");
        }

        Ok(())
    }

    /// Validate a 1-based inclusive batch range against the store size
    pub fn validate_batch_range(from: usize, to: usize, count: usize) -> Result<()> {
        if from == 0 {
            return Err(anyhow!("Batch start must be at least 1"));
        }

        if from > to {
            return Err(anyhow!("Batch start {from} is after batch end {to}"));
        }

        if to > count {
            return Err(anyhow!("Batch end {to} is beyond the last tweet ({count})"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
