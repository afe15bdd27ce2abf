//! Dish description (enrichment) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{check_http_url, check_timeout, is_set, ValidationError};

/// Enrichment is optional: without an API key the recipe view simply has
/// no description.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub anthropic_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_enabled(&self) -> bool {
        is_set(&self.anthropic_api_key)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_enabled() {
            return Ok(());
        }
        check_timeout("ai.timeout_secs", self.timeout_secs)?;
        check_http_url("ai.base_url", &self.base_url)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout() -> u64 {
    15
}
