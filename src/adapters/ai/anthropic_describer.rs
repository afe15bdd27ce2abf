//! Anthropic Describer - short dish descriptions from Claude's Messages API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-3-5-haiku-latest")
//!     .with_timeout(Duration::from_secs(15));
//!
//! let describer = AnthropicDescriber::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{DescribeError, DishDescriber};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You write one or two friendly sentences describing a home-cooked dish \
for a weekly menu planner. No lists, no headings, no recipe steps.";

/// Configuration for the Anthropic describer.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-3-5-haiku-latest".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 200,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

pub struct AnthropicDescriber {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicDescriber {
    pub fn new(config: AnthropicConfig) -> Result<Self, DescribeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DescribeError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, DescribeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(DescribeError::Unavailable(format!("status {}: {}", status, snippet)))
    }
}

/// Joins the text blocks of a response.
fn extract_text(response: MessagesResponse) -> Result<String, DescribeError> {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(DescribeError::InvalidResponse("empty completion".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl DishDescriber for AnthropicDescriber {
    async fn describe(&self, dish_name: &str) -> Result<String, DescribeError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![RequestMessage {
                role: "user",
                content: format!("Describe the dish \"{}\".", dish_name),
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DescribeError::Timeout(self.config.timeout.as_secs())
                } else {
                    DescribeError::Unavailable(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;
        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DescribeError::InvalidResponse(e.to_string()))?;
        extract_text(body)
    }
}
