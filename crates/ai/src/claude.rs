//! REST client for the Anthropic Messages API.

use std::time::Duration;

use cycle_core::normalize::{StopReason, TokenUsage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL without the `/v1/messages` path.
    pub api_url: String,
    pub max_tokens: u32,
}

pub struct ClaudeApi {
    client: reqwest::Client,
    config: ClaudeConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaudeApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Anthropic API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// The parts of a model response the normalizer needs.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl ClaudeApi {
    pub fn new(config: ClaudeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a single-turn conversation and collect the text blocks.
    pub async fn complete(&self, system: &str, user: &str) -> Result<Completion, ClaudeApiError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: [RequestMessage {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.api_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClaudeApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = response.json().await?;
        Ok(body.into_completion())
    }
}

impl MessagesResponse {
    fn into_completion(self) -> Completion {
        let text = self
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        Completion {
            text,
            stop_reason: StopReason::from_api(self.stop_reason.as_deref()),
            usage: self.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_blocks_are_joined_and_others_dropped() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                { "type": "text", "text": "{\"theme\":" },
                { "type": "tool_use", "id": "t", "name": "x", "input": {} },
                { "type": "text", "text": "\"x\"}" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 120, "output_tokens": 48 }
        }))
        .unwrap();

        let completion = response.into_completion();
        assert_eq!(completion.text, "{\"theme\":\n\"x\"}");
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.output_tokens, 48);
    }

    #[test]
    fn max_tokens_stop_is_truncation() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [],
            "stop_reason": "max_tokens",
            "usage": { "input_tokens": 1, "output_tokens": 4096 }
        }))
        .unwrap();
        assert!(response.into_completion().stop_reason.is_truncated());
    }
}
