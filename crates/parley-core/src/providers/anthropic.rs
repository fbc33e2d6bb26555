//! Anthropic Messages API provider

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{ChatMessage, ChatResponse, ChatRole, ChatUsage, LlmProvider, StopReason};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    http: Client,
    model: String,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(model: String, base_url: String, api_key: String) -> Self {
        Self {
            http: super::http_client(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request_body(&self, messages: &[ChatMessage], system: &str) -> Value {
        // System prompts travel in their own field, not as a message.
        let wire: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| serde_json::json!({"role": m.role.to_string(), "content": m.content}))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": wire,
        });
        if !system.is_empty() {
            body["system"] = Value::String(system.to_string());
        }
        body
    }
}

fn parse_response(body: Value) -> Result<ChatResponse> {
    let parsed: MessagesResponse =
        serde_json::from_value(body).context("Failed to parse Anthropic response")?;

    let text = parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .collect::<Vec<_>>()
        .join("");

    let usage = parsed
        .usage
        .map(|u| ChatUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        text,
        stop_reason: StopReason::from_raw(parsed.stop_reason.as_deref()),
        usage,
    })
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage], system: &str) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!("Anthropic chat request to {} (model {})", url, self.model);

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(messages, system))
            .send()
            .await
            .with_context(|| format!("Failed to reach model endpoint at {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic request failed: HTTP {} — {}", status, body));
        }

        let body: Value = resp.json().await.context("Failed to read Anthropic response body")?;
        parse_response(body)
    }
}
