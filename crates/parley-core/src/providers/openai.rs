//! OpenAI-compatible chat completions provider

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{ChatMessage, ChatResponse, ChatUsage, LlmProvider, StopReason};

pub struct OpenAiProvider {
    http: Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(model: String, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: super::http_client(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request_body(&self, messages: &[ChatMessage], system: &str) -> Value {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            wire.push(serde_json::json!({"role": "system", "content": system}));
        }
        wire.extend(
            messages
                .iter()
                .map(|m| serde_json::json!({"role": m.role.to_string(), "content": m.content})),
        );
        serde_json::json!({
            "model": self.model,
            "messages": wire,
        })
    }
}

fn parse_response(body: Value) -> Result<ChatResponse> {
    let parsed: CompletionResponse =
        serde_json::from_value(body).context("Failed to parse chat completion response")?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Chat completion response contained no choices"))?;
    let usage = parsed
        .usage
        .map(|u| ChatUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        text: choice.message.content.unwrap_or_default(),
        stop_reason: StopReason::from_raw(choice.finish_reason.as_deref()),
        usage,
    })
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage], system: &str) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("OpenAI chat request to {} (model {})", url, self.model);

        let mut req = self.http.post(&url).json(&self.request_body(messages, system));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to reach model endpoint at {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Chat completion failed: HTTP {} — {}", status, body));
        }

        let body: Value = resp.json().await.context("Failed to read chat completion body")?;
        parse_response(body)
    }
}
