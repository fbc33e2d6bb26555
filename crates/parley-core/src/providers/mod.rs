//! LLM provider abstraction layer
//!
//! Supports OpenAI-compatible chat completion endpoints and the Anthropic
//! Messages API. Providers implement the [`LlmProvider`] trait.

pub mod anthropic;
pub mod openai;
pub mod types;

use std::sync::Arc;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use types::{ChatMessage, ChatResponse, ChatRole, ChatUsage, LlmProvider, StopReason};

use crate::config::{ModelConfig, ProviderKind};

/// Default per-request timeout for model calls
pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Build the provider selected by configuration
pub fn build_provider(config: &ModelConfig) -> Arc<dyn LlmProvider> {
    match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
            config.model.clone(),
            config.base_url.clone(),
            config.api_key.clone(),
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            config.model.clone(),
            config.base_url.clone(),
            config.api_key.clone().unwrap_or_default(),
        )),
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
        .build()
        .expect("failed to build HTTP client")
}
