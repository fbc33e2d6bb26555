//! Model provider configuration loaded from `PARLEY_*` environment variables

use thiserror::Error;

use crate::env::{non_empty, process_lookup};

pub const PROVIDER_ENV: &str = "PARLEY_PROVIDER";
pub const MODEL_ENV: &str = "PARLEY_MODEL";
pub const BASE_URL_ENV: &str = "PARLEY_BASE_URL";
pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required.")]
    Missing(&'static str),
    #[error("PARLEY_API_KEY is required when PARLEY_PROVIDER=anthropic.")]
    AnthropicKeyRequired,
    #[error("PARLEY_PROVIDER must be one of: openai, anthropic (got '{0}').")]
    UnknownProvider(String),
}

/// Which wire format the model endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Everything needed to build an [`LlmProvider`](crate::LlmProvider)
#[derive(Clone)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

// Keeps the key out of logs.
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ModelConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| non_empty(lookup(key)).ok_or(ConfigError::Missing(key));

        let provider: ProviderKind = required(PROVIDER_ENV)?.parse()?;
        let model = required(MODEL_ENV)?;
        let base_url = required(BASE_URL_ENV)?.trim_end_matches('/').to_string();
        let api_key = non_empty(lookup(API_KEY_ENV));

        if provider == ProviderKind::Anthropic && api_key.is_none() {
            return Err(ConfigError::AnthropicKeyRequired);
        }

        Ok(Self {
            provider,
            model,
            base_url,
            api_key,
        })
    }
}
