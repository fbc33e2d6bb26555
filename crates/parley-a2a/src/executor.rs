//! Chat executor — one inbound chat turn to one reply
//!
//! Outreach traffic is answered by the autonomy layer; everything else goes
//! to the configured LLM.

use std::sync::Arc;

use parley_core::{ChatMessage, LlmProvider};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::autonomy::{self, AutonomyConfig};
use crate::client::PeerMessenger;
use crate::directory::AgentDirectory;

/// Longest accepted chat turn, in characters
pub const MAX_USER_INPUT_LENGTH: usize = 8_000;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant reachable over the A2A protocol. \
     Answer concisely in the language the user writes in.";

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Input message must not be empty.")]
    EmptyInput,
    #[error("Input message is too long. Maximum length is {max} characters.")]
    InputTooLong { max: usize },
    #[error("Agent execution failed. Please try again later.")]
    Agent(#[source] anyhow::Error),
}

pub struct ChatExecutor {
    provider: Arc<dyn LlmProvider>,
    autonomy: AutonomyConfig,
    directory: Arc<dyn AgentDirectory>,
    messenger: Arc<dyn PeerMessenger>,
}

impl ChatExecutor {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        autonomy: AutonomyConfig,
        directory: Arc<dyn AgentDirectory>,
        messenger: Arc<dyn PeerMessenger>,
    ) -> Self {
        Self {
            provider,
            autonomy,
            directory,
            messenger,
        }
    }

    pub async fn execute(&self, user_text: &str) -> Result<String, ExecuteError> {
        if user_text.trim().is_empty() {
            return Err(ExecuteError::EmptyInput);
        }
        if user_text.chars().count() > MAX_USER_INPUT_LENGTH {
            return Err(ExecuteError::InputTooLong {
                max: MAX_USER_INPUT_LENGTH,
            });
        }

        if let Some(reply) = autonomy::handle(
            user_text,
            &self.autonomy,
            self.directory.as_ref(),
            self.messenger.as_ref(),
        )
        .await
        {
            debug!("Chat turn handled by autonomy ({:?})", reply.state);
            return Ok(reply.text);
        }

        let response = self
            .provider
            .chat(&[ChatMessage::user(user_text)], SYSTEM_PROMPT)
            .await
            .map_err(|e| {
                error!(
                    "Agent execution failed ({} / {}): {:#}",
                    self.provider.provider_name(),
                    self.provider.model(),
                    e
                );
                ExecuteError::Agent(e)
            })?;

        if !response.stop_reason.is_end_turn() {
            warn!("LLM reply ended early ({:?})", response.stop_reason);
        }
        debug!(
            "LLM reply: {} chars, {} output tokens",
            response.text.chars().count(),
            response.usage.output_tokens
        );
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DiscoveredAgent;
    use crate::testing::{ScriptedMessenger, ScriptedProvider, StaticDirectory};
    use std::time::Duration;

    fn autonomy_config() -> AutonomyConfig {
        AutonomyConfig {
            agent_name: "Agent A".to_string(),
            self_url: Some("http://127.0.0.1:8001".to_string()),
            discovery_urls: vec!["http://127.0.0.1:8002".to_string()],
            max_hops: 1,
            timeout: Duration::from_secs(5),
        }
    }

    fn executor(provider: Arc<ScriptedProvider>, messenger: Arc<ScriptedMessenger>) -> ChatExecutor {
        let directory = StaticDirectory::new(vec![DiscoveredAgent {
            name: "Agent B".to_string(),
            url: "http://127.0.0.1:8002".to_string(),
            description: String::new(),
        }]);
        ChatExecutor::new(provider, autonomy_config(), Arc::new(directory), messenger)
    }

    #[tokio::test]
    async fn test_rejects_empty_input() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let exec = executor(provider.clone(), Arc::new(ScriptedMessenger::new()));
        let err = exec.execute("   ").await.unwrap_err();
        assert!(matches!(err, ExecuteError::EmptyInput));
        assert_eq!(err.to_string(), "Input message must not be empty.");
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_oversized_input() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let exec = executor(provider.clone(), Arc::new(ScriptedMessenger::new()));
        let err = exec.execute(&"x".repeat(MAX_USER_INPUT_LENGTH + 1)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input message is too long. Maximum length is 8000 characters."
        );
        assert!(provider.prompts().is_empty());

        assert!(exec.execute(&"x".repeat(MAX_USER_INPUT_LENGTH)).await.is_ok());
    }

    #[tokio::test]
    async fn test_ordinary_chat_goes_to_llm() {
        let provider = Arc::new(ScriptedProvider::replying("Hi there!"));
        let messenger = Arc::new(ScriptedMessenger::new());
        let exec = executor(provider.clone(), messenger.clone());
        assert_eq!(exec.execute("hello").await.unwrap(), "Hi there!");
        assert_eq!(provider.prompts(), vec!["hello".to_string()]);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_outreach_bypasses_llm() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let messenger = Arc::new(ScriptedMessenger::new().reply("http://127.0.0.1:8002", "hello back"));
        let exec = executor(provider.clone(), messenger.clone());

        let reply = exec.execute("please greet the other agents").await.unwrap();
        assert!(reply.starts_with("Autonomous outreach summary"));
        assert!(reply.contains("  | hello back"));
        assert!(provider.prompts().is_empty());
        assert_eq!(messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_is_generic() {
        let provider = Arc::new(ScriptedProvider::failing("HTTP 500 upstream"));
        let exec = executor(provider, Arc::new(ScriptedMessenger::new()));
        let err = exec.execute("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "Agent execution failed. Please try again later.");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("HTTP 500"));
    }
}
