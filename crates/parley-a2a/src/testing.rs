//! Test doubles for the discovery, send and model capabilities

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parley_core::{ChatMessage, ChatResponse, LlmProvider};
use parley_core::providers::{ChatUsage, StopReason};

use crate::client::PeerMessenger;
use crate::directory::{AgentDirectory, DiscoveredAgent};

/// Returns a fixed set of agents and counts calls
pub struct StaticDirectory {
    agents: Vec<DiscoveredAgent>,
    calls: AtomicUsize,
}

impl StaticDirectory {
    pub fn new(agents: Vec<DiscoveredAgent>) -> Self {
        Self {
            agents,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentDirectory for StaticDirectory {
    async fn discover(&self, _candidates: &[String], _timeout: Duration) -> Result<Vec<DiscoveredAgent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.agents.clone())
    }
}

/// Fails the whole discovery call
pub struct FailingDirectory {
    message: String,
}

impl FailingDirectory {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl AgentDirectory for FailingDirectory {
    async fn discover(&self, _candidates: &[String], _timeout: Duration) -> Result<Vec<DiscoveredAgent>> {
        Err(anyhow!(self.message.clone()))
    }
}

/// Per-URL scripted replies; unscripted URLs fail. Records every send.
#[derive(Default)]
pub struct ScriptedMessenger {
    replies: HashMap<String, Result<String, String>>,
    delays: HashMap<String, Duration>,
    sent: Mutex<Vec<(String, String, Duration)>>,
}

impl ScriptedMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, url: &str, text: &str) -> Self {
        self.replies.insert(url.to_string(), Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, url: &str, error: &str) -> Self {
        self.replies.insert(url.to_string(), Err(error.to_string()));
        self
    }

    /// Hold the reply for `url` back by `delay`
    pub fn delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn sent(&self) -> Vec<(String, String, Duration)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerMessenger for ScriptedMessenger {
    async fn send_message(&self, peer_url: &str, text: &str, timeout: Duration) -> Result<String> {
        self.sent
            .lock()
            .unwrap()
            .push((peer_url.to_string(), text.to_string(), timeout));
        if let Some(delay) = self.delays.get(peer_url) {
            tokio::time::sleep(*delay).await;
        }
        match self.replies.get(peer_url) {
            Some(Ok(reply)) => Ok(reply.clone()),
            Some(Err(error)) => Err(anyhow!(error.clone())),
            None => Err(anyhow!("no scripted reply for {}", peer_url)),
        }
    }
}

/// Model double: fixed reply or fixed failure, records prompts
pub struct ScriptedProvider {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, messages: &[ChatMessage], _system: &str) -> Result<ChatResponse> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.extend(messages.iter().map(|m| m.content.clone()));
        drop(prompts);
        match &self.reply {
            Ok(text) => Ok(ChatResponse {
                text: text.clone(),
                stop_reason: StopReason::EndTurn,
                usage: ChatUsage::default(),
            }),
            Err(error) => Err(anyhow!(error.clone())),
        }
    }
}
