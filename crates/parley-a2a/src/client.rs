//! A2A client — sends chat turns to peer agents

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::protocol::*;

/// Default per-request timeout when the caller gives none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often a non-terminal task is polled
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Capability to deliver one text message to a peer and get its final reply
#[async_trait]
pub trait PeerMessenger: Send + Sync {
    async fn send_message(&self, peer_url: &str, text: &str, timeout: Duration) -> Result<String>;
}

/// A2A client for communicating with peer agents
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
}

impl Default for A2aClient {
    fn default() -> Self {
        Self::new()
    }
}

impl A2aClient {
    pub fn new() -> Self {
        Self {
            http: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Fetch an agent's capability card
    pub async fn fetch_agent_card(&self, base_url: &str, timeout: Duration) -> Result<AgentCard> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), AGENT_CARD_PATH);
        debug!("Fetching agent card from {}", url);

        let resp = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to connect to agent at {}", url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Agent card request failed: HTTP {}", resp.status()));
        }

        let card: AgentCard = resp.json().await.context("Failed to parse agent card")?;

        info!(
            "Fetched agent card: {} ({} capabilities)",
            card.name,
            card.capabilities.len()
        );
        Ok(card)
    }

    /// Submit a task to a peer agent
    pub async fn submit_task(
        &self,
        base_url: &str,
        prompt: &str,
        context: Value,
        timeout: Duration,
    ) -> Result<TaskResponse> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), TASKS_PATH);
        debug!("Submitting task to {}", url);

        let request = TaskRequest {
            prompt: prompt.to_string(),
            context,
        };

        let resp = self
            .http
            .post(&url)
            .json(&request)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to submit task to {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Task submission failed: HTTP {} — {}",
                status,
                body
            ));
        }

        let task: TaskResponse = resp.json().await.context("Failed to parse task response")?;

        info!("Task submitted: {} (status: {})", task.task_id, task.status);
        Ok(task)
    }

    /// Poll task status
    pub async fn get_task_status(
        &self,
        base_url: &str,
        task_id: &str,
        timeout: Duration,
    ) -> Result<TaskResponse> {
        let url = format!("{}{}/{}", base_url.trim_end_matches('/'), TASKS_PATH, task_id);

        let resp = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to poll task {} at {}", task_id, url))?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Task status request failed: HTTP {}",
                resp.status()
            ));
        }

        resp.json().await.context("Failed to parse task status")
    }

    /// Cancel a task
    pub async fn cancel_task(&self, base_url: &str, task_id: &str, timeout: Duration) -> Result<()> {
        let url = format!("{}{}/{}", base_url.trim_end_matches('/'), TASKS_PATH, task_id);

        let resp = self
            .http
            .delete(&url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to cancel task {} at {}", task_id, url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Task cancellation failed: HTTP {}", resp.status()));
        }

        info!("Task {} cancelled", task_id);
        Ok(())
    }

    /// Submit task and poll until it reaches a terminal status
    pub async fn submit_and_wait(
        &self,
        base_url: &str,
        prompt: &str,
        context: Value,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TaskResponse> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut task = self.submit_task(base_url, prompt, context, timeout).await?;

        while !task.status.is_terminal() {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(anyhow!(
                    "Task {} timed out after {:?}",
                    task.task_id,
                    timeout
                ));
            }

            tokio::time::sleep(poll_interval.min(deadline - now)).await;

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                continue;
            }
            task = self.get_task_status(base_url, &task.task_id, remaining).await?;
        }

        Ok(task)
    }

    /// Send a text message and return the peer's final text reply
    pub async fn send_text(&self, base_url: &str, text: &str, timeout: Duration) -> Result<String> {
        if base_url.trim().is_empty() {
            bail!("agent_url must not be empty.");
        }
        if text.trim().is_empty() {
            bail!("text must not be empty.");
        }

        let task = self
            .submit_and_wait(base_url, text, serde_json::json!({}), POLL_INTERVAL, timeout)
            .await?;
        final_reply(task)
    }
}

/// Turn a terminal task into its reply text or an error
fn final_reply(task: TaskResponse) -> Result<String> {
    let text = task.result.as_deref().unwrap_or_default().trim().to_string();
    match task.status {
        TaskStatus::Completed => Ok(text),
        TaskStatus::Failed | TaskStatus::Cancelled if !text.is_empty() => Err(anyhow!(text)),
        status => Err(anyhow!("Remote task ended with state={}.", status)),
    }
}

#[async_trait]
impl PeerMessenger for A2aClient {
    async fn send_message(&self, peer_url: &str, text: &str, timeout: Duration) -> Result<String> {
        self.send_text(peer_url, text, timeout).await
    }
}
