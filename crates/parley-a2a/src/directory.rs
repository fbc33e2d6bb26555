//! Peer directory — resolves candidate URLs into live agents via their cards

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, info};

use crate::client::A2aClient;

/// A live agent resolved from its card; `url` is its identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAgent {
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Trim whitespace and trailing slashes. Blank input yields `None`.
pub fn normalize_url(value: &str) -> Option<String> {
    let normalized = value.trim().trim_end_matches('/');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Normalize a sequence of URLs, dropping blanks and duplicates (first wins)
pub fn normalize_url_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if let Some(url) = normalize_url(value.as_ref()) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}

/// Parse a comma-separated candidate list
pub fn parse_discovery_urls(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => normalize_url_list(raw.split(',')),
        None => Vec::new(),
    }
}

/// Capability to turn candidate URLs into discovered agents.
///
/// Individual candidate failures are skipped; an `Err` means the whole
/// discovery call could not run.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn discover(&self, candidates: &[String], timeout: Duration) -> Result<Vec<DiscoveredAgent>>;
}

/// Directory backed by HTTP agent-card fetches
#[derive(Clone, Default)]
pub struct HttpDirectory {
    client: A2aClient,
}

impl HttpDirectory {
    pub fn new(client: A2aClient) -> Self {
        Self { client }
    }

    async fn resolve(&self, candidate: &str, timeout: Duration) -> Option<DiscoveredAgent> {
        match self.client.fetch_agent_card(candidate, timeout).await {
            Ok(card) => {
                let name = card.name.trim();
                Some(DiscoveredAgent {
                    name: if name.is_empty() {
                        candidate.to_string()
                    } else {
                        name.to_string()
                    },
                    // The address we reached wins over whatever the card advertises.
                    url: candidate.to_string(),
                    description: card.description.trim().to_string(),
                })
            }
            Err(e) => {
                debug!("Skipping candidate {}: {:#}", candidate, e);
                None
            }
        }
    }
}

#[async_trait]
impl AgentDirectory for HttpDirectory {
    async fn discover(&self, candidates: &[String], timeout: Duration) -> Result<Vec<DiscoveredAgent>> {
        let candidates = normalize_url_list(candidates);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let resolved = join_all(candidates.iter().map(|c| self.resolve(c, timeout))).await;
        let discovered: Vec<DiscoveredAgent> = resolved.into_iter().flatten().collect();

        info!(
            "Discovered {} of {} candidate agents",
            discovered.len(),
            candidates.len()
        );
        Ok(discovered)
    }
}
