//! Autonomous peer outreach
//!
//! A chat turn that asks the agent to find and greet other agents (or that
//! carries an encoded relay envelope) is handled here instead of by the LLM:
//! peers are discovered from the configured candidates, each reachable peer
//! gets one conversational message, and the replies are rendered into a
//! plain-text summary.

pub mod config;
pub mod envelope;
pub mod message;
pub mod outreach;
pub mod summary;
pub mod trigger;

pub use config::AutonomyConfig;
pub use envelope::{AUTONOMOUS_REQUEST_PREFIX, decode_request, encode_request};
pub use message::build_conversation_message;
pub use outreach::{OutreachReply, OutreachState, PeerOutcome, handle};
pub use summary::render_summary;
pub use trigger::{Trigger, classify};

use crate::directory::normalize_url_list;

/// Relay payload carried between agents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonomousRequest {
    pub objective: String,
    pub origin_name: String,
    pub origin_url: String,
    pub remaining_hops: u32,
    pub visited_urls: Vec<String>,
    pub relay_id: String,
}

impl AutonomousRequest {
    /// Fresh request for a human-triggered outreach from this agent
    pub fn originate(objective: &str, config: &AutonomyConfig) -> Self {
        Self {
            objective: objective.trim().to_string(),
            origin_name: config.agent_name.clone(),
            origin_url: config.self_url.clone().unwrap_or_default(),
            remaining_hops: config.max_hops,
            visited_urls: config.self_url.iter().cloned().collect(),
            relay_id: new_relay_id(),
        }
    }

    /// Assign a relay id if the payload arrived without one
    pub fn with_relay_id(mut self) -> Self {
        if self.relay_id.is_empty() {
            self.relay_id = new_relay_id();
        }
        self
    }

    /// The request a peer would continue with after this hop
    pub fn next_hop(&self, self_url: Option<&str>, peer_url: &str) -> Self {
        let visited = self
            .visited_urls
            .iter()
            .map(String::as_str)
            .chain(self_url)
            .chain(std::iter::once(peer_url));

        Self {
            objective: self.objective.clone(),
            origin_name: self.origin_name.clone(),
            origin_url: self.origin_url.clone(),
            remaining_hops: self.remaining_hops.saturating_sub(1),
            visited_urls: normalize_url_list(visited),
            relay_id: self.relay_id.clone(),
        }
    }
}

/// `relay-` followed by 8 lowercase hex characters
pub fn new_relay_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("relay-{}", &hex[..8])
}
