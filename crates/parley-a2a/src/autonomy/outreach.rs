//! Outreach orchestrator
//!
//! classify -> discover -> fan out -> summarize. Every failure below the
//! classification step comes back as text; nothing here returns an error to
//! the chat turn.

use anyhow::Result;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use super::summary::render_summary;
use super::trigger::{Trigger, classify};
use super::{AutonomousRequest, AutonomyConfig, build_conversation_message, encode_request};
use crate::client::PeerMessenger;
use crate::directory::{AgentDirectory, DiscoveredAgent, normalize_url};

/// Result of sending to one peer
#[derive(Debug)]
pub struct PeerOutcome {
    pub peer: DiscoveredAgent,
    pub result: Result<String>,
}

/// Where the outreach pass stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutreachState {
    NoDiscoveryConfigured,
    DiscoveryFailed,
    HopsExhausted,
    Completed,
}

/// Text returned to the chat turn in place of an LLM reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutreachReply {
    pub text: String,
    pub state: OutreachState,
}

impl OutreachReply {
    fn new(text: impl Into<String>, state: OutreachState) -> Self {
        Self {
            text: text.into(),
            state,
        }
    }
}

pub fn no_discovery_message() -> String {
    format!(
        "Autonomous outreach was requested, but {} is empty. \
         Set comma-separated candidate agent URLs first.",
        super::config::DISCOVERY_URLS_ENV
    )
}

/// Handle a chat turn if it is outreach traffic; `None` means ordinary chat
pub async fn handle(
    user_text: &str,
    config: &AutonomyConfig,
    directory: &dyn AgentDirectory,
    messenger: &dyn PeerMessenger,
) -> Option<OutreachReply> {
    let request = match classify(user_text) {
        Trigger::Ignore => return None,
        Trigger::HumanTrigger => AutonomousRequest::originate(user_text, config),
        Trigger::Relay(request) => request,
    }
    .with_relay_id();

    if config.discovery_urls.is_empty() {
        return Some(OutreachReply::new(
            no_discovery_message(),
            OutreachState::NoDiscoveryConfigured,
        ));
    }

    let discovered = match directory.discover(&config.discovery_urls, config.timeout).await {
        Ok(discovered) => discovered,
        Err(e) => {
            warn!("[{}] autonomy discovery failed: {:#}", request.relay_id, e);
            return Some(OutreachReply::new(
                format!("Autonomous outreach failed during discovery: {:#}", e),
                OutreachState::DiscoveryFailed,
            ));
        }
    };

    let reachable = reachable_peers(&discovered, config.self_url.as_deref(), &request.visited_urls);

    info!(
        "[{}] autonomy start agent={} self={} remaining_hops={} discovered={} reachable={}",
        request.relay_id,
        config.agent_name,
        config.self_url.as_deref().unwrap_or("unknown"),
        request.remaining_hops,
        discovered.len(),
        reachable.len()
    );

    let message = build_conversation_message(&request.objective, &request.origin_name);

    let (outcomes, state) = if request.remaining_hops > 0 {
        let sends = reachable
            .iter()
            .map(|peer| contact(peer, &message, &request, config, messenger));
        (join_all(sends).await, OutreachState::Completed)
    } else {
        (Vec::new(), OutreachState::HopsExhausted)
    };

    Some(OutreachReply::new(
        render_summary(config, &request, &discovered, &outcomes),
        state,
    ))
}

/// Discovered agents that are neither self nor already visited, in order
pub fn reachable_peers(
    discovered: &[DiscoveredAgent],
    self_url: Option<&str>,
    visited: &[String],
) -> Vec<DiscoveredAgent> {
    let normalized_self = self_url.and_then(normalize_url);
    discovered
        .iter()
        .filter(|agent| match normalize_url(&agent.url) {
            Some(url) => Some(&url) != normalized_self.as_ref() && !visited.contains(&url),
            None => false,
        })
        .cloned()
        .collect()
}

async fn contact(
    peer: &DiscoveredAgent,
    message: &str,
    request: &AutonomousRequest,
    config: &AutonomyConfig,
    messenger: &dyn PeerMessenger,
) -> PeerOutcome {
    let relay_id = &request.relay_id;
    let from = config.self_url.as_deref().unwrap_or("unknown");

    // The next-hop envelope is prepared for correlation only; peers receive
    // the conversational message.
    let next = request.next_hop(config.self_url.as_deref(), &peer.url);
    debug!("[{}] next hop for {}: {}", relay_id, peer.url, encode_request(&next));

    info!(
        "[{}] contact start from={} to={} message={}",
        relay_id,
        from,
        peer.url,
        message.chars().take(50).collect::<String>()
    );

    let result = messenger.send_message(&peer.url, message, config.timeout).await;
    match &result {
        Ok(response) => info!(
            "[{}] contact done from={} to={} response_chars={}",
            relay_id,
            from,
            peer.url,
            response.chars().count()
        ),
        Err(e) => warn!(
            "[{}] contact failed from={} to={} error={:#}",
            relay_id, from, peer.url, e
        ),
    }

    PeerOutcome {
        peer: peer.clone(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingDirectory, ScriptedMessenger, StaticDirectory};
    use std::time::Duration;

    fn config(discovery_urls: &[&str], max_hops: u32) -> AutonomyConfig {
        AutonomyConfig {
            agent_name: "Agent A".to_string(),
            self_url: Some("http://127.0.0.1:8001".to_string()),
            discovery_urls: discovery_urls.iter().map(|s| s.to_string()).collect(),
            max_hops,
            timeout: Duration::from_secs(5),
        }
    }

    fn default_config() -> AutonomyConfig {
        config(&["http://127.0.0.1:8001", "http://127.0.0.1:8002"], 1)
    }

    fn agent(name: &str, url: &str) -> DiscoveredAgent {
        DiscoveredAgent {
            name: name.to_string(),
            url: url.to_string(),
            description: String::new(),
        }
    }

    fn two_agents() -> StaticDirectory {
        StaticDirectory::new(vec![
            agent("Agent A", "http://127.0.0.1:8001"),
            agent("Agent B", "http://127.0.0.1:8002"),
        ])
    }

    #[tokio::test]
    async fn test_normal_chat_is_ignored() {
        let directory = StaticDirectory::new(vec![]);
        let messenger = ScriptedMessenger::new();
        let reply = handle("hello", &default_config(), &directory, &messenger).await;
        assert!(reply.is_none());
        assert_eq!(directory.calls(), 0);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_requires_discovery_urls() {
        let directory = StaticDirectory::new(vec![]);
        let messenger = ScriptedMessenger::new();
        let reply = handle(
            "他のagentに挨拶してみてください",
            &config(&[], 1),
            &directory,
            &messenger,
        )
        .await
        .unwrap();
        assert_eq!(reply.state, OutreachState::NoDiscoveryConfigured);
        assert!(reply.text.contains("PARLEY_DISCOVERY_URLS"));
        assert_eq!(directory.calls(), 0);
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_failure_is_reported() {
        let messenger = ScriptedMessenger::new();
        let reply = handle(
            "greet other agents",
            &default_config(),
            &FailingDirectory::new("resolver exploded"),
            &messenger,
        )
        .await
        .unwrap();
        assert_eq!(reply.state, OutreachState::DiscoveryFailed);
        assert_eq!(
            reply.text,
            "Autonomous outreach failed during discovery: resolver exploded"
        );
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_discovers_and_contacts_peers() {
        let directory = two_agents();
        let messenger =
            ScriptedMessenger::new().reply("http://127.0.0.1:8002", "こんにちは、Agent Bです。");

        let reply = handle(
            "他のagentに挨拶してみてください",
            &default_config(),
            &directory,
            &messenger,
        )
        .await
        .unwrap();

        assert_eq!(reply.state, OutreachState::Completed);
        assert!(reply.text.contains("detected agents: 2"));
        assert!(reply.text.contains("reachable peers: 1"));
        assert!(reply.text.contains("contacted peers: 1"));
        assert!(reply.text.contains("Agent B"));
        assert!(reply.text.contains("こんにちは、Agent Bです。"));
        assert!(reply.text.contains("origin: Agent A (http://127.0.0.1:8001)"));

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://127.0.0.1:8002");
        assert!(sent[0].1.contains("こんにちは！"));
        assert!(sent[0].1.contains("挨拶"));
        assert!(!sent[0].1.starts_with("A2A_AUTONOMY::"));
        assert_eq!(sent[0].2, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stops_when_hops_exhausted() {
        let request = AutonomousRequest {
            objective: "relay".to_string(),
            origin_name: "Agent A".to_string(),
            origin_url: "http://127.0.0.1:8001".to_string(),
            remaining_hops: 0,
            visited_urls: vec!["http://127.0.0.1:8001".to_string()],
            relay_id: String::new(),
        };
        let messenger = ScriptedMessenger::new();

        let reply = handle(
            &encode_request(&request),
            &default_config(),
            &two_agents(),
            &messenger,
        )
        .await
        .unwrap();

        assert_eq!(reply.state, OutreachState::HopsExhausted);
        assert!(reply.text.contains("remaining_hops=0"));
        assert!(reply.text.contains("note: remaining_hops=0"));
        assert!(reply.text.contains("contacted peers: 0"));
        assert!(reply.text.contains("detected agents: 2"));
        assert!(messenger.sent().is_empty());
        // The missing relay id was filled in.
        assert!(reply.text.contains("relay_id: relay-"));
    }

    #[tokio::test]
    async fn test_relay_keeps_incoming_relay_id_and_skips_visited() {
        let request = AutonomousRequest {
            objective: "share the roadmap".to_string(),
            origin_name: "Agent Z".to_string(),
            origin_url: "http://127.0.0.1:8009".to_string(),
            remaining_hops: 1,
            visited_urls: vec!["http://127.0.0.1:8002".to_string()],
            relay_id: "relay-c0ffee00".to_string(),
        };
        let directory = StaticDirectory::new(vec![
            agent("Agent A", "http://127.0.0.1:8001/"),
            agent("Agent B", "http://127.0.0.1:8002"),
            agent("Agent C", "http://127.0.0.1:8003"),
        ]);
        let messenger = ScriptedMessenger::new().reply("http://127.0.0.1:8003", "noted");

        let reply = handle(&encode_request(&request), &default_config(), &directory, &messenger)
            .await
            .unwrap();

        assert!(reply.text.contains("relay_id: relay-c0ffee00"));
        assert!(reply.text.contains("contacted peers: 1"));
        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://127.0.0.1:8003");
        assert_eq!(sent[0].1, "Agent Zからのメッセージ: share the roadmap");
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_abort() {
        let directory = StaticDirectory::new(vec![
            agent("Agent B", "http://127.0.0.1:8002"),
            agent("Agent C", "http://127.0.0.1:8003"),
        ]);
        let messenger = ScriptedMessenger::new()
            .fail("http://127.0.0.1:8002", "peer offline")
            .reply("http://127.0.0.1:8003", "hi from C");

        let reply = handle("say hi to the other agents", &default_config(), &directory, &messenger)
            .await
            .unwrap();

        assert_eq!(messenger.sent().len(), 2);
        assert_eq!(reply.text.matches(": ERROR").count(), 1);
        assert_eq!(reply.text.matches(": OK").count(), 1);
        assert!(reply.text.contains("- contact Agent B (http://127.0.0.1:8002): ERROR peer offline"));
        assert!(reply.text.contains("- contact Agent C (http://127.0.0.1:8003): OK\n  | hi from C"));

        // Outcome lines follow peer order.
        let b = reply.text.find("- contact Agent B").unwrap();
        let c = reply.text.find("- contact Agent C").unwrap();
        assert!(b < c);
    }

    #[tokio::test]
    async fn test_summary_keeps_peer_order_when_replies_arrive_out_of_order() {
        let directory = StaticDirectory::new(vec![
            agent("Agent B", "http://127.0.0.1:8002"),
            agent("Agent C", "http://127.0.0.1:8003"),
            agent("Agent D", "http://127.0.0.1:8004"),
        ]);
        let messenger = ScriptedMessenger::new()
            .reply("http://127.0.0.1:8002", "slow B")
            .delay("http://127.0.0.1:8002", Duration::from_millis(200))
            .reply("http://127.0.0.1:8003", "medium C")
            .delay("http://127.0.0.1:8003", Duration::from_millis(100))
            .reply("http://127.0.0.1:8004", "fast D");

        let reply = handle("say hi to the other agents", &default_config(), &directory, &messenger)
            .await
            .unwrap();

        let position = |needle: &str| reply.text.find(needle).unwrap();
        assert!(position("- detected Agent B") < position("- detected Agent C"));
        assert!(position("- detected Agent C") < position("- detected Agent D"));
        assert!(position("- contact Agent B") < position("- contact Agent C"));
        assert!(position("- contact Agent C") < position("- contact Agent D"));
        assert!(position("  | slow B") < position("  | medium C"));
        assert!(position("  | medium C") < position("  | fast D"));
    }

    #[test]
    fn test_reachable_peers_excludes_self_and_visited() {
        let discovered = vec![
            agent("Self", "http://a:1/"),
            agent("Visited", "http://b:2"),
            agent("Fresh", " http://c:3 "),
            agent("Blank", "  "),
        ];
        let reachable = reachable_peers(&discovered, Some("http://a:1"), &["http://b:2".to_string()]);
        assert_eq!(reachable.len(), 1);
        assert_eq!(reachable[0].name, "Fresh");

        let reachable = reachable_peers(&discovered, None, &[]);
        assert_eq!(reachable.len(), 3);
    }

    #[test]
    fn test_no_discovery_message_names_variable() {
        assert!(no_discovery_message().contains("PARLEY_DISCOVERY_URLS"));
    }
}
