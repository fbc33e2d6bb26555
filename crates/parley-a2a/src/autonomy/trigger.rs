//! Decides whether a chat turn starts (or continues) autonomous outreach

use super::AutonomousRequest;
use super::envelope::{AUTONOMOUS_REQUEST_PREFIX, decode_request};

const JA_TARGETS: &[&str] = &["他のagent", "他のエージェント"];
const JA_ACTIONS: &[&str] = &["挨拶", "話しかけ", "会話", "検出", "見つけ", "探して"];
const EN_TARGETS: &[&str] = &["other agent", "other agents", "peer agent"];
const EN_ACTIONS: &[&str] = &["greet", "talk", "message", "say hi", "discover", "detect", "find"];

/// Classification of an inbound chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// An encoded relay envelope from another agent
    Relay(AutonomousRequest),
    /// A human asking this agent to reach out to its peers
    HumanTrigger,
    /// Ordinary chat
    Ignore,
}

pub fn classify(text: &str) -> Trigger {
    if let Some(request) = decode_request(text) {
        return Trigger::Relay(request);
    }
    if is_human_trigger(text) {
        Trigger::HumanTrigger
    } else {
        Trigger::Ignore
    }
}

fn is_human_trigger(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.starts_with(AUTONOMOUS_REQUEST_PREFIX) {
        return false;
    }

    if contains_any(text, JA_TARGETS) && contains_any(text, JA_ACTIONS) {
        return true;
    }

    let lowered = text.to_lowercase();
    contains_any(&lowered, EN_TARGETS) && contains_any(&lowered, EN_ACTIONS)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
