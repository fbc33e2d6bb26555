//! Plain-text report of one outreach pass

use super::outreach::PeerOutcome;
use super::{AutonomousRequest, AutonomyConfig};
use crate::directory::DiscoveredAgent;

pub const MAX_RESPONSE_PREVIEW_LINES: usize = 6;
pub const MAX_RESPONSE_PREVIEW_CHARS: usize = 1_200;

const EMPTY_MARKER: &str = "(empty)";
const TRUNCATED_MARKER: &str = "(truncated)";

pub fn render_summary(
    config: &AutonomyConfig,
    request: &AutonomousRequest,
    discovered: &[DiscoveredAgent],
    outcomes: &[PeerOutcome],
) -> String {
    let mut lines = vec![
        "Autonomous outreach summary".to_string(),
        format!("relay_id: {}", request.relay_id),
        format!("agent: {}", config.agent_name),
        format!("self: {}", config.self_url.as_deref().unwrap_or("unknown")),
        format!("objective: {}", request.objective),
        format!(
            "origin: {} ({})",
            request.origin_name,
            or_unknown(&request.origin_url)
        ),
        format!("remaining_hops={}", request.remaining_hops),
        format!("detected agents: {}", discovered.len()),
        format!("reachable peers: {}", outcomes.len()),
        format!("contacted peers: {}", outcomes.len()),
    ];

    if request.remaining_hops == 0 {
        lines.push("note: remaining_hops=0, no further outreach performed.".to_string());
    }

    for agent in discovered {
        lines.push(format!("- detected {} ({})", agent.name, agent.url));
    }

    for outcome in outcomes {
        let peer = &outcome.peer;
        match &outcome.result {
            Ok(response) => {
                lines.push(format!("- contact {} ({}): OK", peer.name, peer.url));
                lines.extend(response_preview(response).into_iter().map(|l| format!("  | {}", l)));
            }
            Err(e) => lines.push(format!("- contact {} ({}): ERROR {:#}", peer.name, peer.url, e)),
        }
    }

    lines.join("\n")
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "unknown" } else { value }
}

/// Clip a reply to a bounded number of characters and lines
pub fn response_preview(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![EMPTY_MARKER.to_string()];
    }

    let mut clipped = false;
    let mut body: String = text.to_string();
    if text.chars().count() > MAX_RESPONSE_PREVIEW_CHARS {
        body = text.chars().take(MAX_RESPONSE_PREVIEW_CHARS).collect();
        body.push_str("...");
        clipped = true;
    }

    let mut lines: Vec<String> = split_lines(&body)
        .into_iter()
        .map(|l| l.trim_end().to_string())
        .collect();
    if lines.len() > MAX_RESPONSE_PREVIEW_LINES {
        lines.truncate(MAX_RESPONSE_PREVIEW_LINES);
        clipped = true;
    }

    if clipped {
        lines.push(TRUNCATED_MARKER.to_string());
    }
    if lines.is_empty() {
        lines.push(EMPTY_MARKER.to_string());
    }
    lines
}

/// Split on every line boundary, `\r\n` counting once; a trailing break adds no line
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' && matches!(chars.peek(), Some((_, '\n'))) {
            chars.next();
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}
