//! Relay envelope codec
//!
//! An envelope is `A2A_AUTONOMY::` followed by a compact JSON object. Decoding
//! only rejects text that lacks the prefix or whose payload is not a JSON
//! object; individual fields fall back to defaults.

use serde_json::{Map, Value, json};

use super::AutonomousRequest;
use crate::directory::normalize_url_list;

pub const AUTONOMOUS_REQUEST_PREFIX: &str = "A2A_AUTONOMY::";

const DEFAULT_OBJECTIVE: &str = "relay message";
const DEFAULT_ORIGIN_NAME: &str = "Unknown Agent";

pub fn encode_request(request: &AutonomousRequest) -> String {
    let payload = json!({
        "objective": request.objective,
        "origin_name": request.origin_name,
        "origin_url": request.origin_url,
        "remaining_hops": request.remaining_hops,
        "visited_urls": request.visited_urls,
        "relay_id": request.relay_id,
    });
    format!("{}{}", AUTONOMOUS_REQUEST_PREFIX, payload)
}

pub fn decode_request(text: &str) -> Option<AutonomousRequest> {
    let payload = text.trim().strip_prefix(AUTONOMOUS_REQUEST_PREFIX)?;
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(payload) else {
        return None;
    };

    let objective = text_field(&fields, "objective");
    let origin_name = text_field(&fields, "origin_name");

    Some(AutonomousRequest {
        objective: if objective.is_empty() {
            DEFAULT_OBJECTIVE.to_string()
        } else {
            objective
        },
        origin_name: if origin_name.is_empty() {
            DEFAULT_ORIGIN_NAME.to_string()
        } else {
            origin_name
        },
        origin_url: text_field(&fields, "origin_url"),
        remaining_hops: hops_field(fields.get("remaining_hops")),
        visited_urls: match fields.get("visited_urls") {
            Some(Value::Array(items)) => normalize_url_list(items.iter().map(value_text)),
            _ => Vec::new(),
        },
        relay_id: text_field(&fields, "relay_id"),
    })
}

/// Trimmed textual form of a field; missing or null is empty
fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .map(value_text)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Integer or numeric string, negatives clamped to 0, anything else 0
fn hops_field(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Some(Value::String(s)) => s.trim().parse::<i128>().ok(),
        _ => None,
    };
    parsed.map_or(0, |n| n.clamp(0, i128::from(u32::MAX)) as u32)
}
