//! The literal text sent to each peer during outreach

const GREETING_KEYWORDS: &[&str] = &["挨拶", "greet", "話しかけ", "talk", "say hi", "hello", "こんにちは"];

pub fn build_conversation_message(objective: &str, origin_name: &str) -> String {
    let lowered = objective.to_lowercase();
    if GREETING_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return format!("こんにちは！{}からの挨拶です。よろしくお願いします！", origin_name);
    }
    format!("{}からのメッセージ: {}", origin_name, objective)
}
