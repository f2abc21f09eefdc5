//! Plain-text conversation summaries.

use solace_core::message::{ContextEntry, Speaker};

/// Returned when a conversation has no context at all.
pub const EMPTY_SUMMARY: &str = "暂无对话历史";

/// Topic families, in reporting order. A topic is reported when any user
/// entry contains one of its trigger words.
const TOPICS: &[(&str, &[&str])] = &[
    ("工作相关问题", &["工作", "职场"]),
    ("家庭关系", &["家庭", "父母", "孩子"]),
    ("人际关系", &["朋友", "同事", "人际"]),
    ("焦虑情绪", &["焦虑", "紧张", "担心"]),
    ("抑郁情绪", &["抑郁", "难过", "伤心"]),
];

/// Topics mentioned by the user, in fixed order, without duplicates.
pub fn extract_topics(entries: &[ContextEntry]) -> Vec<&'static str> {
    TOPICS
        .iter()
        .filter(|(_, triggers)| {
            entries
                .iter()
                .filter(|e| e.speaker == Speaker::User)
                .any(|e| triggers.iter().any(|t| e.text.contains(t)))
        })
        .map(|(topic, _)| *topic)
        .collect()
}

/// Render a summary of `entries`.
pub fn summarize_entries(entries: &[ContextEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }

    let user = entries.iter().filter(|e| e.speaker == Speaker::User).count();
    let ai = entries.len() - user;

    let mut summary = String::from("对话摘要：\n");
    summary.push_str(&format!(
        "共 {} 条消息（用户消息：{}，AI回复：{}）\n",
        entries.len(),
        user,
        ai
    ));

    let topics = extract_topics(entries);
    if !topics.is_empty() {
        summary.push_str("关键要点：\n");
        for topic in topics {
            summary.push_str("- ");
            summary.push_str(topic);
            summary.push('\n');
        }
    }

    summary
}
