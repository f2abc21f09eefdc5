//! Importance weighting for context entries.
//!
//! weight = recency × length × speaker × keyword, floored at [`MIN_WEIGHT`].

use chrono::{DateTime, Utc};
use solace_core::message::{ContextEntry, Speaker};

pub const MIN_WEIGHT: f64 = 0.1;

/// Recency decays by a factor of e per day.
const DECAY_PERIOD_MS: f64 = 86_400_000.0;

/// Length factor saturates at 200 characters.
const MAX_LENGTH_FACTOR: f64 = 2.0;

const USER_FACTOR: f64 = 1.2;
const KEYWORD_FACTOR: f64 = 1.5;

/// Terms that mark an entry as clinically or personally significant.
pub const IMPORTANT_KEYWORDS: &[&str] = &[
    "抑郁", "焦虑", "自杀", "自害", "痛苦", "绝望",
    "治疗", "药物", "医生", "心理", "咨询",
    "家庭", "工作", "学习", "人际关系",
];

/// Weight of `entry` as of now.
pub fn importance_weight(entry: &ContextEntry) -> f64 {
    importance_weight_at(entry, Utc::now())
}

/// Weight of `entry` as of `now`. Timestamps in the future count as age zero.
pub fn importance_weight_at(entry: &ContextEntry, now: DateTime<Utc>) -> f64 {
    let age_ms = (now - entry.timestamp).num_milliseconds().max(0) as f64;
    let mut weight = (-age_ms / DECAY_PERIOD_MS).exp();

    let chars = entry.text.chars().count() as f64;
    weight *= (chars / 100.0).min(MAX_LENGTH_FACTOR);

    if entry.speaker == Speaker::User {
        weight *= USER_FACTOR;
    }

    if contains_important_keyword(&entry.text) {
        weight *= KEYWORD_FACTOR;
    }

    weight.max(MIN_WEIGHT)
}

fn contains_important_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    IMPORTANT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
