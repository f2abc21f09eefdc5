//! Keyword classification of user text into a reply category.

use solace_core::message::ReplyCategory;

/// Checked in this order; the first family with a hit wins.
const RULES: &[(ReplyCategory, &[&str])] = &[
    (
        ReplyCategory::EmotionalSupport,
        &["难过", "伤心", "痛苦", "孤独", "害怕", "焦虑", "抑郁"],
    ),
    (
        ReplyCategory::CognitiveGuidance,
        &["想法", "思考", "认为", "觉得", "担心", "困惑"],
    ),
    (
        ReplyCategory::BehavioralAdvice,
        &["怎么办", "如何", "方法", "建议", "帮助", "改善"],
    ),
    (
        ReplyCategory::InformationGathering,
        &["?", "？", "什么", "为什么", "哪里"],
    ),
];

/// Texts longer than this with no keyword hit are treated as reflective.
const LONG_TEXT_CHARS: usize = 50;

/// Pick the category a reply to `text` should come from.
///
/// Blank text asks for more information; otherwise keyword families are
/// tried in priority order, then long texts get cognitive guidance and
/// everything else emotional support.
pub fn classify(text: &str) -> ReplyCategory {
    let text = text.trim();
    if text.is_empty() {
        return ReplyCategory::InformationGathering;
    }

    let lower = text.to_lowercase();
    for (category, keywords) in RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *category;
        }
    }

    if text.chars().count() > LONG_TEXT_CHARS {
        ReplyCategory::CognitiveGuidance
    } else {
        ReplyCategory::EmotionalSupport
    }
}
