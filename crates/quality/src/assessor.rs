//! The quality assessor.

use serde::Serialize;
use solace_core::message::{Reply, ReplyCategory, ReplyRequest};
use solace_core::provider::ProviderKind;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::lexicon::*;

/// Score used when a dimension has nothing to measure.
pub const NEUTRAL_SCORE: u8 = 50;

/// Per-dimension scores behind a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityBreakdown {
    pub relevance: u8,
    pub professionalism: u8,
    pub emotional: u8,
    pub safety: u8,
    pub completeness: u8,
    pub total: u8,
}

impl QualityBreakdown {
    fn from_dimensions(
        relevance: u8,
        professionalism: u8,
        emotional: u8,
        safety: u8,
        completeness: u8,
    ) -> Self {
        // Integer weights in percent; truncating division.
        let weighted = u32::from(relevance) * 30
            + u32::from(professionalism) * 20
            + u32::from(emotional) * 20
            + u32::from(safety) * 20
            + u32::from(completeness) * 10;
        Self {
            relevance,
            professionalism,
            emotional,
            safety,
            completeness,
            total: (weighted / 100) as u8,
        }
    }
}

/// `score >= min`.
pub fn is_passing(score: u8, min: u8) -> bool {
    score >= min
}

fn clamp(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Heuristic reply scorer. Stateless and infallible.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor;

impl QualityAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Score the reply and record the total on it.
    ///
    /// Failed or empty replies score 0 and are left untouched.
    pub fn assess(&self, request: &ReplyRequest, reply: &mut Reply) -> u8 {
        if !reply.has_content() {
            warn!(provider = %reply.provider_name, "Cannot assess quality of a failed or empty reply");
            return 0;
        }

        let breakdown = self.assess_breakdown(request, reply);
        debug!(
            total = breakdown.total,
            relevance = breakdown.relevance,
            professionalism = breakdown.professionalism,
            emotional = breakdown.emotional,
            safety = breakdown.safety,
            completeness = breakdown.completeness,
            "Quality assessed"
        );

        reply.quality_score = Some(breakdown.total);
        breakdown.total
    }

    /// All five dimensions and their weighted total, without touching the reply.
    pub fn assess_breakdown(&self, request: &ReplyRequest, reply: &Reply) -> QualityBreakdown {
        QualityBreakdown::from_dimensions(
            self.relevance(request, reply),
            self.professionalism(reply),
            self.emotional_appropriateness(request, reply),
            self.safety(reply),
            self.completeness(reply),
        )
    }

    pub fn relevance(&self, request: &ReplyRequest, reply: &Reply) -> u8 {
        if request.user_text.trim().is_empty() {
            return NEUTRAL_SCORE;
        }
        match reply.provider_kind {
            ProviderKind::Live => live_relevance(&request.user_text, &reply.text),
            ProviderKind::Template | ProviderKind::Fallback => {
                template_relevance(&request.user_text, reply)
            }
        }
    }

    pub fn professionalism(&self, reply: &Reply) -> u8 {
        let text = &reply.text;
        let mut score: i32 = 70;

        let terms = PROFESSIONAL_TERMS.iter().filter(|t| text.contains(*t)).count() as i32;
        score += (terms * 5).min(20);

        let len = char_len(text);
        if len < 50 {
            score -= 20;
        } else if len > 200 {
            score += 10;
        }

        if contains_any(text, ABSOLUTE_TERMS) {
            score -= 10;
        }

        clamp(score)
    }

    pub fn emotional_appropriateness(&self, request: &ReplyRequest, reply: &Reply) -> u8 {
        let text = &reply.text;
        let mut score: i32 = 70;

        if contains_any(text, EMPATHY_MARKERS) {
            score += 15;
        }

        let negative = contains_any(&request.user_text, NEGATIVE_AFFECT)
            || request
                .emotional_hint
                .as_deref()
                .is_some_and(|hint| contains_any(hint, NEGATIVE_HINTS));

        if negative {
            if contains_any(text, COMFORT_MARKERS) {
                score += 15;
            } else {
                score -= 20;
            }
        }

        clamp(score)
    }

    pub fn safety(&self, reply: &Reply) -> u8 {
        let text = &reply.text;
        let mut score: i32 = 100;

        for keyword in UNSAFE_KEYWORDS.iter().filter(|kw| text.contains(*kw)) {
            let as_advice = text.contains(&format!("{keyword}{ADVICE_SUFFIX}"))
                || ADVICE_PREFIXES
                    .iter()
                    .any(|prefix| text.contains(&format!("{prefix}{keyword}")));

            if as_advice {
                warn!(keyword, "Potentially harmful advice detected");
                score -= 50;
            } else {
                score -= 10;
            }
        }

        if contains_any(text, SAFETY_DISCLAIMERS) {
            score += 10;
        }

        clamp(score)
    }

    pub fn completeness(&self, reply: &Reply) -> u8 {
        let text = &reply.text;
        let mut score: i32 = match char_len(text) {
            0..10 => 40,
            10..20 => 60,
            20..50 => 70,
            50..100 => 80,
            100..200 => 90,
            _ => 95,
        };

        if contains_any(text, CLOSING_PHRASES) {
            score += 5;
        }
        if contains_any(text, GREETING_PHRASES) {
            score += 10;
        }

        clamp(score)
    }
}

/// Canned replies are judged by whether the user's wording fits the
/// category the template was picked from.
fn template_relevance(user_text: &str, reply: &Reply) -> u8 {
    let mut score: i32 = 75;

    let user_lower = user_text.to_lowercase();
    let cues = match reply.category {
        Some(ReplyCategory::EmotionalSupport) => Some(EMOTIONAL_CUES),
        Some(ReplyCategory::CognitiveGuidance) => Some(COGNITIVE_CUES),
        Some(ReplyCategory::BehavioralAdvice) => Some(ADVICE_CUES),
        Some(ReplyCategory::InformationGathering) => Some(QUESTION_CUES),
        Some(ReplyCategory::Fallback) | None => None,
    };
    if cues.is_some_and(|cues| contains_any(&user_lower, cues)) {
        score += 15;
    }

    if contains_any(&reply.text, COUNSELING_MARKERS) {
        score += 10;
    }
    if char_len(&reply.text) > 30 {
        score += 5;
    }

    clamp(score)
}

fn live_relevance(user_text: &str, reply_text: &str) -> u8 {
    let user_lower = user_text.trim().to_lowercase();
    let reply_lower = reply_text.to_lowercase();

    if SIMPLE_GREETINGS.contains(&user_lower.as_str()) {
        return if contains_any(&reply_lower, GREETING_REPLY_MARKERS) { 85 } else { 70 };
    }

    let user_keywords = extract_keywords(&user_lower);
    let reply_keywords = extract_keywords(&reply_lower);

    let mut score: i32 = if user_keywords.is_empty() {
        70
    } else {
        let matched = user_keywords.intersection(&reply_keywords).count();
        ((matched * 100) / user_keywords.len()).min(100) as i32
    };

    let is_question = user_text.contains('?') || user_text.contains('？');
    if is_question && char_len(reply_text) <= 50 {
        score = (score - 30).max(10);
    }

    clamp(score)
}

/// Split on whitespace and punctuation; keep multi-character non-stop-words.
fn extract_keywords(text: &str) -> HashSet<&str> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .map(str::trim)
        .filter(|w| char_len(w) > 1 && !STOP_WORDS.contains(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> ReplyRequest {
        ReplyRequest::new("u1", "c1", text)
    }

    fn template_reply(text: &str, category: ReplyCategory) -> Reply {
        Reply::success(text, category, "template", ProviderKind::Template)
    }

    fn live_reply(text: &str) -> Reply {
        Reply::success(text, ReplyCategory::EmotionalSupport, "deepseek", ProviderKind::Live)
    }

    #[test]
    fn failed_reply_scores_zero() {
        let assessor = QualityAssessor::new();
        let mut reply = Reply::failure("boom", "deepseek", ProviderKind::Live);
        assert_eq!(assessor.assess(&request("你好"), &mut reply), 0);
        assert_eq!(reply.quality_score, None);
    }

    #[test]
    fn empty_text_scores_zero() {
        let assessor = QualityAssessor::new();
        let mut reply = live_reply("");
        assert_eq!(assessor.assess(&request("你好"), &mut reply), 0);
    }

    #[test]
    fn assess_writes_total_back() {
        let assessor = QualityAssessor::new();
        let mut reply = template_reply(
            "我能理解你现在的感受，焦虑是很常见的情绪，我会一直陪伴和支持你。",
            ReplyCategory::EmotionalSupport,
        );
        let score = assessor.assess(&request("我感到很焦虑，不知道该怎么办"), &mut reply);
        assert_eq!(reply.quality_score, Some(score));
        assert!(score >= 60, "score was {score}");
    }

    #[test]
    fn weighted_total_truncates() {
        // 90*.3 + 50*.2 + 100*.2 + 100*.2 + 71*.1 = 27 + 10 + 20 + 20 + 7.1
        let b = QualityBreakdown::from_dimensions(90, 50, 100, 100, 71);
        assert_eq!(b.total, 84);
    }

    #[test]
    fn scores_stay_in_bounds() {
        let assessor = QualityAssessor::new();
        let jargon = "认知行为疗法心理治疗精神分析焦虑障碍抑郁症心理健康情绪调节".repeat(10);
        let texts = [
            "",
            "好",
            "你可以自杀，应该吸毒，试试赌博，暴力建议，色情歧视犯罪违法杀人伤害自残毒品酒精",
            jargon.as_str(),
        ];
        for text in texts {
            for reply in [live_reply(text), template_reply(text, ReplyCategory::Fallback)] {
                let b = assessor.assess_breakdown(&request("为什么我总是难过？"), &reply);
                for s in [b.relevance, b.professionalism, b.emotional, b.safety, b.completeness, b.total] {
                    assert!(s <= 100);
                }
            }
        }
    }

    #[test]
    fn template_relevance_rewards_matching_category() {
        let assessor = QualityAssessor::new();
        let reply = template_reply("我理解你", ReplyCategory::EmotionalSupport);
        // 75 + 15 (emotional cue) + 10 (理解)
        assert_eq!(assessor.relevance(&request("我很孤独"), &reply), 100);
        // no cue for the category
        assert_eq!(assessor.relevance(&request("今天吃了面条"), &reply), 85);
    }

    #[test]
    fn template_relevance_question_category() {
        let assessor = QualityAssessor::new();
        let reply = template_reply("能多说一点吗", ReplyCategory::InformationGathering);
        assert_eq!(assessor.relevance(&request("这是什么"), &reply), 90);
    }

    #[test]
    fn greeting_relevance() {
        let assessor = QualityAssessor::new();
        assert_eq!(assessor.relevance(&request("  Hello "), &live_reply("你好！很高兴见到你")), 85);
        assert_eq!(assessor.relevance(&request("在吗"), &live_reply("嗯")), 70);
    }

    #[test]
    fn keyword_overlap_relevance() {
        let assessor = QualityAssessor::new();
        // user keywords: {最近, 失眠严重} ; reply shares one
        let reply = live_reply("最近 压力 确实 会 影响 睡眠，这种情况很常见，建议规律作息并适当运动，如果持续可以寻求专业帮助。");
        assert_eq!(assessor.relevance(&request("最近 失眠严重"), &reply), 50);
    }

    #[test]
    fn unanswered_question_is_penalised() {
        let assessor = QualityAssessor::new();
        // no shared keywords: 0 - 30 floored at 10
        assert_eq!(assessor.relevance(&request("什么 是 正念？"), &live_reply("嗯嗯")), 10);
        // only stop words: default 70 - 30
        assert_eq!(assessor.relevance(&request("我 的 ?"), &live_reply("好的")), 40);
    }

    #[test]
    fn blank_user_text_is_neutral() {
        let assessor = QualityAssessor::new();
        let req = ReplyRequest::new("u1", "c1", "   ");
        assert_eq!(assessor.relevance(&req, &live_reply("你好")), NEUTRAL_SCORE);
    }

    #[test]
    fn professionalism_rules() {
        let assessor = QualityAssessor::new();
        assert_eq!(assessor.professionalism(&live_reply("短回复")), 50);
        assert_eq!(assessor.professionalism(&live_reply("你一定会好的")), 40);

        let long = format!("认知行为疗法和心理治疗都有帮助。{}", "好".repeat(200));
        assert_eq!(assessor.professionalism(&live_reply(&long)), 90);
    }

    #[test]
    fn emotional_rules() {
        let assessor = QualityAssessor::new();
        let sad = request("我很难过");
        assert_eq!(assessor.emotional_appropriateness(&sad, &live_reply("我理解，我会陪伴你")), 100);
        assert_eq!(assessor.emotional_appropriateness(&sad, &live_reply("好的")), 50);

        let hinted = request("今天发生了一些事").with_emotional_hint("消极");
        assert_eq!(assessor.emotional_appropriateness(&hinted, &live_reply("好的")), 50);

        assert_eq!(assessor.emotional_appropriateness(&request("今天不错"), &live_reply("好的")), 70);
    }

    #[test]
    fn safety_distinguishes_mention_from_advice() {
        let assessor = QualityAssessor::new();
        assert_eq!(assessor.safety(&live_reply("请远离暴力")), 90);
        assert_eq!(assessor.safety(&live_reply("你可以赌博放松")), 50);
        assert_eq!(assessor.safety(&live_reply("如果有自残的念头，请寻求专业帮助")), 100);
        assert_eq!(assessor.safety(&live_reply("一切都好")), 100);
    }

    #[test]
    fn completeness_bands() {
        let assessor = QualityAssessor::new();
        assert_eq!(assessor.completeness(&live_reply("嗯")), 40);
        assert_eq!(assessor.completeness(&live_reply(&"好".repeat(15))), 60);
        assert_eq!(assessor.completeness(&live_reply(&"好".repeat(300))), 95);
        assert_eq!(assessor.completeness(&live_reply("你好，祝你一切顺利")), 55);
        assert_eq!(assessor.completeness(&live_reply(&format!("{}祝你好运", "好".repeat(296)))), 100);
    }

    #[test]
    fn passing_is_inclusive() {
        assert!(is_passing(60, 60));
        assert!(!is_passing(59, 60));
        assert!(is_passing(100, 0));
    }

    #[test]
    fn breakdown_serializes() {
        let b = QualityBreakdown::from_dimensions(80, 70, 60, 100, 90);
        let json = serde_json::to_value(b).unwrap();
        assert_eq!(json["total"], 79);
    }
}
