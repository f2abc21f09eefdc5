//! Template provider: canned counseling replies, no network.
//!
//! Useful for development, demos and as a stand-in when no API key is
//! available. Replies are picked at random from a per-category pool, with
//! a simulated generation delay.

use async_trait::async_trait;
use chrono::Timelike;
use rand::Rng;
use rand::seq::IndexedRandom;
use solace_config::TemplateConfig;
use solace_core::error::ProviderError;
use solace_core::message::{Reply, ReplyCategory, ReplyRequest};
use solace_core::provider::{Provider, ProviderKind};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::classify::classify;

const PROVIDER_NAME: &str = "template";

/// Probability of opening with a category-specific lead-in.
const PREFIX_PROBABILITY: f64 = 0.3;

/// Probability of appending a closing line.
const ENDING_PROBABILITY: f64 = 0.2;

const EMOTIONAL_TEMPLATES: &[&str] = &[
    "{user}，我能理解你现在的感受，这些情绪都是真实而重要的。我会在这里陪伴你，慢慢说就好。",
    "在这个{time}，谢谢你愿意把心里的话说出来。你的感受值得被认真对待，我会支持你。",
    "听起来你承受了不少压力，感到难受是很正常的。试着先深呼吸几次，让自己稍微放松一下。",
    "你并不孤单，很多人都曾有过类似的感受。愿意说出来已经是很勇敢的一步了。",
    "我明白这段时间对你来说不容易。给自己一点耐心，情绪会慢慢平复，事情也会好起来的。",
    "谢谢你的信任。无论你现在感受到什么，都可以在这里说出来，我会认真倾听。",
    "这种感觉真的很辛苦。请记得照顾好自己，好好休息，需要的时候也可以向身边信任的人寻求支持。",
    "我能感受到你话语里的疲惫。先不用急着解决所有问题，我们可以一点一点来梳理。",
];

const COGNITIVE_TEMPLATES: &[&str] = &[
    "你提到的想法很值得探讨。我们可以一起看看，这个想法背后有哪些证据，又有哪些其他的可能性。",
    "有时候我们的大脑会自动往最坏的方向想。试着问问自己：如果朋友遇到同样的情况，你会怎么对他说？",
    "{user}，换个角度看待这件事也许会有新的发现。你觉得还有哪些解释是你之前没有考虑到的？",
    "担心和困惑往往来自不确定感。我们可以先把能控制的部分和不能控制的部分分开来看。",
    "你对自己的要求似乎很高。完美并不是唯一的标准，尽力而为同样值得认可。",
    "注意到这些想法本身就是改变的开始。下次它们出现时，可以试着把它们写下来，再冷静地审视一遍。",
    "我理解你为什么会这样想。不过想法并不等于事实，我们可以慢慢区分两者。",
    "在这个{time}静下心来想一想：这件事一年后回头看，它还会像现在这样重要吗？",
];

const BEHAVIORAL_TEMPLATES: &[&str] = &[
    "可以尝试每天留出十分钟做深呼吸或冥想练习，这对缓解紧张情绪很有帮助。",
    "建立规律的作息很重要：固定时间睡觉和起床，白天适当运动，晚上少看手机。",
    "{user}，不妨把大问题拆分成几个小目标，每完成一个就给自己一点鼓励。",
    "和信任的朋友或家人聊一聊，把感受说出来，往往能让心里轻松许多。",
    "试着记录每天的情绪变化和触发事件，一段时间后你可能会发现其中的规律。",
    "适度的运动，比如散步、慢跑或瑜伽，能有效改善情绪和睡眠质量。",
    "如果这些困扰持续影响到你的生活，寻求专业心理咨询师的帮助是很好的选择。",
    "这个{time}可以给自己安排一件喜欢的小事，比如听音乐、看书或者泡一杯热茶。",
];

const INFORMATION_TEMPLATES: &[&str] = &[
    "能多和我说说具体发生了什么吗？这样我可以更好地理解你的处境。",
    "这种情况持续多久了？最近有没有什么特别的事情让你印象深刻？",
    "{user}，你希望从我们的谈话中获得什么样的帮助呢？",
    "当这种感觉出现的时候，你通常会做些什么来应对？",
    "你身边有可以倾诉的人吗？他们知道你现在的状况吗？",
    "在这个{time}，你最想聊的是哪一方面：工作、生活还是人际关系？",
    "你提到的问题很重要。可以说说它对你的日常生活有哪些影响吗？",
    "为了更好地帮助你，我想了解一下：最近你的睡眠和饮食情况怎么样？",
];

const EMOTIONAL_PREFIXES: &[&str] = &["听你这么说，", "谢谢你愿意分享。", "从你的话里，我感受到了你的不容易。"];
const COGNITIVE_PREFIXES: &[&str] = &["关于你提到的想法，", "从你的描述来看，", "针对你现在的思考，"];
const BEHAVIORAL_PREFIXES: &[&str] = &["结合你的情况，", "考虑到你的需要，", "针对你的问题，"];
const INFORMATION_PREFIXES: &[&str] = &["为了更好地了解你，", "让我们再深入一点。", "关于你的疑问，"];

const ENDINGS: &[&str] = &[
    "希望这对你有所帮助。",
    "如果还有其他想法，随时可以告诉我。",
    "我们可以继续聊下去。",
    "你并不孤单，我会一直陪伴你。",
    "相信你有能力慢慢走出来。",
    "期待听到你的更多想法。",
];

fn templates_for(category: ReplyCategory) -> &'static [&'static str] {
    match category {
        ReplyCategory::EmotionalSupport | ReplyCategory::Fallback => EMOTIONAL_TEMPLATES,
        ReplyCategory::CognitiveGuidance => COGNITIVE_TEMPLATES,
        ReplyCategory::BehavioralAdvice => BEHAVIORAL_TEMPLATES,
        ReplyCategory::InformationGathering => INFORMATION_TEMPLATES,
    }
}

fn prefixes_for(category: ReplyCategory) -> &'static [&'static str] {
    match category {
        ReplyCategory::EmotionalSupport => EMOTIONAL_PREFIXES,
        ReplyCategory::CognitiveGuidance => COGNITIVE_PREFIXES,
        ReplyCategory::BehavioralAdvice => BEHAVIORAL_PREFIXES,
        ReplyCategory::InformationGathering => INFORMATION_PREFIXES,
        ReplyCategory::Fallback => &[],
    }
}

/// Part of the day for a 24-hour clock hour.
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        0..6 => "深夜",
        6..12 => "上午",
        12..18 => "下午",
        _ => "晚上",
    }
}

/// Build a reply for `category`: random template, placeholders filled,
/// optional lead-in and closing line.
pub fn compose<R: Rng + ?Sized>(category: ReplyCategory, hour: u32, rng: &mut R) -> String {
    let template = templates_for(category)
        .choose(rng)
        .copied()
        .unwrap_or(EMOTIONAL_TEMPLATES[0]);

    let mut text = template
        .replace("{user}", "朋友")
        .replace("{time}", time_of_day(hour));

    if rng.random_bool(PREFIX_PROBABILITY) {
        if let Some(prefix) = prefixes_for(category).choose(rng) {
            text.insert_str(0, prefix);
        }
    }

    if rng.random_bool(ENDING_PROBABILITY) {
        if let Some(ending) = ENDINGS.choose(rng) {
            text.push_str(ending);
        }
    }

    text
}

/// Canned-reply provider.
pub struct TemplateProvider {
    enabled: bool,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl TemplateProvider {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            enabled: config.enabled,
            min_latency_ms: config.min_latency_ms,
            max_latency_ms: config.max_latency_ms.max(config.min_latency_ms),
        }
    }

    /// A provider that replies without simulated delay.
    pub fn instant() -> Self {
        Self {
            enabled: true,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }

    fn simulated_latency(&self) -> Duration {
        let ms = if self.max_latency_ms == 0 {
            0
        } else {
            rand::rng().random_range(self.min_latency_ms..=self.max_latency_ms)
        };
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl Provider for TemplateProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Template
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply, ProviderError> {
        let started = Instant::now();

        let delay = self.simulated_latency();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let category = classify(&request.user_text);
        let text = compose(category, chrono::Local::now().hour(), &mut rand::rng());
        let token_count = text.chars().count() / 4;

        debug!(
            provider = PROVIDER_NAME,
            category = %category,
            context = request.context.len(),
            "Generated template reply"
        );

        Ok(Reply::success(text, category, PROVIDER_NAME, ProviderKind::Template)
            .with_latency(started.elapsed().as_millis() as u64)
            .with_metadata("token_count", serde_json::json!(token_count)))
    }

    fn is_healthy(&self) -> bool {
        self.enabled
    }

    fn describe_config(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut info = serde_json::Map::new();
        info.insert("provider".into(), PROVIDER_NAME.into());
        info.insert("enabled".into(), self.enabled.into());
        info.insert(
            "template_types".into(),
            serde_json::json!([
                ReplyCategory::EmotionalSupport.as_str(),
                ReplyCategory::CognitiveGuidance.as_str(),
                ReplyCategory::BehavioralAdvice.as_str(),
                ReplyCategory::InformationGathering.as_str(),
            ]),
        );
        info.insert("min_latency_ms".into(), self.min_latency_ms.into());
        info.insert("max_latency_ms".into(), self.max_latency_ms.into());
        info.insert("version".into(), env!("CARGO_PKG_VERSION").into());
        info
    }
}
