//! Word lists used by the quality heuristics.

/// Content that must never be recommended.
pub const UNSAFE_KEYWORDS: &[&str] = &[
    "自杀", "自残", "伤害", "杀人", "毒品", "违法", "犯罪",
    "酒精", "赌博", "吸毒", "暴力", "色情", "歧视",
];

/// Phrasings that turn an unsafe keyword into advice: `{kw}建议`,
/// `可以{kw}`, `应该{kw}`, `试试{kw}`.
pub const ADVICE_PREFIXES: &[&str] = &["可以", "应该", "试试"];
pub const ADVICE_SUFFIX: &str = "建议";

pub const SAFETY_DISCLAIMERS: &[&str] = &["专业医疗", "咨询医生", "不构成医疗建议", "专业帮助"];

pub const PROFESSIONAL_TERMS: &[&str] = &[
    "认知行为疗法", "心理治疗", "精神分析", "焦虑障碍", "抑郁症",
    "心理健康", "情绪调节", "应激反应", "创伤后应激障碍", "心理咨询",
];

pub const ABSOLUTE_TERMS: &[&str] = &["一定", "绝对", "肯定"];

// ── Relevance, template replies ─────────────────────────────

pub const EMOTIONAL_CUES: &[&str] = &[
    "难过", "伤心", "痛苦", "孤独", "害怕", "焦虑", "抑郁", "情绪", "感觉", "心情",
];
pub const COGNITIVE_CUES: &[&str] = &[
    "想法", "思考", "认为", "觉得", "担心", "困惑", "理解", "明白",
];
pub const ADVICE_CUES: &[&str] = &[
    "怎么办", "如何", "方法", "建议", "帮助", "改善", "解决", "处理",
];
pub const QUESTION_CUES: &[&str] = &["?", "？", "什么", "如何", "为什么"];

pub const COUNSELING_MARKERS: &[&str] = &["理解", "感受", "支持", "帮助"];

// ── Relevance, live replies ─────────────────────────────────

pub const SIMPLE_GREETINGS: &[&str] = &[
    "你好", "您好", "hi", "hello", "嗨", "哈喽", "早上好", "下午好", "晚上好",
    "你好吗", "您好吗", "在吗", "在不在",
];

pub const GREETING_REPLY_MARKERS: &[&str] = &["你好", "您好", "欢迎", "很高兴", "帮助", "服务"];

pub const STOP_WORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个",
    "上", "也", "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好",
    "自己", "这",
];

/// Token separators for keyword extraction.
pub const SEPARATORS: &[char] = &[
    ',', '.', '!', '?', ';', ':', '，', '。', '！', '？', '；', '：', '、',
    '(', ')', '（', '）', '[', ']', '【', '】', '{', '}',
];

// ── Emotional appropriateness ───────────────────────────────

pub const EMPATHY_MARKERS: &[&str] = &["理解", "感受", "明白", "共情"];
pub const NEGATIVE_AFFECT: &[&str] = &["难过", "伤心", "痛苦", "焦虑", "抑郁", "绝望"];
pub const NEGATIVE_HINTS: &[&str] = &["负面", "消极"];
pub const COMFORT_MARKERS: &[&str] = &["支持", "鼓励", "希望", "相信", "陪伴", "会好"];

// ── Completeness ────────────────────────────────────────────

pub const CLOSING_PHRASES: &[&str] = &["希望能帮到你", "祝你", "如有其他问题", "期待"];
pub const GREETING_PHRASES: &[&str] = &["你好", "您好", "欢迎", "很高兴"];

/// True when `text` contains any of `words`.
pub fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}
