//! Keyword-based Chinese/English emotion detection for incoming text.
//!
//! Pure function: text in, candidate emotion + intensity + confidence out.
//! In production this would sit behind an ML sentiment model; the keyword
//! tables cover the conversational vocabulary the avatar actually sees.

use anima_core::Emotion;

/// Result of analyzing one message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSignal {
    pub emotion: Emotion,
    /// How strongly the emotion is expressed, in [0.1, 1.0].
    pub intensity: f32,
    /// How sure the keyword match is, in [0, 1].
    pub confidence: f32,
}

impl TextSignal {
    pub fn neutral() -> Self {
        Self {
            emotion: Emotion::Neutral,
            intensity: 0.1,
            confidence: 0.0,
        }
    }
}

/// Keyword groups per emotion. Order matters only for tie-breaking: the
/// first group with the highest match count wins.
const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Happy,
        &[
            "开心", "高兴", "快乐", "喜欢", "太棒", "真好", "不错", "happy", "glad", "great",
            "nice", "😊", "😄", "❤️",
        ],
    ),
    (
        Emotion::Excited,
        &[
            "兴奋", "超级", "激动", "等不及", "太厉害", "amazing", "awesome", "excited", "wow",
            "🎉",
        ],
    ),
    (
        Emotion::Sad,
        &[
            "难过", "伤心", "哭", "想哭", "委屈", "失落", "sad", "cry", "miss you", "😢", "💔",
        ],
    ),
    (
        Emotion::Angry,
        &[
            "生气", "气死", "讨厌", "烦死", "可恶", "恨", "angry", "hate", "annoying", "😡",
        ],
    ),
    (
        Emotion::Surprised,
        &[
            "天哪", "真的吗", "不会吧", "居然", "竟然", "没想到", "really?", "no way", "what?!",
            "😲",
        ],
    ),
    (
        Emotion::Fear,
        &["害怕", "好怕", "吓死", "恐怖", "可怕", "scared", "afraid", "terrified"],
    ),
    (
        Emotion::Disgust,
        &["恶心", "好恶", "反胃", "呕", "gross", "disgusting", "eww"],
    ),
    (
        Emotion::Anxious,
        &["紧张", "焦虑", "担心", "不安", "忐忑", "nervous", "anxious", "worried"],
    ),
    (
        Emotion::Loving,
        &["爱你", "亲爱的", "抱抱", "想你", "love you", "dear", "hug", "🥰"],
    ),
    (
        Emotion::Grateful,
        &["谢谢", "感谢", "多谢", "辛苦了", "thank", "thanks", "appreciate"],
    ),
    (
        Emotion::Bored,
        &["无聊", "好闷", "没意思", "发呆", "bored", "boring", "meh"],
    ),
    (
        Emotion::Confused,
        &["不懂", "不明白", "什么意思", "迷糊", "confused", "don't get it", "huh"],
    ),
    (
        Emotion::Curious,
        &["为什么", "怎么会", "好奇", "想知道", "curious", "wonder", "how come"],
    ),
    (
        Emotion::Lonely,
        &["孤单", "寂寞", "一个人", "没人", "lonely", "alone"],
    ),
    (
        Emotion::Embarrassed,
        &["尴尬", "害羞", "脸红", "不好意思", "embarrassed", "awkward", "blush"],
    ),
    (
        Emotion::Disappointed,
        &["失望", "可惜", "唉", "算了", "disappointed", "sigh", "oh well"],
    ),
    (
        Emotion::Calm,
        &["放松", "平静", "安心", "舒服", "calm", "relaxed", "peaceful"],
    ),
    (
        Emotion::Playful,
        &["哈哈", "嘿嘿", "嘻嘻", "好玩", "逗", "haha", "lol", "hehe", "😜"],
    ),
];

/// Intensity amplifiers: superlatives and emphatic punctuation.
const INTENSE_MARKERS: &[&str] = &[
    "非常", "特别", "超级", "极其", "太", "真的", "好", "so ", "very", "really", "extremely",
    "!", "！", "?!", "？！",
];

/// Analyze a message for its dominant expressed emotion.
///
/// Empty or keyword-free text returns a neutral signal with zero
/// confidence — the context engine treats that as weak evidence, not as a
/// hard "the user is neutral now".
pub fn analyze_text(text: &str) -> TextSignal {
    if text.trim().is_empty() {
        return TextSignal::neutral();
    }
    let lower = text.to_lowercase();

    let mut best: Option<(Emotion, usize)> = None;
    for (emotion, keywords) in EMOTION_KEYWORDS {
        let hits = keywords.iter().filter(|w| lower.contains(*w)).count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((*emotion, hits));
        }
    }

    let Some((emotion, hits)) = best else {
        return TextSignal::neutral();
    };

    let emphasis = INTENSE_MARKERS
        .iter()
        .filter(|w| lower.contains(*w))
        .count() as f32;

    let intensity = (0.3 + hits as f32 * 0.2 + emphasis * 0.1).clamp(0.1, 1.0);
    let confidence = (hits as f32 / (hits as f32 + 1.0)).clamp(0.0, 1.0);

    TextSignal {
        emotion,
        intensity,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_neutral() {
        let s = analyze_text("");
        assert_eq!(s.emotion, Emotion::Neutral);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn test_chinese_sad() {
        let s = analyze_text("我很难过，想哭");
        assert_eq!(s.emotion, Emotion::Sad);
        assert!(s.intensity > 0.3);
        assert!(s.confidence > 0.0);
    }

    #[test]
    fn test_english_happy() {
        let s = analyze_text("I'm so happy today, this is great!");
        assert_eq!(s.emotion, Emotion::Happy);
    }

    #[test]
    fn test_emphasis_raises_intensity() {
        let plain = analyze_text("开心");
        let emphatic = analyze_text("非常非常开心！！");
        assert!(emphatic.intensity > plain.intensity);
    }

    #[test]
    fn test_keyword_free_text_is_neutral() {
        let s = analyze_text("明天出门");
        assert_eq!(s.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_gratitude() {
        let s = analyze_text("谢谢你，辛苦了");
        assert_eq!(s.emotion, Emotion::Grateful);
    }

    #[test]
    fn test_intensity_bounds() {
        let s = analyze_text("非常特别超级极其太真的好开心高兴快乐喜欢！！！！");
        assert!(s.intensity <= 1.0);
        assert!(s.confidence <= 1.0);
    }
}
