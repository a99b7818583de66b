//! Conversational intent classification.
//!
//! Priority-ordered keyword matching: the first intent whose pattern list
//! hits wins, so greetings beat questions beat plain statements. A trailing
//! question mark (ASCII or CJK) falls back to `Question` when nothing else
//! matched.

use anima_core::Emotion;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Farewell,
    Appreciation,
    Complaint,
    Question,
    Request,
    Expression,
    Agreement,
    Disagreement,
    Statement,
    Unknown,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::Unknown
    }
}

/// Classification priority, highest first. Each entry is (intent, patterns).
const INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::Greeting,
        &[
            "你好", "您好", "早上好", "晚上好", "嗨", "哈喽", "hello", "hi ", "hey", "good morning",
            "good evening",
        ],
    ),
    (
        Intent::Farewell,
        &[
            "再见", "拜拜", "晚安", "下次聊", "我走了", "bye", "goodbye", "good night", "see you",
        ],
    ),
    (
        Intent::Appreciation,
        &["谢谢", "感谢", "多谢", "太感谢", "thank", "thanks", "appreciate"],
    ),
    (
        Intent::Complaint,
        &[
            "太差", "糟糕", "受不了", "烦死", "讨厌", "什么破", "terrible", "awful", "worst",
            "can't stand",
        ],
    ),
    (
        Intent::Question,
        &[
            "吗", "呢", "为什么", "怎么", "什么", "哪", "谁", "几", "多少", "why", "how", "what",
            "when", "where", "who", "which",
        ],
    ),
    (
        Intent::Request,
        &[
            "请", "帮我", "能不能", "可以帮", "麻烦", "希望你", "please", "can you", "could you",
            "help me",
        ],
    ),
    (
        Intent::Expression,
        &[
            "我觉得", "我感觉", "我好", "我很", "我太", "i feel", "i'm so", "i am so",
        ],
    ),
    (
        Intent::Agreement,
        &[
            "是的", "对的", "没错", "同意", "确实", "好的", "行", "嗯", "yes", "yeah", "agree",
            "exactly", "right",
        ],
    ),
    (
        Intent::Disagreement,
        &[
            "不是", "不对", "不同意", "才不", "并不", "no,", "nope", "disagree", "not really",
        ],
    ),
];

impl Intent {
    /// Classify one message. Never fails; unmatched text is a `Statement`
    /// when it has content, `Unknown` when empty.
    pub fn classify(text: &str) -> Intent {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Intent::Unknown;
        }
        let lower = trimmed.to_lowercase();

        for (intent, patterns) in INTENT_PATTERNS {
            if patterns.iter().any(|p| lower.contains(*p)) {
                return *intent;
            }
        }

        // Punctuation fallback: an unmatched sentence ending in a question
        // mark is still a question.
        if lower.ends_with('?') || lower.ends_with('？') {
            return Intent::Question;
        }

        Intent::Statement
    }

    /// Emotion this intent biases the context toward, with weight.
    pub fn emotion_bias(&self) -> Option<(Emotion, f32)> {
        match self {
            Intent::Greeting => Some((Emotion::Happy, 0.5)),
            Intent::Farewell => Some((Emotion::Calm, 0.4)),
            Intent::Appreciation => Some((Emotion::Grateful, 0.7)),
            Intent::Complaint => Some((Emotion::Disappointed, 0.6)),
            Intent::Question => Some((Emotion::Curious, 0.4)),
            Intent::Request => Some((Emotion::Thinking, 0.3)),
            Intent::Expression => None, // the sentiment detection carries it
            Intent::Agreement => Some((Emotion::Happy, 0.25)),
            Intent::Disagreement => Some((Emotion::Thinking, 0.3)),
            Intent::Statement | Intent::Unknown => None,
        }
    }

    /// Engagement delta this intent nudges the conversation by.
    pub fn engagement_delta(&self) -> f32 {
        match self {
            Intent::Greeting => 0.15,
            Intent::Farewell => -0.25,
            Intent::Appreciation => 0.1,
            Intent::Complaint => 0.05,
            Intent::Question => 0.15,
            Intent::Request => 0.1,
            Intent::Expression => 0.1,
            Intent::Agreement => 0.05,
            Intent::Disagreement => 0.05,
            Intent::Statement => 0.0,
            Intent::Unknown => -0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_greeting_over_question() {
        // contains both a greeting and a question word: greeting wins
        assert_eq!(Intent::classify("你好，今天怎么样？"), Intent::Greeting);
    }

    #[test]
    fn test_question() {
        assert_eq!(Intent::classify("为什么天是蓝色的"), Intent::Question);
        assert_eq!(Intent::classify("what time is it"), Intent::Question);
    }

    #[test]
    fn test_trailing_question_mark_fallback() {
        assert_eq!(Intent::classify("去过那里？"), Intent::Question);
        assert_eq!(Intent::classify("serious?"), Intent::Question);
    }

    #[test]
    fn test_statement_fallback() {
        assert_eq!(Intent::classify("今天天气晴朗"), Intent::Statement);
    }

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(Intent::classify("   "), Intent::Unknown);
    }

    #[test]
    fn test_appreciation() {
        assert_eq!(Intent::classify("谢谢你的帮助"), Intent::Appreciation);
        assert_eq!(
            Intent::Appreciation.emotion_bias(),
            Some((Emotion::Grateful, 0.7))
        );
    }

    #[test]
    fn test_farewell_lowers_engagement() {
        assert!(Intent::Farewell.engagement_delta() < 0.0);
        assert!(Intent::Greeting.engagement_delta() > 0.0);
    }
}
