//! Interaction rules: what the avatar does when touched.
//!
//! A mutable rule table filtered by (area, gesture) and the current
//! affection level, with weighted-random selection at both the rule and
//! reaction level. The defaults cover the common petting vocabulary; the
//! host application can add and remove rules at runtime.

use crate::gesture::{TouchArea, TouchGesture};
use serde::{Deserialize, Serialize};

/// One possible response within a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Expression label; resolved onto the canonical emotion set through
    /// alias matching (`delighted` → happy, and so on).
    pub expression: String,
    pub dialogue: Option<String>,
    /// Affection delta applied when this reaction fires.
    pub emotional_change: f32,
    /// Cooldown for the (area, gesture) pair after firing, ms.
    pub cooldown_ms: u64,
    /// Selection weight within the rule (default 1).
    pub weight: f32,
}

impl Reaction {
    pub fn new(expression: &str, dialogue: &str, emotional_change: f32) -> Self {
        Self {
            expression: expression.to_string(),
            dialogue: Some(dialogue.to_string()),
            emotional_change,
            cooldown_ms: 1000,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn with_cooldown(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }
}

/// A touch interaction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRule {
    pub id: String,
    pub area: TouchArea,
    pub gesture: TouchGesture,
    /// Optional affection gate: the rule only matches while affection is
    /// inside [min_affection, max_affection].
    pub min_affection: Option<f32>,
    pub max_affection: Option<f32>,
    /// Selection weight among matching rules (default 1).
    pub weight: f32,
    pub reactions: Vec<Reaction>,
}

impl InteractionRule {
    pub fn new(
        id: &str,
        area: TouchArea,
        gesture: TouchGesture,
        reactions: Vec<Reaction>,
    ) -> Self {
        Self {
            id: id.to_string(),
            area,
            gesture,
            min_affection: None,
            max_affection: None,
            weight: 1.0,
            reactions,
        }
    }

    pub fn with_affection_window(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.min_affection = min;
        self.max_affection = max;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    pub fn matches(&self, area: TouchArea, gesture: TouchGesture, affection: f32) -> bool {
        if self.area != area || self.gesture != gesture {
            return false;
        }
        if let Some(min) = self.min_affection {
            if affection < min {
                return false;
            }
        }
        if let Some(max) = self.max_affection {
            if affection > max {
                return false;
            }
        }
        true
    }
}

/// The built-in rule table.
pub fn default_rules() -> Vec<InteractionRule> {
    vec![
        InteractionRule::new(
            "head_tap",
            TouchArea::Head,
            TouchGesture::Tap,
            vec![
                Reaction::new("happy", "嗯？怎么啦？", 1.0),
                Reaction::new("curious", "在叫我吗？", 0.5),
                Reaction::new("surprised", "哇，吓我一跳！", 0.0).with_weight(0.5),
            ],
        ),
        InteractionRule::new(
            "head_rub_low",
            TouchArea::Head,
            TouchGesture::Rub,
            vec![
                Reaction::new("embarrassed", "别、别随便摸头啦……", 0.5),
                Reaction::new("confused", "唔……这是什么意思？", 0.2),
            ],
        )
        .with_affection_window(None, Some(40.0)),
        InteractionRule::new(
            "head_rub_high",
            TouchArea::Head,
            TouchGesture::Rub,
            vec![
                Reaction::new("delighted", "嘿嘿，好舒服～", 2.0),
                Reaction::new("loving", "最喜欢被这样摸头了。", 2.5).with_weight(0.8),
            ],
        )
        .with_affection_window(Some(40.0), None),
        InteractionRule::new(
            "head_long_press",
            TouchArea::Head,
            TouchGesture::LongPress,
            vec![
                Reaction::new("calm", "手好温暖……", 1.5).with_cooldown(2000),
                Reaction::new("embarrassed", "一直放在头上，会害羞的啦。", 1.0),
            ],
        ),
        InteractionRule::new(
            "face_tap",
            TouchArea::Face,
            TouchGesture::Tap,
            vec![
                Reaction::new("playful", "戳脸是想让我注意你吗？", 0.8),
                Reaction::new("embarrassed", "呀！干嘛戳我的脸！", 0.3),
            ],
        ),
        InteractionRule::new(
            "face_double_tap",
            TouchArea::Face,
            TouchGesture::DoubleTap,
            vec![Reaction::new("amused", "好啦好啦，我在听～", 1.0)],
        ),
        InteractionRule::new(
            "hair_rub",
            TouchArea::Hair,
            TouchGesture::Rub,
            vec![
                Reaction::new("happy", "头发要被揉乱了啦～", 1.5),
                Reaction::new("playful", "喜欢我的头发吗？", 1.0),
            ],
        ),
        InteractionRule::new(
            "hair_drag",
            TouchArea::Hair,
            TouchGesture::Drag,
            vec![
                Reaction::new("annoyed", "不要拉头发！会痛的！", -2.0),
                Reaction::new("sad", "呜……轻一点……", -1.0),
            ],
        ),
        InteractionRule::new(
            "shoulder_tap",
            TouchArea::Shoulder,
            TouchGesture::Tap,
            vec![
                Reaction::new("curious", "嗯？有什么事吗？", 0.5),
                Reaction::new("calm", "我在呢。", 0.3),
            ],
        ),
        InteractionRule::new(
            "hand_long_press",
            TouchArea::Hand,
            TouchGesture::LongPress,
            vec![
                Reaction::new("loving", "牵手……吗？", 3.0).with_cooldown(3000),
                Reaction::new("embarrassed", "手、手心出汗了……", 1.5),
            ],
        )
        .with_affection_window(Some(30.0), None),
        InteractionRule::new(
            "hand_tap",
            TouchArea::Hand,
            TouchGesture::Tap,
            vec![Reaction::new("happy", "击掌！", 0.8)],
        ),
        InteractionRule::new(
            "body_tap",
            TouchArea::Body,
            TouchGesture::Tap,
            vec![
                Reaction::new("surprised", "哇！", 0.0),
                Reaction::new("embarrassed", "那里不可以随便碰啦。", -0.5),
            ],
        ),
        InteractionRule::new(
            "body_drag_low",
            TouchArea::Body,
            TouchGesture::Drag,
            vec![Reaction::new("angry", "喂！不要乱来！", -3.0)],
        )
        .with_affection_window(None, Some(60.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_nonempty_and_valid() {
        let rules = default_rules();
        assert!(rules.len() >= 10);
        for rule in &rules {
            assert!(!rule.reactions.is_empty(), "rule {} has no reactions", rule.id);
            assert!(rule.weight > 0.0);
            for r in &rule.reactions {
                assert!(r.weight >= 0.0);
                assert!(r.cooldown_ms > 0);
            }
        }
    }

    #[test]
    fn test_affection_window_matching() {
        let rule = InteractionRule::new(
            "test",
            TouchArea::Head,
            TouchGesture::Rub,
            vec![Reaction::new("happy", "~", 1.0)],
        )
        .with_affection_window(Some(40.0), Some(80.0));

        assert!(!rule.matches(TouchArea::Head, TouchGesture::Rub, 20.0));
        assert!(rule.matches(TouchArea::Head, TouchGesture::Rub, 60.0));
        assert!(!rule.matches(TouchArea::Head, TouchGesture::Rub, 90.0));
        assert!(!rule.matches(TouchArea::Face, TouchGesture::Rub, 60.0));
        assert!(!rule.matches(TouchArea::Head, TouchGesture::Tap, 60.0));
    }

    #[test]
    fn test_low_and_high_affection_head_rub_disjoint() {
        let rules = default_rules();
        let low: Vec<&InteractionRule> = rules
            .iter()
            .filter(|r| r.matches(TouchArea::Head, TouchGesture::Rub, 10.0))
            .collect();
        let high: Vec<&InteractionRule> = rules
            .iter()
            .filter(|r| r.matches(TouchArea::Head, TouchGesture::Rub, 90.0))
            .collect();
        assert_eq!(low.len(), 1);
        assert_eq!(high.len(), 1);
        assert_ne!(low[0].id, high[0].id);
    }

    #[test]
    fn test_rules_serialize_roundtrip() {
        let rules = default_rules();
        let json = serde_json::to_string(&rules).unwrap();
        let back: Vec<InteractionRule> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), rules.len());
    }
}
