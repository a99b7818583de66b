//! The canonical emotion vocabulary.
//!
//! Every subsystem speaks in terms of this fixed enum — no runtime-invented
//! emotion tags. Free-form labels coming from rule tables or reaction
//! definitions (e.g. `delighted`, `affectionate`) are resolved onto the
//! canonical set through [`Emotion::from_label`].

use crate::affect::Affect;
use serde::{Deserialize, Serialize};

/// Canonical emotion tags displayed by the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Fear,
    Disgust,
    Excited,
    Calm,
    Thinking,
    Loving,
    Grateful,
    Proud,
    Hopeful,
    Relieved,
    Amused,
    Anxious,
    Embarrassed,
    Confused,
    Bored,
    Disappointed,
    Lonely,
    Curious,
    Determined,
    Playful,
    Contempt,
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Neutral
    }
}

impl Emotion {
    /// Stable lowercase name, used as parameter-map keys and in rule tables.
    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Excited => "excited",
            Emotion::Calm => "calm",
            Emotion::Thinking => "thinking",
            Emotion::Loving => "loving",
            Emotion::Grateful => "grateful",
            Emotion::Proud => "proud",
            Emotion::Hopeful => "hopeful",
            Emotion::Relieved => "relieved",
            Emotion::Amused => "amused",
            Emotion::Anxious => "anxious",
            Emotion::Embarrassed => "embarrassed",
            Emotion::Confused => "confused",
            Emotion::Bored => "bored",
            Emotion::Disappointed => "disappointed",
            Emotion::Lonely => "lonely",
            Emotion::Curious => "curious",
            Emotion::Determined => "determined",
            Emotion::Playful => "playful",
            Emotion::Contempt => "contempt",
        }
    }

    /// All canonical emotions, in declaration order.
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::Neutral,
            Emotion::Happy,
            Emotion::Sad,
            Emotion::Angry,
            Emotion::Surprised,
            Emotion::Fear,
            Emotion::Disgust,
            Emotion::Excited,
            Emotion::Calm,
            Emotion::Thinking,
            Emotion::Loving,
            Emotion::Grateful,
            Emotion::Proud,
            Emotion::Hopeful,
            Emotion::Relieved,
            Emotion::Amused,
            Emotion::Anxious,
            Emotion::Embarrassed,
            Emotion::Confused,
            Emotion::Bored,
            Emotion::Disappointed,
            Emotion::Lonely,
            Emotion::Curious,
            Emotion::Determined,
            Emotion::Playful,
            Emotion::Contempt,
        ]
    }

    /// Valence × Arousal coordinate of this emotion on the circumplex.
    ///
    /// Used as the fallback basis wherever a pairwise table has no entry:
    /// transition distance, blend compatibility, voice projection, lighting.
    pub fn affect(&self) -> Affect {
        match self {
            Emotion::Neutral => Affect::new(0.0, 0.3),
            Emotion::Happy => Affect::new(0.8, 0.6),
            Emotion::Sad => Affect::new(-0.7, 0.2),
            Emotion::Angry => Affect::new(-0.8, 0.9),
            Emotion::Surprised => Affect::new(0.1, 0.9),
            Emotion::Fear => Affect::new(-0.7, 0.9),
            Emotion::Disgust => Affect::new(-0.6, 0.5),
            Emotion::Excited => Affect::new(0.7, 0.9),
            Emotion::Calm => Affect::new(0.4, 0.1),
            Emotion::Thinking => Affect::new(0.05, 0.35),
            Emotion::Loving => Affect::new(0.8, 0.4),
            Emotion::Grateful => Affect::new(0.7, 0.35),
            Emotion::Proud => Affect::new(0.6, 0.55),
            Emotion::Hopeful => Affect::new(0.5, 0.45),
            Emotion::Relieved => Affect::new(0.4, 0.2),
            Emotion::Amused => Affect::new(0.6, 0.6),
            Emotion::Anxious => Affect::new(-0.5, 0.8),
            Emotion::Embarrassed => Affect::new(-0.3, 0.6),
            Emotion::Confused => Affect::new(-0.2, 0.5),
            Emotion::Bored => Affect::new(-0.3, 0.1),
            Emotion::Disappointed => Affect::new(-0.5, 0.3),
            Emotion::Lonely => Affect::new(-0.6, 0.25),
            Emotion::Curious => Affect::new(0.3, 0.6),
            Emotion::Determined => Affect::new(0.4, 0.7),
            Emotion::Playful => Affect::new(0.7, 0.7),
            Emotion::Contempt => Affect::new(-0.5, 0.45),
        }
    }

    /// Resolve a free-form label onto the canonical set.
    ///
    /// Resolution order: exact name match, then alias table, then substring
    /// fallback in either direction. Unresolvable labels degrade to
    /// `Neutral` — rule tables must never be able to crash the loop.
    pub fn from_label(label: &str) -> Emotion {
        let l = label.trim().to_lowercase();
        if l.is_empty() {
            return Emotion::Neutral;
        }

        for e in Emotion::all() {
            if e.name() == l {
                return *e;
            }
        }

        // Aliases seen in reaction tables and legacy expression assets.
        match l.as_str() {
            "joy" | "joyful" | "delighted" | "cheerful" | "glad" => return Emotion::Happy,
            "affectionate" | "love" | "tender" | "empathy" | "warm" => return Emotion::Loving,
            "annoyed" | "irritated" | "mad" | "furious" | "grumpy" => return Emotion::Angry,
            "shy" | "bashful" | "blush" => return Emotion::Embarrassed,
            "scared" | "afraid" | "terrified" => return Emotion::Fear,
            "shocked" | "amazed" | "astonished" => return Emotion::Surprised,
            "gloomy" | "depressed" | "down" | "melancholy" => return Emotion::Sad,
            "tired" | "sleepy" | "weary" => return Emotion::Bored,
            "interested" | "intrigued" => return Emotion::Curious,
            "serene" | "peaceful" | "relaxed" => return Emotion::Calm,
            "thankful" => return Emotion::Grateful,
            "pondering" | "contemplative" => return Emotion::Thinking,
            _ => {}
        }

        // Substring fallback: "very_happy", "happy2", "happiness" all land
        // on happy.
        for e in Emotion::all() {
            if l.contains(e.name()) || e.name().contains(l.as_str()) {
                return *e;
            }
        }

        tracing::debug!("unresolved emotion label '{}', using neutral", label);
        Emotion::Neutral
    }

    /// Nearest canonical emotion to an affect coordinate.
    pub fn nearest(affect: Affect) -> Emotion {
        let mut best = Emotion::Neutral;
        let mut best_d = f32::MAX;
        for e in Emotion::all() {
            let d = affect.distance(&e.affect());
            if d < best_d {
                best_d = d;
                best = *e;
            }
        }
        best
    }

    /// Positive-valence emotions read as "pleasant" by downstream tables.
    pub fn is_positive(&self) -> bool {
        self.affect().valence > 0.15
    }

    pub fn is_negative(&self) -> bool {
        self.affect().valence < -0.15
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for e in Emotion::all() {
            assert_eq!(Emotion::from_label(e.name()), *e);
        }
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(Emotion::from_label("delighted"), Emotion::Happy);
        assert_eq!(Emotion::from_label("affectionate"), Emotion::Loving);
        assert_eq!(Emotion::from_label("empathy"), Emotion::Loving);
        assert_eq!(Emotion::from_label("annoyed"), Emotion::Angry);
        assert_eq!(Emotion::from_label("shy"), Emotion::Embarrassed);
    }

    #[test]
    fn test_substring_fallback() {
        assert_eq!(Emotion::from_label("very_happy"), Emotion::Happy);
        assert_eq!(Emotion::from_label("sadness"), Emotion::Sad);
        assert_eq!(Emotion::from_label("HAPPY"), Emotion::Happy);
    }

    #[test]
    fn test_unknown_label_degrades_to_neutral() {
        assert_eq!(Emotion::from_label("xyzzy"), Emotion::Neutral);
        assert_eq!(Emotion::from_label(""), Emotion::Neutral);
        assert_eq!(Emotion::from_label("   "), Emotion::Neutral);
    }

    #[test]
    fn test_affect_coordinates_in_range() {
        for e in Emotion::all() {
            let a = e.affect();
            assert!(a.valence >= -1.0 && a.valence <= 1.0, "{} valence", e);
            assert!(a.arousal >= 0.0 && a.arousal <= 1.0, "{} arousal", e);
        }
    }

    #[test]
    fn test_nearest_identity() {
        // Every emotion should be its own nearest neighbor.
        for e in Emotion::all() {
            assert_eq!(Emotion::nearest(e.affect()), *e, "nearest({})", e);
        }
    }

    #[test]
    fn test_polarity() {
        assert!(Emotion::Happy.is_positive());
        assert!(Emotion::Sad.is_negative());
        assert!(!Emotion::Neutral.is_positive());
        assert!(!Emotion::Neutral.is_negative());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Emotion::Happy).unwrap();
        assert_eq!(json, "\"happy\"");
        let back: Emotion = serde_json::from_str("\"contempt\"").unwrap();
        assert_eq!(back, Emotion::Contempt);
    }
}
