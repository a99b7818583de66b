//! Pairwise emotion distance and compatibility tables.
//!
//! Distance drives transition duration and is deliberately asymmetric:
//! falling out of happiness into anger is a longer journey than warming
//! from calm into happiness. Compatibility governs whether a blend keeps
//! its secondary emotion.
//!
//! Lookup-miss policy: unconfigured distance pairs resolve to 0.5, and
//! unconfigured compatibility falls back to a circumplex-derived estimate.
//! Neither table ever raises on unknown input.

use anima_core::{clamp01, Emotion};
use std::collections::HashMap;

/// Same-emotion distance is a small nonzero constant so that repeated
/// identical `set_emotion` calls still animate slightly.
pub const SAME_EMOTION_DISTANCE: f32 = 0.1;

/// Default for pairs absent from the table.
pub const DEFAULT_DISTANCE: f32 = 0.5;

/// Curated asymmetric distances. `(from, to, distance)`.
#[rustfmt::skip]
const SEED_DISTANCES: &[(Emotion, Emotion, f32)] = &[
    // Leaving the positive cluster costs more than entering it.
    (Emotion::Happy,    Emotion::Excited,   0.15),
    (Emotion::Excited,  Emotion::Happy,     0.15),
    (Emotion::Happy,    Emotion::Amused,    0.15),
    (Emotion::Amused,   Emotion::Happy,     0.15),
    (Emotion::Happy,    Emotion::Playful,   0.2),
    (Emotion::Playful,  Emotion::Happy,     0.2),
    (Emotion::Happy,    Emotion::Loving,    0.25),
    (Emotion::Loving,   Emotion::Happy,     0.2),
    (Emotion::Happy,    Emotion::Proud,     0.25),
    (Emotion::Happy,    Emotion::Grateful,  0.25),
    (Emotion::Grateful, Emotion::Happy,     0.2),
    (Emotion::Calm,     Emotion::Happy,     0.3),
    (Emotion::Happy,    Emotion::Calm,      0.35),
    (Emotion::Calm,     Emotion::Relieved,  0.2),
    (Emotion::Hopeful,  Emotion::Happy,     0.25),

    // Crossing valence is expensive, and more so out of strong positives.
    (Emotion::Happy,    Emotion::Sad,       0.9),
    (Emotion::Sad,      Emotion::Happy,     0.85),
    (Emotion::Happy,    Emotion::Angry,     0.95),
    (Emotion::Angry,    Emotion::Happy,     0.9),
    (Emotion::Excited,  Emotion::Sad,       0.95),
    (Emotion::Sad,      Emotion::Excited,   0.9),
    (Emotion::Loving,   Emotion::Angry,     0.95),
    (Emotion::Angry,    Emotion::Loving,    0.9),
    (Emotion::Loving,   Emotion::Disgust,   0.95),
    (Emotion::Calm,     Emotion::Angry,     0.8),
    (Emotion::Angry,    Emotion::Calm,      0.85),
    (Emotion::Playful,  Emotion::Sad,       0.85),

    // Negative cluster is internally close.
    (Emotion::Sad,      Emotion::Lonely,        0.2),
    (Emotion::Lonely,   Emotion::Sad,           0.2),
    (Emotion::Sad,      Emotion::Disappointed,  0.25),
    (Emotion::Disappointed, Emotion::Sad,       0.25),
    (Emotion::Angry,    Emotion::Contempt,      0.3),
    (Emotion::Contempt, Emotion::Angry,         0.3),
    (Emotion::Angry,    Emotion::Disgust,       0.3),
    (Emotion::Fear,     Emotion::Anxious,       0.2),
    (Emotion::Anxious,  Emotion::Fear,          0.25),
    (Emotion::Anxious,  Emotion::Embarrassed,   0.3),
    (Emotion::Sad,      Emotion::Anxious,       0.35),

    // Surprise is a fast pivot in every direction.
    (Emotion::Surprised, Emotion::Happy,    0.3),
    (Emotion::Surprised, Emotion::Fear,     0.3),
    (Emotion::Surprised, Emotion::Confused, 0.2),
    (Emotion::Surprised, Emotion::Excited,  0.25),
    (Emotion::Neutral,   Emotion::Surprised, 0.3),

    // Neutral reaches everything at moderate cost.
    (Emotion::Neutral,  Emotion::Happy,     0.35),
    (Emotion::Neutral,  Emotion::Sad,       0.4),
    (Emotion::Neutral,  Emotion::Angry,     0.5),
    (Emotion::Neutral,  Emotion::Thinking,  0.15),
    (Emotion::Thinking, Emotion::Neutral,   0.15),
    (Emotion::Thinking, Emotion::Curious,   0.2),
    (Emotion::Curious,  Emotion::Thinking,  0.2),
    (Emotion::Curious,  Emotion::Surprised, 0.3),
    (Emotion::Bored,    Emotion::Curious,   0.35),
    (Emotion::Bored,    Emotion::Neutral,   0.2),
    (Emotion::Confused, Emotion::Thinking,  0.25),
    (Emotion::Embarrassed, Emotion::Happy,  0.5),
    (Emotion::Determined, Emotion::Proud,   0.3),
    (Emotion::Hopeful,  Emotion::Determined, 0.3),
];

/// Asymmetric pairwise distances in [0, 1].
#[derive(Debug, Clone)]
pub struct DistanceTable {
    entries: HashMap<(Emotion, Emotion), f32>,
}

impl Default for DistanceTable {
    fn default() -> Self {
        let mut entries = HashMap::with_capacity(SEED_DISTANCES.len());
        for (from, to, d) in SEED_DISTANCES {
            entries.insert((*from, *to), *d);
        }
        Self { entries }
    }
}

impl DistanceTable {
    /// Distance from → to. Same emotion is a small nonzero constant;
    /// unknown pairs default to 0.5.
    pub fn distance(&self, from: Emotion, to: Emotion) -> f32 {
        if from == to {
            return SAME_EMOTION_DISTANCE;
        }
        self.entries
            .get(&(from, to))
            .copied()
            .unwrap_or(DEFAULT_DISTANCE)
    }

    /// Override one directed pair; the value is clamped to [0, 1].
    pub fn set_distance(&mut self, from: Emotion, to: Emotion, distance: f32) {
        self.entries.insert((from, to), clamp01(distance));
    }
}

/// Symmetric blend compatibility in [0, 1].
#[rustfmt::skip]
const SEED_COMPATIBILITY: &[(Emotion, Emotion, f32)] = &[
    (Emotion::Happy,    Emotion::Excited,   0.9),
    (Emotion::Happy,    Emotion::Amused,    0.9),
    (Emotion::Happy,    Emotion::Playful,   0.85),
    (Emotion::Happy,    Emotion::Loving,    0.85),
    (Emotion::Happy,    Emotion::Grateful,  0.8),
    (Emotion::Happy,    Emotion::Surprised, 0.7),
    (Emotion::Happy,    Emotion::Proud,     0.8),
    (Emotion::Happy,    Emotion::Embarrassed, 0.5),
    (Emotion::Happy,    Emotion::Sad,       0.1),
    (Emotion::Happy,    Emotion::Angry,     0.05),
    (Emotion::Happy,    Emotion::Disgust,   0.1),
    (Emotion::Sad,      Emotion::Lonely,    0.9),
    (Emotion::Sad,      Emotion::Disappointed, 0.85),
    (Emotion::Sad,      Emotion::Anxious,   0.6),
    (Emotion::Sad,      Emotion::Grateful,  0.4),
    (Emotion::Sad,      Emotion::Excited,   0.05),
    (Emotion::Angry,    Emotion::Contempt,  0.85),
    (Emotion::Angry,    Emotion::Disgust,   0.8),
    (Emotion::Angry,    Emotion::Determined, 0.6),
    (Emotion::Angry,    Emotion::Calm,      0.1),
    (Emotion::Fear,     Emotion::Anxious,   0.9),
    (Emotion::Fear,     Emotion::Surprised, 0.7),
    (Emotion::Surprised, Emotion::Confused, 0.8),
    (Emotion::Surprised, Emotion::Curious,  0.8),
    (Emotion::Thinking, Emotion::Curious,   0.9),
    (Emotion::Thinking, Emotion::Confused,  0.8),
    (Emotion::Calm,     Emotion::Relieved,  0.9),
    (Emotion::Calm,     Emotion::Bored,     0.7),
    (Emotion::Loving,   Emotion::Grateful,  0.85),
    (Emotion::Hopeful,  Emotion::Determined, 0.8),
];

#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    entries: HashMap<(Emotion, Emotion), f32>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        let mut entries = HashMap::with_capacity(SEED_COMPATIBILITY.len() * 2);
        for (a, b, c) in SEED_COMPATIBILITY {
            entries.insert((*a, *b), *c);
            entries.insert((*b, *a), *c);
        }
        Self { entries }
    }
}

impl CompatibilityTable {
    /// Compatibility of a blended pair. Unknown pairs fall back to an
    /// estimate from circumplex proximity.
    pub fn compatibility(&self, a: Emotion, b: Emotion) -> f32 {
        if a == b {
            return 1.0;
        }
        if let Some(c) = self.entries.get(&(a, b)) {
            return *c;
        }
        // Max circumplex distance is ~2.83; nearby emotions blend well.
        clamp01(1.0 - a.affect().distance(&b.affect()) / 2.83)
    }

    pub fn set_compatibility(&mut self, a: Emotion, b: Emotion, value: f32) {
        let v = clamp01(value);
        self.entries.insert((a, b), v);
        self.entries.insert((b, a), v);
    }
}
