//! Continuous Valence × Arousal coordinates (Russell's circumplex).
//!
//! The discrete [`Emotion`](crate::Emotion) tags are what subsystems exchange;
//! this 2D projection is the shared geometry behind them — fallback distances,
//! voice-feature mapping and lighting warmth all reduce to it.

use serde::{Deserialize, Serialize};

/// A point in the circumplex: valence in [-1, 1], arousal in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    /// Positive/negative quality of the state.
    pub valence: f32,
    /// Calm/activated quality of the state.
    pub arousal: f32,
}

impl Default for Affect {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.3,
        }
    }
}

impl Affect {
    pub fn new(valence: f32, arousal: f32) -> Self {
        Self {
            valence: valence.clamp(-1.0, 1.0),
            arousal: arousal.clamp(0.0, 1.0),
        }
    }

    /// Distance in circumplex space, arousal rescaled to match valence span.
    /// Range is [0, ~2.83].
    pub fn distance(&self, other: &Affect) -> f32 {
        let dv = self.valence - other.valence;
        let da = (self.arousal - other.arousal) * 2.0;
        (dv * dv + da * da).sqrt()
    }

    /// Emotional magnitude: distance from the neutral origin, in [0, ~1.41].
    pub fn intensity(&self) -> f32 {
        (self.valence.powi(2) + (self.arousal * 2.0 - 1.0).powi(2)).sqrt() / std::f32::consts::SQRT_2
    }

    pub fn lerp(&self, other: &Affect, t: f32) -> Affect {
        let t = t.clamp(0.0, 1.0);
        Affect::new(
            self.valence + (other.valence - self.valence) * t,
            self.arousal + (other.arousal - self.arousal) * t,
        )
    }
}
