//! Emotion state snapshots exchanged between subsystems.
//!
//! `EmotionState` is owned by the transition engine and only mutated through
//! its operations; everything handed out is a value copy so callers never
//! hold a mutable alias into engine internals.

use crate::emotion::Emotion;
use crate::math::clamp01;
use std::time::Instant;

/// The authoritative "what the avatar feels right now" record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionState {
    pub emotion: Emotion,
    /// Display intensity in [0, 1]; clamped on every write.
    pub intensity: f32,
    pub changed_at: Instant,
}

impl EmotionState {
    pub fn new(emotion: Emotion, intensity: f32, now: Instant) -> Self {
        Self {
            emotion,
            intensity: clamp01(crate::math::sanitize_f32(intensity, 0.5)),
            changed_at: now,
        }
    }

    pub fn neutral(now: Instant) -> Self {
        Self::new(Emotion::Neutral, 0.5, now)
    }
}

/// Derived primary/secondary weighting of an in-flight transition.
///
/// Computed on demand from current/start/target — never stored as
/// independent truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedEmotion {
    pub primary: Emotion,
    pub secondary: Option<Emotion>,
    /// Weight of the primary emotion, in [0, 1].
    pub primary_weight: f32,
    /// Weight of the secondary emotion; 0 when no secondary is kept.
    pub secondary_weight: f32,
    /// Transition progress in [0, 1]; 1 when settled.
    pub progress: f32,
}

impl BlendedEmotion {
    /// A settled, single-emotion blend.
    pub fn single(emotion: Emotion) -> Self {
        Self {
            primary: emotion,
            secondary: None,
            primary_weight: 1.0,
            secondary_weight: 0.0,
            progress: 1.0,
        }
    }

    pub fn pair(primary: Emotion, secondary: Emotion, primary_weight: f32, progress: f32) -> Self {
        let pw = clamp01(primary_weight);
        Self {
            primary,
            secondary: Some(secondary),
            primary_weight: pw,
            secondary_weight: clamp01(1.0 - pw),
            progress: clamp01(progress),
        }
    }

    /// Drop the secondary emotion, folding its weight into the primary.
    pub fn collapse(mut self) -> Self {
        self.secondary = None;
        self.primary_weight = 1.0;
        self.secondary_weight = 0.0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_clamps_intensity() {
        let now = Instant::now();
        assert_eq!(EmotionState::new(Emotion::Happy, 1.8, now).intensity, 1.0);
        assert_eq!(EmotionState::new(Emotion::Happy, -0.5, now).intensity, 0.0);
        assert_eq!(
            EmotionState::new(Emotion::Happy, f32::NAN, now).intensity,
            0.5
        );
    }

    #[test]
    fn test_single_blend() {
        let b = BlendedEmotion::single(Emotion::Calm);
        assert_eq!(b.primary, Emotion::Calm);
        assert_eq!(b.secondary, None);
        assert_eq!(b.primary_weight, 1.0);
        assert_eq!(b.progress, 1.0);
    }

    #[test]
    fn test_pair_weights_complement() {
        let b = BlendedEmotion::pair(Emotion::Happy, Emotion::Sad, 0.7, 0.4);
        assert!((b.primary_weight + b.secondary_weight - 1.0).abs() < 1e-6);
        assert_eq!(b.secondary, Some(Emotion::Sad));
    }

    #[test]
    fn test_pair_clamps() {
        let b = BlendedEmotion::pair(Emotion::Happy, Emotion::Sad, 3.0, -1.0);
        assert_eq!(b.primary_weight, 1.0);
        assert_eq!(b.secondary_weight, 0.0);
        assert_eq!(b.progress, 0.0);
    }

    #[test]
    fn test_collapse() {
        let b = BlendedEmotion::pair(Emotion::Happy, Emotion::Sad, 0.6, 0.5).collapse();
        assert_eq!(b.secondary, None);
        assert_eq!(b.primary_weight, 1.0);
        assert_eq!(b.secondary_weight, 0.0);
    }
}
