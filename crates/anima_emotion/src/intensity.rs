//! Expression intensity modulation — the final gain stage.
//!
//! Every factor here is a multiplier on the caller-supplied base intensity:
//! fatigue, circadian phase, conversational urgency, per-emotion character
//! and a learned per-user preference. The combined multiplier is clamped
//! before it touches anything, and the final output is clamped again to the
//! configured display range.

use anima_core::{clamp01, config::IntensityConfig, sanitize_f32, Emotion};
use std::collections::HashMap;
use std::time::Instant;

/// Per-call factor breakdown, exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityBreakdown {
    pub fatigue_factor: f32,
    pub time_factor: f32,
    pub conversational_factor: f32,
    pub emotional_factor: f32,
    pub personal_factor: f32,
    /// Product of the above, clamped to the configured multiplier window.
    pub combined: f32,
    pub output: f32,
}

pub struct IntensityModulator {
    config: IntensityConfig,

    turn_count: u32,
    session_start: Instant,
    last_call: Option<Instant>,
    fatigue: f32,

    /// Externally-set conversational signals, both in [0, 1].
    urgency: f32,
    emotional_weight: f32,

    /// Learned running average of observed display intensity per emotion.
    learned: HashMap<Emotion, (f32, u32)>,

    /// Learned preferred display intensity, from explicit user feedback.
    preferred_intensity: f32,
    preference_samples: u32,
    last_output: f32,
}

impl Default for IntensityModulator {
    fn default() -> Self {
        Self::new(IntensityConfig::default())
    }
}

impl IntensityModulator {
    pub fn new(config: IntensityConfig) -> Self {
        Self {
            config,
            turn_count: 0,
            session_start: Instant::now(),
            last_call: None,
            fatigue: 0.0,
            urgency: 0.0,
            emotional_weight: 0.0,
            learned: HashMap::new(),
            preferred_intensity: 0.5,
            preference_samples: 0,
            last_output: 0.5,
        }
    }

    pub fn set_urgency(&mut self, urgency: f32) {
        self.urgency = clamp01(sanitize_f32(urgency, 0.0));
    }

    pub fn set_emotional_weight(&mut self, weight: f32) {
        self.emotional_weight = clamp01(sanitize_f32(weight, 0.0));
    }

    /// Apply the gain stage to a base intensity for `emotion`, at local
    /// `hour` (0-23).
    pub fn modulate(&mut self, base: f32, emotion: Emotion, hour: u32, now: Instant) -> f32 {
        self.modulate_detailed(base, emotion, hour, now).output
    }

    pub fn modulate_detailed(
        &mut self,
        base: f32,
        emotion: Emotion,
        hour: u32,
        now: Instant,
    ) -> IntensityBreakdown {
        let base = clamp01(sanitize_f32(base, 0.5));
        self.turn_count = self.turn_count.saturating_add(1);

        // === Fatigue ===
        // Grows with turns and session length (both capped), recovers with
        // idle time since the previous call.
        if let Some(last) = self.last_call {
            let idle_min = now.saturating_duration_since(last).as_secs_f32() / 60.0;
            self.fatigue -= idle_min * self.config.fatigue_recovery_per_minute;
        }
        let session_hours =
            now.saturating_duration_since(self.session_start).as_secs_f32() / 3600.0;
        let turn_part = (self.turn_count as f32 * self.config.fatigue_per_turn).min(0.3);
        let session_part = (session_hours * self.config.fatigue_per_hour).min(0.3);
        let cap = turn_part + session_part;
        self.fatigue = (self.fatigue + self.config.fatigue_per_turn).clamp(0.0, cap);
        let fatigue_factor = 1.0 - self.fatigue * 0.5;

        // === Circadian: 3-level step ===
        let time_factor = match hour {
            6..=10 => 1.1,
            11..=21 => 1.0,
            _ => 0.85,
        };

        // === Conversational urgency ===
        let conversational_factor = 1.0 + self.urgency * 0.3 + self.emotional_weight * 0.2;

        // === Per-emotion character, blended with learned average ===
        let table = emotion_gain(emotion);
        let emotional_factor = match self.learned.get(&emotion) {
            Some((avg, n)) if *n >= 3 => {
                // Learned average is an intensity in [0,1]; recenter it as a
                // gain around 1.0 before blending with the table.
                let learned_gain = 0.5 + avg;
                table * 0.5 + learned_gain * 0.5
            }
            _ => table,
        };

        // === Personalization: pull toward the learned preference ===
        let personal_factor = if self.preference_samples > 0 {
            1.0 + (self.preferred_intensity - base) * 0.4
        } else {
            1.0
        };

        let combined = (fatigue_factor * time_factor * conversational_factor * emotional_factor
            * personal_factor)
            .clamp(self.config.min_multiplier, self.config.max_multiplier);

        let output = (base * combined).clamp(self.config.min_intensity, self.config.max_intensity);

        self.last_call = Some(now);
        self.last_output = output;

        IntensityBreakdown {
            fatigue_factor,
            time_factor,
            conversational_factor,
            emotional_factor,
            personal_factor,
            combined,
            output,
        }
    }

    /// Learn how intensely this emotion tends to display.
    pub fn record_emotion_sample(&mut self, emotion: Emotion, intensity: f32) {
        let intensity = clamp01(sanitize_f32(intensity, 0.5));
        let entry = self.learned.entry(emotion).or_insert((intensity, 0));
        entry.0 = entry.0 * 0.8 + intensity * 0.2;
        entry.1 = entry.1.saturating_add(1);
    }

    /// Explicit user response to the last displayed intensity. Negative
    /// feedback scales the remembered intensity down by 20% before it
    /// enters the preference average.
    pub fn record_feedback(&mut self, positive: bool) {
        let mut remembered = self.last_output;
        if !positive {
            remembered *= 0.8;
        }
        if self.preference_samples == 0 {
            self.preferred_intensity = remembered;
        } else {
            self.preferred_intensity = self.preferred_intensity * 0.8 + remembered * 0.2;
        }
        self.preferred_intensity = clamp01(self.preferred_intensity);
        self.preference_samples = self.preference_samples.saturating_add(1);
        tracing::debug!(
            "intensity preference now {:.2} ({} samples)",
            self.preferred_intensity,
            self.preference_samples
        );
    }

    pub fn fatigue(&self) -> f32 {
        self.fatigue
    }

    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }
}

/// Per-emotion expression gain: how demonstrative each emotion is by
/// character.
fn emotion_gain(emotion: Emotion) -> f32 {
    use Emotion::*;
    match emotion {
        Excited | Angry => 1.2,
        Happy | Surprised | Playful | Amused => 1.1,
        Fear | Determined | Proud => 1.05,
        Loving | Grateful | Hopeful | Curious => 1.0,
        Disgust | Anxious | Embarrassed | Confused | Contempt => 0.95,
        Neutral | Thinking | Relieved | Disappointed => 0.9,
        Sad | Lonely => 0.85,
        Calm | Bored => 0.8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_output_within_configured_range() {
        let mut m = IntensityModulator::default();
        let now = Instant::now();
        for base in [0.0, 0.3, 0.8, 1.5, -2.0, f32::NAN] {
            let out = m.modulate(base, Emotion::Excited, 12, now);
            assert!(out >= 0.1 && out <= 1.0, "base {} -> {}", base, out);
        }
    }

    #[test]
    fn test_combined_multiplier_clamped() {
        let mut m = IntensityModulator::default();
        m.set_urgency(1.0);
        m.set_emotional_weight(1.0);
        let b = m.modulate_detailed(0.8, Emotion::Excited, 8, Instant::now());
        assert!(b.combined <= 1.5, "combined {}", b.combined);
        assert!(b.combined >= 0.3);
    }

    #[test]
    fn test_fatigue_accumulates_over_turns() {
        let mut m = IntensityModulator::default();
        let now = Instant::now();
        let first = m.modulate_detailed(0.8, Emotion::Neutral, 12, now);
        for i in 1..40 {
            m.modulate(0.8, Emotion::Neutral, 12, now + Duration::from_secs(i * 5));
        }
        let last = m.modulate_detailed(
            0.8,
            Emotion::Neutral,
            12,
            now + Duration::from_secs(205),
        );
        assert!(
            last.fatigue_factor < first.fatigue_factor,
            "{} >= {}",
            last.fatigue_factor,
            first.fatigue_factor
        );
    }

    #[test]
    fn test_idle_recovers_fatigue() {
        let mut m = IntensityModulator::default();
        let now = Instant::now();
        for i in 0..40 {
            m.modulate(0.8, Emotion::Neutral, 12, now + Duration::from_secs(i * 5));
        }
        let tired = m.fatigue();
        assert!(tired > 0.0);
        // A long idle gap recovers.
        m.modulate(0.8, Emotion::Neutral, 12, now + Duration::from_secs(3800));
        assert!(m.fatigue() < tired, "{} >= {}", m.fatigue(), tired);
    }

    #[test]
    fn test_circadian_step() {
        let now = Instant::now();
        let mut a = IntensityModulator::default();
        let morning = a.modulate_detailed(0.5, Emotion::Neutral, 8, now);
        let mut b = IntensityModulator::default();
        let midnight = b.modulate_detailed(0.5, Emotion::Neutral, 2, now);
        assert!(morning.time_factor > midnight.time_factor);
        assert_eq!(morning.time_factor, 1.1);
        assert_eq!(midnight.time_factor, 0.85);
    }

    #[test]
    fn test_emotional_table() {
        let now = Instant::now();
        let mut m = IntensityModulator::default();
        let excited = m.modulate_detailed(0.5, Emotion::Excited, 12, now);
        let mut m2 = IntensityModulator::default();
        let calm = m2.modulate_detailed(0.5, Emotion::Calm, 12, now);
        assert!(excited.emotional_factor > calm.emotional_factor);
    }

    #[test]
    fn test_learned_blend_needs_three_samples() {
        let now = Instant::now();
        let mut m = IntensityModulator::default();
        m.record_emotion_sample(Emotion::Happy, 1.0);
        m.record_emotion_sample(Emotion::Happy, 1.0);
        let two = m.modulate_detailed(0.5, Emotion::Happy, 12, now);
        assert_eq!(two.emotional_factor, emotion_gain(Emotion::Happy));

        m.record_emotion_sample(Emotion::Happy, 1.0);
        let three = m.modulate_detailed(0.5, Emotion::Happy, 12, now);
        assert!(
            (three.emotional_factor - emotion_gain(Emotion::Happy)).abs() > 1e-6,
            "learned average must participate after 3 samples"
        );
    }

    #[test]
    fn test_negative_feedback_lowers_preference() {
        let now = Instant::now();
        let mut m = IntensityModulator::default();
        m.modulate(0.9, Emotion::Happy, 12, now);
        m.record_feedback(true);
        let liked = m.preferred_intensity;

        let mut m2 = IntensityModulator::default();
        m2.modulate(0.9, Emotion::Happy, 12, now);
        m2.record_feedback(false);
        let disliked = m2.preferred_intensity;

        assert!(disliked < liked, "{} >= {}", disliked, liked);
    }

    #[test]
    fn test_personalization_pulls_toward_preference() {
        let now = Instant::now();
        let mut m = IntensityModulator::default();
        // Teach a low preference.
        m.modulate(0.2, Emotion::Neutral, 12, now);
        m.record_feedback(true);
        let b = m.modulate_detailed(0.9, Emotion::Neutral, 12, now + Duration::from_secs(1));
        assert!(
            b.personal_factor < 1.0,
            "high base vs low preference should damp, got {}",
            b.personal_factor
        );
    }

    #[test]
    fn test_reset() {
        let mut m = IntensityModulator::default();
        m.modulate(0.8, Emotion::Happy, 12, Instant::now());
        m.record_feedback(true);
        m.reset();
        assert_eq!(m.turn_count, 0);
        assert_eq!(m.preference_samples, 0);
    }
}
