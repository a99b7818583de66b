//! The emotion transition engine.
//!
//! Owns the authoritative "current displayed emotion" and moves it toward
//! requested targets under naturalness constraints: per-pair distances set
//! the journey length, easing shapes it, momentum shortens repeated
//! requests within one gesture, and everything is clamped on the way in.
//!
//! The engine itself is synchronous and externally pumped (tests drive it
//! with a synthetic clock); wrap it in a
//! [`FrameLoop`](anima_core::FrameLoop) for self-driving operation.

use crate::distance::{CompatibilityTable, DistanceTable};
use anima_core::{
    clamp01, config::TransitionConfig, lerp, sanitize_f32, BlendedEmotion, Emotion, EmotionState,
    FrameTask, ObserverId, ObserverSet,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Notification emitted on transition boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionEvent {
    Started {
        from: Emotion,
        to: Emotion,
        duration: Duration,
    },
    Completed {
        emotion: Emotion,
        intensity: f32,
    },
}

pub struct TransitionEngine {
    config: TransitionConfig,
    distances: DistanceTable,
    compatibility: CompatibilityTable,

    current: EmotionState,
    start: Option<EmotionState>,
    target: Option<EmotionState>,
    duration: Duration,

    /// Momentum: repeated sets of the same target within the gesture window.
    last_request: Option<(Emotion, Instant)>,
    repeats: u32,

    /// Short, time-windowed record of previous states.
    history: VecDeque<EmotionState>,

    observers: ObserverSet<TransitionEvent>,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(TransitionConfig::default())
    }
}

impl TransitionEngine {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            distances: DistanceTable::default(),
            compatibility: CompatibilityTable::default(),
            current: EmotionState::neutral(Instant::now()),
            start: None,
            target: None,
            duration: Duration::ZERO,
            last_request: None,
            repeats: 0,
            history: VecDeque::new(),
            observers: ObserverSet::new(),
        }
    }

    pub fn with_tables(
        config: TransitionConfig,
        distances: DistanceTable,
        compatibility: CompatibilityTable,
    ) -> Self {
        Self {
            distances,
            compatibility,
            ..Self::new(config)
        }
    }

    pub fn distances(&self) -> &DistanceTable {
        &self.distances
    }

    pub fn distances_mut(&mut self) -> &mut DistanceTable {
        &mut self.distances
    }

    /// Subscribe to transition start/complete notifications.
    pub fn on_transition(
        &mut self,
        callback: impl Fn(&TransitionEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Begin a transition toward `emotion`.
    ///
    /// Duration = base speed × pairwise distance, shrunk by momentum when
    /// the same target is requested repeatedly within one gesture, then
    /// clamped to the configured window.
    pub fn set_emotion(&mut self, emotion: Emotion, intensity: f32, now: Instant) {
        let intensity = clamp01(sanitize_f32(intensity, 0.5));
        self.push_history(now);

        // Momentum tracking.
        let window = Duration::from_millis(self.config.momentum_window_ms);
        match self.last_request {
            Some((e, at)) if e == emotion && now.saturating_duration_since(at) <= window => {
                self.repeats = self.repeats.saturating_add(1);
            }
            _ => self.repeats = 0,
        }
        self.last_request = Some((emotion, now));

        let distance = self.distances.distance(self.current.emotion, emotion);
        let momentum = (1.0 - 0.2 * self.repeats as f32).max(self.config.inertia.clamp(0.05, 1.0));
        let ms = (self.config.transition_speed * distance * momentum)
            .clamp(self.config.min_transition_ms, self.config.max_transition_ms);

        let from = self.current.emotion;
        self.start = Some(EmotionState::new(
            self.current.emotion,
            self.current.intensity,
            now,
        ));
        self.target = Some(EmotionState::new(emotion, intensity, now));
        self.duration = Duration::from_secs_f32((ms / 1000.0).max(0.001));

        tracing::debug!(
            "transition {} -> {} over {:?} (distance {:.2}, momentum {:.2})",
            from,
            emotion,
            self.duration,
            distance,
            momentum
        );
        self.observers.emit(&TransitionEvent::Started {
            from,
            to: emotion,
            duration: self.duration,
        });
    }

    /// Snap directly to a state, canceling any in-flight transition.
    pub fn set_emotion_immediate(&mut self, emotion: Emotion, intensity: f32, now: Instant) {
        self.push_history(now);
        self.current = EmotionState::new(emotion, intensity, now);
        self.start = None;
        self.target = None;
        self.duration = Duration::ZERO;
        self.repeats = 0;
        self.last_request = None;
        self.observers.emit(&TransitionEvent::Completed {
            emotion,
            intensity: self.current.intensity,
        });
    }

    /// Advance the transition. Returns true when a transition finalized on
    /// this call.
    pub fn update(&mut self, now: Instant) -> bool {
        let (Some(start), Some(target)) = (self.start, self.target) else {
            return false;
        };
        let progress = self.raw_progress(now);
        if progress >= 1.0 {
            self.current = EmotionState::new(target.emotion, target.intensity, now);
            self.start = None;
            self.target = None;
            self.duration = Duration::ZERO;
            self.observers.emit(&TransitionEvent::Completed {
                emotion: self.current.emotion,
                intensity: self.current.intensity,
            });
            return true;
        }

        // Track displayed intensity so a mid-flight retarget starts from
        // what is actually on screen.
        let eased = clamp01(self.config.easing.apply(progress));
        self.current.intensity = lerp(start.intensity, target.intensity, eased);
        false
    }

    fn raw_progress(&self, now: Instant) -> f32 {
        let Some(start) = self.start else {
            return 1.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(start.changed_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Primary/secondary weighting of the displayed state right now.
    ///
    /// Computed on demand; a finished-but-not-yet-finalized transition
    /// reads as settled on the target.
    pub fn blended_state(&self, now: Instant) -> BlendedEmotion {
        let (Some(start), Some(target)) = (self.start, self.target) else {
            return BlendedEmotion::single(self.current.emotion);
        };
        let progress = self.raw_progress(now);
        if progress >= 1.0 || start.emotion == target.emotion {
            let mut b = BlendedEmotion::single(target.emotion);
            b.progress = clamp01(progress);
            return b;
        }
        let eased = clamp01(self.config.easing.apply(progress));
        let blend = if eased >= 0.5 {
            BlendedEmotion::pair(target.emotion, start.emotion, eased, progress)
        } else {
            BlendedEmotion::pair(start.emotion, target.emotion, 1.0 - eased, progress)
        };
        self.apply_compatibility(blend)
    }

    /// Combine arbitrary weighted emotions into a primary/secondary blend.
    /// Incompatible secondaries (below the threshold) collapse to primary.
    pub fn blend_emotions(&self, entries: &[(Emotion, f32)]) -> BlendedEmotion {
        let mut weighted: Vec<(Emotion, f32)> = entries
            .iter()
            .map(|(e, w)| (*e, sanitize_f32(*w, 0.0).max(0.0)))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        if weighted.is_empty() {
            return BlendedEmotion::single(self.current.emotion);
        }
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
        if weighted.len() == 1 {
            return BlendedEmotion::single(weighted[0].0);
        }
        let (primary, pw) = weighted[0];
        let (secondary, sw) = weighted[1];
        let total = pw + sw;
        if total <= f32::EPSILON {
            return BlendedEmotion::single(primary);
        }
        let blend = BlendedEmotion::pair(primary, secondary, pw / total, 1.0);
        self.apply_compatibility(blend)
    }

    fn apply_compatibility(&self, blend: BlendedEmotion) -> BlendedEmotion {
        match blend.secondary {
            Some(secondary)
                if self.compatibility.compatibility(blend.primary, secondary)
                    < self.config.compatibility_threshold =>
            {
                blend.collapse()
            }
            _ => blend,
        }
    }

    pub fn current_state(&self) -> EmotionState {
        self.current
    }

    pub fn target_state(&self) -> Option<EmotionState> {
        self.target
    }

    pub fn is_transitioning(&self) -> bool {
        self.target.is_some()
    }

    /// Recent states recorded on each set call, newest last.
    pub fn history(&self) -> impl Iterator<Item = &EmotionState> {
        self.history.iter()
    }

    fn push_history(&mut self, now: Instant) {
        let window = Duration::from_secs(self.config.history_window_secs);
        self.history.push_back(self.current);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
        while let Some(front) = self.history.front() {
            if now.saturating_duration_since(front.changed_at) > window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }
}

impl FrameTask for TransitionEngine {
    fn tick(&mut self, now: Instant) {
        self.update(now);
    }

    fn reset(&mut self) {
        let now = Instant::now();
        self.current = EmotionState::neutral(now);
        self.start = None;
        self.target = None;
        self.duration = Duration::ZERO;
        self.repeats = 0;
        self.last_request = None;
        self.history.clear();
        self.observers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn engine() -> TransitionEngine {
        TransitionEngine::default()
    }

    #[test]
    fn test_immediate_set_is_idempotent() {
        let mut e = engine();
        let now = Instant::now();
        e.set_emotion_immediate(Emotion::Excited, 1.7, now);
        let s = e.current_state();
        assert_eq!(s.emotion, Emotion::Excited);
        assert_eq!(s.intensity, 1.0, "intensity clamped");
        assert!(!e.is_transitioning());
    }

    #[test]
    fn test_end_to_end_default_config() {
        // transition_speed=500, set_emotion(happy, 0.8): target reads back,
        // and 1000ms later (past any computed duration) the blend is
        // settled on happy.
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion(Emotion::Happy, 0.8, t0);

        let target = e.target_state().expect("target set");
        assert_eq!(target.emotion, Emotion::Happy);
        assert!((target.intensity - 0.8).abs() < 1e-6);

        let t1 = t0 + Duration::from_millis(1000);
        let blend = e.blended_state(t1);
        assert_eq!(blend.primary, Emotion::Happy);
        assert_eq!(blend.secondary_weight, 0.0);
        assert_eq!(blend.progress, 1.0);

        e.update(t1);
        assert_eq!(e.current_state().emotion, Emotion::Happy);
        assert!(!e.is_transitioning());
    }

    #[test]
    fn test_transition_completion_event() {
        let completions = Arc::new(AtomicU32::new(0));
        let mut e = engine();
        {
            let completions = Arc::clone(&completions);
            e.on_transition(move |ev| {
                if matches!(ev, TransitionEvent::Completed { .. }) {
                    completions.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        let t0 = Instant::now();
        e.set_emotion(Emotion::Sad, 0.6, t0);
        assert!(e.is_transitioning());

        e.update(t0 + Duration::from_millis(10));
        assert_eq!(completions.load(Ordering::SeqCst), 0, "not done yet");

        e.update(t0 + Duration::from_millis(1100));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(e.current_state().emotion, Emotion::Sad);
    }

    #[test]
    fn test_distance_monotonicity_in_duration() {
        // happy -> sad must take at least as long as happy -> excited.
        let durations: Vec<Duration> = [Emotion::Sad, Emotion::Excited]
            .iter()
            .map(|&to| {
                let mut e = engine();
                let t0 = Instant::now();
                e.set_emotion_immediate(Emotion::Happy, 1.0, t0);
                e.set_emotion(to, 1.0, t0);
                e.duration
            })
            .collect();
        assert!(
            durations[0] >= durations[1],
            "happy->sad {:?} < happy->excited {:?}",
            durations[0],
            durations[1]
        );
    }

    #[test]
    fn test_same_emotion_still_animates_slightly() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion_immediate(Emotion::Happy, 0.5, t0);
        e.set_emotion(Emotion::Happy, 1.0, t0);
        assert!(e.is_transitioning());
        assert!(e.duration > Duration::ZERO);
    }

    #[test]
    fn test_momentum_shrinks_repeated_requests() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion_immediate(Emotion::Neutral, 0.5, t0);
        e.set_emotion(Emotion::Happy, 1.0, t0);
        let first = e.duration;
        e.set_emotion(Emotion::Happy, 1.0, t0 + Duration::from_millis(100));
        let second = e.duration;
        e.set_emotion(Emotion::Happy, 1.0, t0 + Duration::from_millis(200));
        let third = e.duration;
        assert!(second <= first, "{:?} > {:?}", second, first);
        assert!(third <= second);
        // Momentum bottoms out at the inertia floor, never zero.
        assert!(third >= Duration::from_millis(100));
    }

    #[test]
    fn test_momentum_resets_outside_window() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion(Emotion::Happy, 1.0, t0);
        e.set_emotion(Emotion::Happy, 1.0, t0 + Duration::from_millis(100));
        assert!(e.repeats > 0);
        e.set_emotion(Emotion::Happy, 1.0, t0 + Duration::from_secs(10));
        assert_eq!(e.repeats, 0, "gesture window expired");
    }

    #[test]
    fn test_duration_clamped_to_config_window() {
        let mut e = engine();
        let t0 = Instant::now();
        // Happy -> angry is distance 0.95 → 475ms, inside the window.
        // Force an absurd base speed to hit the max clamp.
        e.config.transition_speed = 100_000.0;
        e.set_emotion(Emotion::Angry, 1.0, t0);
        assert!(e.duration <= Duration::from_millis(2000));

        e.config.transition_speed = 0.001;
        e.set_emotion(Emotion::Sad, 1.0, t0 + Duration::from_secs(5));
        assert!(e.duration >= Duration::from_millis(120));
    }

    #[test]
    fn test_blended_midpoint_keeps_compatible_secondary() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion_immediate(Emotion::Happy, 1.0, t0);
        e.set_emotion(Emotion::Excited, 1.0, t0);
        let mid = t0 + e.duration / 2;
        let blend = e.blended_state(mid);
        assert!(blend.secondary.is_some(), "compatible pair blends");
        assert!((blend.primary_weight + blend.secondary_weight - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blended_incompatible_collapses() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion_immediate(Emotion::Happy, 1.0, t0);
        e.set_emotion(Emotion::Angry, 1.0, t0);
        let mid = t0 + e.duration / 2;
        let blend = e.blended_state(mid);
        // happy × angry compatibility is 0.05, far below the 0.3 threshold.
        assert_eq!(blend.secondary, None);
        assert_eq!(blend.primary_weight, 1.0);
    }

    #[test]
    fn test_retarget_mid_flight_starts_from_displayed_intensity() {
        let mut e = engine();
        let t0 = Instant::now();
        e.set_emotion_immediate(Emotion::Neutral, 0.0, t0);
        e.set_emotion(Emotion::Happy, 1.0, t0);
        let mid = t0 + e.duration / 2;
        e.update(mid);
        let displayed = e.current_state().intensity;
        assert!(displayed > 0.0 && displayed < 1.0);

        e.set_emotion(Emotion::Sad, 0.5, mid);
        let start = e.start.expect("start snapshot");
        assert!((start.intensity - displayed).abs() < 1e-6);
    }

    #[test]
    fn test_blend_emotions_collapse_and_keep() {
        let e = engine();
        let kept = e.blend_emotions(&[(Emotion::Happy, 0.6), (Emotion::Amused, 0.4)]);
        assert_eq!(kept.primary, Emotion::Happy);
        assert_eq!(kept.secondary, Some(Emotion::Amused));

        let collapsed = e.blend_emotions(&[(Emotion::Happy, 0.6), (Emotion::Angry, 0.4)]);
        assert_eq!(collapsed.primary, Emotion::Happy);
        assert_eq!(collapsed.secondary, None);
    }

    #[test]
    fn test_blend_emotions_ignores_bad_weights() {
        let e = engine();
        let b = e.blend_emotions(&[
            (Emotion::Happy, f32::NAN),
            (Emotion::Sad, -3.0),
            (Emotion::Calm, 0.7),
        ]);
        assert_eq!(b.primary, Emotion::Calm);
        assert_eq!(b.secondary, None);
    }

    #[test]
    fn test_history_bounded() {
        let mut e = engine();
        let mut now = Instant::now();
        for i in 0..25 {
            let target = if i % 2 == 0 {
                Emotion::Happy
            } else {
                Emotion::Sad
            };
            e.set_emotion(target, 0.5, now);
            now += Duration::from_millis(50);
        }
        assert!(e.history().count() <= 10);
    }

    #[test]
    fn test_rapid_switching_stays_sane() {
        // Pathological input: rapid random-ish switching must keep every
        // exposed value finite and in range.
        let mut e = engine();
        let mut now = Instant::now();
        let emotions = Emotion::all();
        for i in 0..200 {
            e.set_emotion(emotions[i % emotions.len()], (i as f32) * 0.013, now);
            now += Duration::from_millis(7);
            e.update(now);
            let s = e.current_state();
            assert!(s.intensity >= 0.0 && s.intensity <= 1.0);
            let b = e.blended_state(now);
            assert!(b.primary_weight >= 0.0 && b.primary_weight <= 1.0);
            assert!(b.progress >= 0.0 && b.progress <= 1.0);
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut e = engine();
        let now = Instant::now();
        e.on_transition(|_| {});
        e.set_emotion(Emotion::Happy, 1.0, now);
        e.reset();
        assert!(!e.is_transitioning());
        assert_eq!(e.current_state().emotion, Emotion::Neutral);
        assert_eq!(e.history().count(), 0);
        assert!(e.observers.is_empty());
    }
}
