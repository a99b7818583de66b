//! Eye behavior enhancement: micro-saccades, blinking, pupil and focus.
//!
//! Independent of the micro-expression generator by design — eye motion has
//! its own rhythms. Saccades are periodic randomized offsets that decay
//! back to center; blinking is a three-phase state machine with a small
//! inter-eye timing offset; pupil size and focus are first-order trackers
//! toward light- and emotion-derived targets.

use anima_core::{approach, clamp01, config::EyeConfig, Emotion, FrameTask, ParamMap};
use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkPhase {
    Open,
    Closing,
    Closed,
    Opening,
}

pub struct EyeTracker {
    config: EyeConfig,
    emotion: Emotion,
    /// Ambient light level in [0, 1]; drives pupil dilation inversely.
    light_level: f32,

    saccade_x: f32,
    saccade_y: f32,
    next_saccade: Option<Instant>,

    blink_phase: BlinkPhase,
    phase_started: Option<Instant>,
    next_blink: Option<Instant>,

    pupil: f32,
    focus: f32,

    last_tick: Option<Instant>,
    params: ParamMap,
}

impl Default for EyeTracker {
    fn default() -> Self {
        Self::new(EyeConfig::default())
    }
}

impl EyeTracker {
    pub fn new(config: EyeConfig) -> Self {
        Self {
            config,
            emotion: Emotion::Neutral,
            light_level: 0.5,
            saccade_x: 0.0,
            saccade_y: 0.0,
            next_saccade: None,
            blink_phase: BlinkPhase::Open,
            phase_started: None,
            next_blink: None,
            pupil: 0.5,
            focus: 0.7,
            last_tick: None,
            params: ParamMap::new(),
        }
    }

    pub fn set_emotion(&mut self, emotion: Emotion) {
        self.emotion = emotion;
    }

    pub fn set_light_level(&mut self, level: f32) {
        self.light_level = clamp01(anima_core::sanitize_f32(level, 0.5));
    }

    /// Snapshot of the current output parameters (value copy).
    pub fn params(&self) -> ParamMap {
        self.params.clone()
    }

    pub fn update(&mut self, now: Instant) {
        self.update_with(now, &mut rand::thread_rng());
    }

    pub fn update_with(&mut self, now: Instant, rng: &mut impl Rng) {
        let dt = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32().min(0.1),
            None => 0.016,
        };
        self.last_tick = Some(now);

        self.update_saccade(now, dt, rng);
        let (left_open, right_open) = self.update_blink(now, rng);
        self.update_pupil_and_focus(dt);

        let mut params = ParamMap::new();
        params.set_clamped("eye_offset_x", self.saccade_x, -1.0, 1.0);
        params.set_clamped("eye_offset_y", self.saccade_y, -1.0, 1.0);
        params.set_clamped("eye_open_l", left_open, 0.0, 1.0);
        params.set_clamped("eye_open_r", right_open, 0.0, 1.0);
        params.set_clamped("eye_pupil", self.pupil, 0.0, 1.0);
        params.set_clamped("eye_focus", self.focus, 0.0, 1.0);
        self.params = params;
    }

    fn update_saccade(&mut self, now: Instant, dt: f32, rng: &mut impl Rng) {
        let due = self.next_saccade.map_or(true, |at| now >= at);
        if due {
            let amp = self.config.saccade_amplitude.max(0.0);
            self.saccade_x = rng.gen_range(-amp..=amp);
            self.saccade_y = rng.gen_range(-amp..=amp) * 0.6; // eyes wander less vertically
            let secs = rng.gen_range(
                self.config.saccade_min_interval_secs..=self.config.saccade_max_interval_secs.max(self.config.saccade_min_interval_secs + 0.01),
            );
            self.next_saccade = Some(now + Duration::from_secs_f32(secs));
        } else {
            // Exponential decay back toward center between events.
            let k = (-self.config.saccade_decay * dt).exp();
            self.saccade_x *= k;
            self.saccade_y *= k;
        }
    }

    /// Advance the blink state machine; returns (left, right) openness.
    fn update_blink(&mut self, now: Instant, rng: &mut impl Rng) -> (f32, f32) {
        let close_ms = self.config.blink_close_ms.max(1) as f32;
        let hold_ms = self.config.blink_hold_ms as f32;
        let open_ms = self.config.blink_open_ms.max(1) as f32;

        if self.next_blink.is_none() {
            self.next_blink = Some(now + self.roll_blink_interval(rng));
        }

        let elapsed_ms = |started: Option<Instant>| {
            started
                .map(|s| now.saturating_duration_since(s).as_secs_f32() * 1000.0)
                .unwrap_or(0.0)
        };

        match self.blink_phase {
            BlinkPhase::Open => {
                if self.next_blink.is_some_and(|at| now >= at) {
                    self.blink_phase = BlinkPhase::Closing;
                    self.phase_started = Some(now);
                }
            }
            BlinkPhase::Closing => {
                if elapsed_ms(self.phase_started) >= close_ms {
                    self.blink_phase = BlinkPhase::Closed;
                    self.phase_started = Some(now);
                }
            }
            BlinkPhase::Closed => {
                if elapsed_ms(self.phase_started) >= hold_ms {
                    self.blink_phase = BlinkPhase::Opening;
                    self.phase_started = Some(now);
                }
            }
            BlinkPhase::Opening => {
                if elapsed_ms(self.phase_started) >= open_ms {
                    self.blink_phase = BlinkPhase::Open;
                    self.phase_started = None;
                    self.next_blink = Some(now + self.roll_blink_interval(rng));
                }
            }
        }

        let t = elapsed_ms(self.phase_started);
        let offset = self.config.eye_phase_offset_ms as f32;
        let left = self.openness_at(t);
        // The right eye runs the same phase timeline slightly behind.
        let right = self.openness_at((t - offset).max(0.0));
        (left, right)
    }

    fn openness_at(&self, phase_elapsed_ms: f32) -> f32 {
        let close_ms = self.config.blink_close_ms.max(1) as f32;
        let open_ms = self.config.blink_open_ms.max(1) as f32;
        match self.blink_phase {
            BlinkPhase::Open => 1.0,
            BlinkPhase::Closing => clamp01(1.0 - phase_elapsed_ms / close_ms),
            BlinkPhase::Closed => 0.0,
            BlinkPhase::Opening => clamp01(phase_elapsed_ms / open_ms),
        }
    }

    fn roll_blink_interval(&self, rng: &mut impl Rng) -> Duration {
        let min = self.config.blink_min_interval_secs.max(0.1);
        let max = self.config.blink_max_interval_secs.max(min + 0.1);
        // Anxious and tired states blink faster.
        let scale = match self.emotion {
            Emotion::Anxious | Emotion::Fear | Emotion::Embarrassed => 0.5,
            Emotion::Bored | Emotion::Sad => 0.8,
            Emotion::Surprised => 1.4, // wide-eyed
            _ => 1.0,
        };
        Duration::from_secs_f32(rng.gen_range(min..=max) * scale)
    }

    fn update_pupil_and_focus(&mut self, dt: f32) {
        // Pupil: dilates in the dark and with high-arousal emotions.
        let emotion_bias = match self.emotion {
            Emotion::Fear | Emotion::Surprised | Emotion::Excited => 0.2,
            Emotion::Loving | Emotion::Curious => 0.1,
            Emotion::Disgust | Emotion::Contempt => -0.1,
            _ => 0.0,
        };
        let pupil_target = clamp01(0.75 - self.light_level * 0.5 + emotion_bias);
        self.pupil = approach(self.pupil, pupil_target, self.config.pupil_rate, dt);

        // Focus: drifts down when thinking/bored, sharpens when engaged.
        let focus_target = match self.emotion {
            Emotion::Thinking | Emotion::Confused => 0.35,
            Emotion::Bored | Emotion::Lonely => 0.3,
            Emotion::Determined | Emotion::Curious | Emotion::Surprised => 0.95,
            Emotion::Sad => 0.45,
            _ => 0.7,
        };
        self.focus = approach(self.focus, focus_target, self.config.focus_rate, dt);
    }
}

impl FrameTask for EyeTracker {
    fn tick(&mut self, now: Instant) {
        self.update(now);
    }

    fn reset(&mut self) {
        self.emotion = Emotion::Neutral;
        self.saccade_x = 0.0;
        self.saccade_y = 0.0;
        self.next_saccade = None;
        self.blink_phase = BlinkPhase::Open;
        self.phase_started = None;
        self.next_blink = None;
        self.pupil = 0.5;
        self.focus = 0.7;
        self.last_tick = None;
        self.params.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run(eye: &mut EyeTracker, start: Instant, frames: usize, seed: u64) -> Instant {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut now = start;
        for _ in 0..frames {
            now += Duration::from_millis(16);
            eye.update_with(now, &mut rng);
        }
        now
    }

    #[test]
    fn test_params_in_range_over_long_run() {
        let mut eye = EyeTracker::default();
        eye.set_emotion(Emotion::Anxious);
        run(&mut eye, Instant::now(), 3000, 7); // ~48s
        for (name, v) in eye.params().iter() {
            assert!(v.is_finite(), "{} not finite", name);
            match name {
                "eye_offset_x" | "eye_offset_y" => assert!((-1.0..=1.0).contains(&v)),
                _ => assert!((0.0..=1.0).contains(&v), "{} = {}", name, v),
            }
        }
    }

    #[test]
    fn test_blink_cycle_completes() {
        let mut eye = EyeTracker::new(EyeConfig {
            blink_min_interval_secs: 0.1,
            blink_max_interval_secs: 0.2,
            ..EyeConfig::default()
        });
        let mut saw_closed = false;
        let mut rng = SmallRng::seed_from_u64(3);
        let mut now = Instant::now();
        for _ in 0..400 {
            now += Duration::from_millis(8);
            eye.update_with(now, &mut rng);
            if eye.params().get("eye_open_l").unwrap_or(1.0) < 0.1 {
                saw_closed = true;
            }
        }
        assert!(saw_closed, "eyes should have blinked within ~3s");
        // And reopened at some point afterwards.
        let mut reopened = false;
        for _ in 0..100 {
            now += Duration::from_millis(16);
            eye.update_with(now, &mut rng);
            if eye.params().get("eye_open_l").unwrap_or(0.0) > 0.9 {
                reopened = true;
            }
        }
        assert!(reopened, "eyes should reopen between blinks");
    }

    #[test]
    fn test_inter_eye_offset_during_closing() {
        let mut eye = EyeTracker::default();
        // Force the machine into Closing and sample mid-phase.
        eye.blink_phase = BlinkPhase::Closing;
        let now = Instant::now();
        eye.phase_started = Some(now);
        eye.next_blink = Some(now + Duration::from_secs(100));
        let mut rng = SmallRng::seed_from_u64(1);
        let sample = now + Duration::from_millis(40); // mid-closing (80ms phase)
        eye.update_with(sample, &mut rng);
        let left = eye.params().get("eye_open_l").unwrap();
        let right = eye.params().get("eye_open_r").unwrap();
        assert!(
            right > left,
            "right eye lags the close: left {} right {}",
            left,
            right
        );
    }

    #[test]
    fn test_pupil_dilates_in_dark() {
        let t0 = Instant::now();
        let mut dark = EyeTracker::default();
        dark.set_light_level(0.0);
        run(&mut dark, t0, 300, 5);

        let mut bright = EyeTracker::default();
        bright.set_light_level(1.0);
        run(&mut bright, t0, 300, 5);

        let dark_pupil = dark.params().get("eye_pupil").unwrap();
        let bright_pupil = bright.params().get("eye_pupil").unwrap();
        assert!(
            dark_pupil > bright_pupil,
            "dark {} <= bright {}",
            dark_pupil,
            bright_pupil
        );
    }

    #[test]
    fn test_focus_drops_when_thinking() {
        let t0 = Instant::now();
        let mut eye = EyeTracker::default();
        eye.set_emotion(Emotion::Thinking);
        run(&mut eye, t0, 400, 6);
        let focus = eye.params().get("eye_focus").unwrap();
        assert!(focus < 0.5, "thinking focus should drift down, got {}", focus);
    }

    #[test]
    fn test_saccade_decays_between_events() {
        let mut eye = EyeTracker::new(EyeConfig {
            saccade_min_interval_secs: 100.0,
            saccade_max_interval_secs: 101.0,
            ..EyeConfig::default()
        });
        let mut rng = SmallRng::seed_from_u64(9);
        let t0 = Instant::now();
        eye.update_with(t0, &mut rng); // first roll happens immediately
        let initial = eye.saccade_x.abs() + eye.saccade_y.abs();
        let mut now = t0;
        for _ in 0..120 {
            now += Duration::from_millis(16);
            eye.update_with(now, &mut rng);
        }
        let settled = eye.saccade_x.abs() + eye.saccade_y.abs();
        assert!(
            settled < initial || initial < 1e-6,
            "saccade offset should decay: {} -> {}",
            initial,
            settled
        );
    }

    #[test]
    fn test_light_level_sanitized() {
        let mut eye = EyeTracker::default();
        eye.set_light_level(f32::NAN);
        assert!(eye.light_level.is_finite());
        eye.set_light_level(42.0);
        assert_eq!(eye.light_level, 1.0);
    }

    #[test]
    fn test_reset() {
        let mut eye = EyeTracker::default();
        run(&mut eye, Instant::now(), 50, 2);
        eye.reset();
        assert!(eye.params().is_empty());
        assert_eq!(eye.blink_phase, BlinkPhase::Open);
    }
}
