//! Micro-expression generation.
//!
//! Layers two kinds of motion on top of the base expression: slow stochastic
//! drift (brow, eye wander, mouth corners — each channel rolls a new random
//! target on its own randomized schedule and eases toward it) and short
//! reactive bursts triggered by text patterns, faded in and out with a
//! triangular envelope. Concurrent bursts sum additively.

use anima_core::{config::MicroConfig, lerp, Emotion, FrameTask, ParamMap};
use rand::Rng;
use std::time::{Duration, Instant};

/// The three drift channels. Each owns a left/right (or x/y) value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroChannel {
    Brow,
    EyeWander,
    MouthCorner,
}

#[derive(Debug, Clone)]
struct DriftChannel {
    channel: MicroChannel,
    param_a: &'static str,
    param_b: &'static str,
    enabled: bool,
    /// Rolled targets, held until the next roll.
    target_a: f32,
    target_b: f32,
    /// Displayed values easing toward the targets.
    shown_a: f32,
    shown_b: f32,
    next_roll: Option<Instant>,
    /// Phase offset that decorrelates this channel's fluctuation.
    phase: f32,
}

impl DriftChannel {
    fn new(channel: MicroChannel, param_a: &'static str, param_b: &'static str, phase: f32) -> Self {
        Self {
            channel,
            param_a,
            param_b,
            enabled: true,
            target_a: 0.0,
            target_b: 0.0,
            shown_a: 0.0,
            shown_b: 0.0,
            next_roll: None,
            phase,
        }
    }
}

/// Short reactive expressions layered over the drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Surprise,
    Delight,
    Doubt,
    Dismay,
    Shy,
}

impl ReactionKind {
    fn duration(&self) -> Duration {
        match self {
            ReactionKind::Surprise => Duration::from_millis(600),
            ReactionKind::Delight => Duration::from_millis(800),
            ReactionKind::Doubt => Duration::from_millis(700),
            ReactionKind::Dismay => Duration::from_millis(900),
            ReactionKind::Shy => Duration::from_millis(1000),
        }
    }

    /// Parameter deltas at full envelope.
    fn deltas(&self) -> &'static [(&'static str, f32)] {
        match self {
            ReactionKind::Surprise => &[
                ("micro_brow_l", 0.5),
                ("micro_brow_r", 0.45),
                ("micro_mouth_l", 0.15),
                ("micro_mouth_r", 0.15),
            ],
            ReactionKind::Delight => &[
                ("micro_mouth_l", 0.4),
                ("micro_mouth_r", 0.4),
                ("micro_brow_l", 0.1),
                ("micro_brow_r", 0.1),
            ],
            ReactionKind::Doubt => &[("micro_brow_l", 0.35), ("micro_brow_r", -0.2)],
            ReactionKind::Dismay => &[
                ("micro_brow_l", -0.3),
                ("micro_brow_r", -0.3),
                ("micro_mouth_l", -0.35),
                ("micro_mouth_r", -0.35),
            ],
            ReactionKind::Shy => &[
                ("micro_eye_x", 0.3),
                ("micro_mouth_l", 0.1),
                ("micro_mouth_r", 0.1),
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct Burst {
    kind: ReactionKind,
    started: Instant,
    duration: Duration,
}

impl Burst {
    /// Triangular envelope: 20% fade-in, 20% fade-out.
    fn envelope(&self, now: Instant) -> f32 {
        let t = now.saturating_duration_since(self.started).as_secs_f32()
            / self.duration.as_secs_f32().max(1e-3);
        if t >= 1.0 {
            0.0
        } else if t < 0.2 {
            t / 0.2
        } else if t > 0.8 {
            (1.0 - t) / 0.2
        } else {
            1.0
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// Text patterns that trigger reactive bursts.
const REACTION_PATTERNS: &[(ReactionKind, &[&str])] = &[
    (
        ReactionKind::Surprise,
        &["?!", "！？", "?！", "居然", "竟然", "没想到", "真的假的", "no way", "what?!"],
    ),
    (
        ReactionKind::Delight,
        &["哈哈", "太好了", "太棒了", "好耶", "haha", "yay", "awesome"],
    ),
    (
        ReactionKind::Doubt,
        &["真的吗", "是吗", "确定吗", "really?", "are you sure", "hmm"],
    ),
    (
        ReactionKind::Dismay,
        &["唉", "呜", "惨了", "糟了", "oh no", "ugh", "sigh"],
    ),
    (
        ReactionKind::Shy,
        &["讨厌啦", "害羞", "脸红", "你真坏", "blush", "stop it~"],
    ),
];

pub struct MicroExpressionGenerator {
    config: MicroConfig,
    emotion: Emotion,
    channels: Vec<DriftChannel>,
    bursts: Vec<Burst>,
    origin: Instant,
    params: ParamMap,
}

impl Default for MicroExpressionGenerator {
    fn default() -> Self {
        Self::new(MicroConfig::default())
    }
}

impl MicroExpressionGenerator {
    pub fn new(config: MicroConfig) -> Self {
        Self {
            config,
            emotion: Emotion::Neutral,
            channels: vec![
                DriftChannel::new(MicroChannel::Brow, "micro_brow_l", "micro_brow_r", 0.0),
                DriftChannel::new(MicroChannel::EyeWander, "micro_eye_x", "micro_eye_y", 2.1),
                DriftChannel::new(
                    MicroChannel::MouthCorner,
                    "micro_mouth_l",
                    "micro_mouth_r",
                    4.2,
                ),
            ],
            bursts: Vec::new(),
            origin: Instant::now(),
            params: ParamMap::new(),
        }
    }

    pub fn set_emotion(&mut self, emotion: Emotion) {
        self.emotion = emotion;
    }

    pub fn set_channel_enabled(&mut self, channel: MicroChannel, enabled: bool) {
        if let Some(c) = self.channels.iter_mut().find(|c| c.channel == channel) {
            c.enabled = enabled;
            if !enabled {
                c.shown_a = 0.0;
                c.shown_b = 0.0;
                c.target_a = 0.0;
                c.target_b = 0.0;
            }
        }
    }

    /// Fire a reactive burst immediately.
    pub fn trigger_reaction(&mut self, kind: ReactionKind, now: Instant) {
        tracing::trace!("micro reaction burst: {:?}", kind);
        self.bursts.push(Burst {
            kind,
            started: now,
            duration: kind.duration(),
        });
    }

    /// Scan text for burst-triggering patterns; returns what fired.
    pub fn analyze_and_react(&mut self, text: &str, now: Instant) -> Vec<ReactionKind> {
        let lower = text.to_lowercase();
        let mut fired = Vec::new();
        for (kind, patterns) in REACTION_PATTERNS {
            if patterns.iter().any(|p| lower.contains(*p)) {
                self.trigger_reaction(*kind, now);
                fired.push(*kind);
            }
        }
        fired
    }

    /// Number of bursts still active (for tests/diagnostics).
    pub fn active_bursts(&self) -> usize {
        self.bursts.len()
    }

    /// Snapshot of the current output parameters (value copy).
    pub fn params(&self) -> ParamMap {
        self.params.clone()
    }

    pub fn update(&mut self, now: Instant) {
        self.update_with(now, &mut rand::thread_rng());
    }

    pub fn update_with(&mut self, now: Instant, rng: &mut impl Rng) {
        let cfg = &self.config;
        let amplitude = cfg.amplitude.max(0.0);
        let ease = (1.0 - cfg.smoothness).clamp(0.01, 1.0);
        let affect = self.emotion.affect();

        // Sinusoidal low-frequency fluctuation, scaled up with arousal.
        let phase_clock = now.saturating_duration_since(self.origin).as_secs_f32();
        let fluct_amp = cfg.fluctuation_amplitude * (0.5 + affect.arousal);

        for channel in &mut self.channels {
            if !channel.enabled {
                continue;
            }

            // Roll a new held target when this channel's schedule is due.
            let due = channel.next_roll.map_or(true, |at| now >= at);
            if due {
                let base = rng.gen_range(-amplitude..=amplitude);
                let split = rng.gen_range(-cfg.asymmetry..=cfg.asymmetry) * amplitude;
                channel.target_a = base + split;
                channel.target_b = base - split;

                let interval_ms =
                    60_000.0 / cfg.frequency.max(0.1) * rng.gen_range(0.5..1.5);
                channel.next_roll =
                    Some(now + Duration::from_millis(interval_ms.max(1.0) as u64));
            }

            // Displayed values ease toward the held targets.
            channel.shown_a = lerp(channel.shown_a, channel.target_a, ease);
            channel.shown_b = lerp(channel.shown_b, channel.target_b, ease);
        }

        // Base offsets from the current emotion: mouth corners carry
        // valence, brows drop a little on negative valence.
        let mouth_base = affect.valence * 0.15;
        let brow_base = if affect.valence < 0.0 {
            affect.valence * 0.1
        } else {
            0.0
        };

        self.bursts.retain(|b| !b.expired(now));
        let mut burst_sum: Vec<(&'static str, f32)> = Vec::new();
        for burst in &self.bursts {
            let env = burst.envelope(now);
            for (name, delta) in burst.kind.deltas() {
                match burst_sum.iter_mut().find(|(n, _)| n == name) {
                    Some((_, v)) => *v += delta * env,
                    None => burst_sum.push((name, delta * env)),
                }
            }
        }
        let burst = |name: &str| -> f32 {
            burst_sum
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .unwrap_or(0.0)
        };

        let mut params = ParamMap::new();
        for channel in &self.channels {
            let fluct = fluct_amp * (phase_clock * 0.8 + channel.phase).sin();
            let (base_a, base_b) = match channel.channel {
                MicroChannel::Brow => (brow_base, brow_base),
                MicroChannel::EyeWander => (0.0, 0.0),
                MicroChannel::MouthCorner => (mouth_base, mouth_base),
            };
            params.set_clamped(
                channel.param_a,
                base_a + channel.shown_a + fluct + burst(channel.param_a),
                -1.0,
                1.0,
            );
            params.set_clamped(
                channel.param_b,
                base_b + channel.shown_b + fluct + burst(channel.param_b),
                -1.0,
                1.0,
            );
        }
        self.params = params;
    }
}

impl FrameTask for MicroExpressionGenerator {
    fn tick(&mut self, now: Instant) {
        self.update(now);
    }

    fn reset(&mut self) {
        self.bursts.clear();
        self.params.clear();
        self.emotion = Emotion::Neutral;
        for channel in &mut self.channels {
            channel.shown_a = 0.0;
            channel.shown_b = 0.0;
            channel.target_a = 0.0;
            channel.target_b = 0.0;
            channel.next_roll = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run(gen: &mut MicroExpressionGenerator, start: Instant, frames: usize) -> Instant {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut now = start;
        for _ in 0..frames {
            now += Duration::from_millis(16);
            gen.update_with(now, &mut rng);
        }
        now
    }

    #[test]
    fn test_outputs_stay_in_range() {
        let mut gen = MicroExpressionGenerator::default();
        gen.set_emotion(Emotion::Excited);
        let now = run(&mut gen, Instant::now(), 600);
        gen.trigger_reaction(ReactionKind::Surprise, now);
        run(&mut gen, now, 100);
        for (name, value) in gen.params().iter() {
            assert!(
                (-1.0..=1.0).contains(&value),
                "{} out of range: {}",
                name,
                value
            );
        }
    }

    #[test]
    fn test_drift_produces_motion() {
        let mut gen = MicroExpressionGenerator::default();
        let t0 = Instant::now();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut samples = Vec::new();
        let mut now = t0;
        for _ in 0..2000 {
            now += Duration::from_millis(16);
            gen.update_with(now, &mut rng);
            samples.push(gen.params().get("micro_brow_l").unwrap_or(0.0));
        }
        let min = samples.iter().cloned().fold(f32::MAX, f32::min);
        let max = samples.iter().cloned().fold(f32::MIN, f32::max);
        assert!(max - min > 0.01, "brow should drift over 32s, span {}", max - min);
    }

    #[test]
    fn test_disabled_channel_is_silent_drift() {
        let mut gen = MicroExpressionGenerator::default();
        gen.set_channel_enabled(MicroChannel::Brow, false);
        // Neutral emotion → no brow base offset, and fluctuation is the
        // only remaining term.
        let fluct_bound = gen.config.fluctuation_amplitude * 1.6;
        run(&mut gen, Instant::now(), 300);
        let brow = gen.params().get("micro_brow_l").unwrap_or(0.0);
        assert!(
            brow.abs() <= fluct_bound + 1e-4,
            "disabled channel should only fluctuate, got {}",
            brow
        );
    }

    #[test]
    fn test_burst_envelope_rises_peaks_fades() {
        let mut gen = MicroExpressionGenerator::default();
        gen.set_channel_enabled(MicroChannel::Brow, true);
        let t0 = Instant::now();
        let mut rng = SmallRng::seed_from_u64(1);
        gen.update_with(t0, &mut rng);
        gen.trigger_reaction(ReactionKind::Surprise, t0);

        let burst = Burst {
            kind: ReactionKind::Surprise,
            started: t0,
            duration: ReactionKind::Surprise.duration(),
        };
        let early = burst.envelope(t0 + Duration::from_millis(60)); // 10%
        let mid = burst.envelope(t0 + Duration::from_millis(300)); // 50%
        let late = burst.envelope(t0 + Duration::from_millis(570)); // 95%
        assert!(early < 1.0 && early > 0.0);
        assert_eq!(mid, 1.0);
        assert!(late < 1.0 && late > 0.0);
        assert_eq!(burst.envelope(t0 + Duration::from_millis(700)), 0.0);
    }

    #[test]
    fn test_bursts_expire() {
        let mut gen = MicroExpressionGenerator::default();
        let t0 = Instant::now();
        gen.trigger_reaction(ReactionKind::Delight, t0);
        gen.trigger_reaction(ReactionKind::Doubt, t0);
        assert_eq!(gen.active_bursts(), 2);
        let mut rng = SmallRng::seed_from_u64(2);
        gen.update_with(t0 + Duration::from_secs(5), &mut rng);
        assert_eq!(gen.active_bursts(), 0);
    }

    #[test]
    fn test_concurrent_bursts_sum() {
        let mut gen = MicroExpressionGenerator::default();
        // Kill drift and fluctuation so only bursts contribute.
        gen.config.fluctuation_amplitude = 0.0;
        gen.config.amplitude = 0.0;
        let t0 = Instant::now();
        let mut rng = SmallRng::seed_from_u64(3);

        gen.trigger_reaction(ReactionKind::Surprise, t0);
        gen.update_with(t0 + Duration::from_millis(300), &mut rng);
        let single = gen.params().get("micro_brow_l").unwrap_or(0.0);

        gen.trigger_reaction(ReactionKind::Doubt, t0 + Duration::from_millis(160));
        gen.update_with(t0 + Duration::from_millis(310), &mut rng);
        let stacked = gen.params().get("micro_brow_l").unwrap_or(0.0);
        assert!(
            stacked > single,
            "two bursts should add: {} <= {}",
            stacked,
            single
        );
    }

    #[test]
    fn test_analyze_and_react_patterns() {
        let mut gen = MicroExpressionGenerator::default();
        let now = Instant::now();
        let fired = gen.analyze_and_react("居然是这样？！", now);
        assert!(fired.contains(&ReactionKind::Surprise));

        let fired = gen.analyze_and_react("哈哈太好了", now);
        assert!(fired.contains(&ReactionKind::Delight));

        let fired = gen.analyze_and_react("平常的一句话", now);
        assert!(fired.is_empty());
    }

    #[test]
    fn test_reset_clears_bursts_and_params() {
        let mut gen = MicroExpressionGenerator::default();
        let now = Instant::now();
        gen.trigger_reaction(ReactionKind::Shy, now);
        gen.update(now);
        gen.reset();
        assert_eq!(gen.active_bursts(), 0);
        assert!(gen.params().is_empty());
    }
}
