//! Workspace configuration.
//!
//! Every struct here is `#[serde(default)]` down to the leaves, so a partial
//! TOML file deep-merges against defaults — a malformed or missing field can
//! never take the animation stack down.

use crate::math::Easing;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnimaConfig {
    pub frame: FrameConfig,
    pub transition: TransitionConfig,
    pub context: ContextConfig,
    pub physics: PhysicsConfig,
    pub micro: MicroConfig,
    pub eye: EyeConfig,
    pub touch: TouchConfig,
    pub lighting: LightingConfig,
    pub intensity: IntensityConfig,
}

impl AnimaConfig {
    /// Load from a TOML file; missing fields fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AnimaConfig =
            toml::from_str(&content).with_context(|| "failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from path if present, otherwise defaults — never fails.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ANIMA_FRAME_MS") {
            if let Ok(n) = v.parse() {
                self.frame.interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("ANIMA_TRANSITION_SPEED") {
            if let Ok(n) = v.parse() {
                self.transition.transition_speed = n;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frame interval for every subsystem loop (ms).
    pub interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { interval_ms: 16 }
    }
}

impl FrameConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Base transition duration in ms, scaled by emotion distance.
    pub transition_speed: f32,
    pub min_transition_ms: f32,
    pub max_transition_ms: f32,
    /// Momentum floor: repeated same-target sets shrink duration toward
    /// `transition_speed × distance × inertia`, never below.
    pub inertia: f32,
    /// Window within which repeated sets count as one gesture (ms).
    pub momentum_window_ms: u64,
    pub easing: Easing,
    /// Max retained history entries.
    pub history_limit: usize,
    /// History entries older than this are evicted (seconds).
    pub history_window_secs: u64,
    /// Below this compatibility, a blend's secondary emotion is dropped.
    pub compatibility_threshold: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            transition_speed: 500.0,
            min_transition_ms: 120.0,
            max_transition_ms: 2000.0,
            inertia: 0.4,
            momentum_window_ms: 2000,
            easing: Easing::EaseInOut,
            history_limit: 10,
            history_window_secs: 60,
            compatibility_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Emotional inertia half-life window (seconds).
    pub inertia_window_secs: f32,
    /// Minimum resolved intensity before the tone baseline updates at all.
    pub tone_update_threshold: f32,
    /// Baseline emotion can only switch once stability drops below this.
    pub tone_switch_stability: f32,
    /// ... or when resolved intensity exceeds this.
    pub tone_force_intensity: f32,
    /// Stability multiplier applied on each mismatched resolution.
    pub stability_decay: f32,
    pub engagement_smoothing: f32,
    pub topic_stack_limit: usize,
    pub history_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            inertia_window_secs: 30.0,
            tone_update_threshold: 0.4,
            tone_switch_stability: 0.3,
            tone_force_intensity: 0.7,
            stability_decay: 0.7,
            engagement_smoothing: 0.3,
            topic_stack_limit: 5,
            history_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed simulation step consumed by the accumulator (ms).
    pub time_step_ms: f32,
    /// Real frame deltas are capped here before entering the accumulator,
    /// so a debugger pause or tab-suspend resume cannot inject a huge
    /// impulse (ms).
    pub max_frame_delta_ms: f32,
    pub constraint_iterations: usize,
    pub gravity_x: f32,
    pub gravity_y: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            time_step_ms: 16.67,
            max_frame_delta_ms: 100.0,
            constraint_iterations: 3,
            gravity_x: 0.0,
            gravity_y: 400.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MicroConfig {
    /// Target changes per minute for each sub-generator.
    pub frequency: f32,
    pub amplitude: f32,
    /// Exponential hold on displayed values: 0 = instant, 1 = frozen.
    pub smoothness: f32,
    /// Left/right split applied around each rolled target.
    pub asymmetry: f32,
    pub fluctuation_amplitude: f32,
}

impl Default for MicroConfig {
    fn default() -> Self {
        Self {
            frequency: 12.0,
            amplitude: 0.15,
            smoothness: 0.85,
            asymmetry: 0.3,
            fluctuation_amplitude: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    pub saccade_amplitude: f32,
    pub saccade_min_interval_secs: f32,
    pub saccade_max_interval_secs: f32,
    /// Saccade offset decay rate (per second).
    pub saccade_decay: f32,
    pub blink_min_interval_secs: f32,
    pub blink_max_interval_secs: f32,
    pub blink_close_ms: u64,
    pub blink_hold_ms: u64,
    pub blink_open_ms: u64,
    /// Right eye lags the left by this much for natural asymmetry (ms).
    pub eye_phase_offset_ms: u64,
    /// First-order tracker rates (per second).
    pub pupil_rate: f32,
    pub focus_rate: f32,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            saccade_amplitude: 0.08,
            saccade_min_interval_secs: 0.8,
            saccade_max_interval_secs: 3.0,
            saccade_decay: 6.0,
            blink_min_interval_secs: 2.0,
            blink_max_interval_secs: 7.0,
            blink_close_ms: 80,
            blink_hold_ms: 40,
            blink_open_ms: 120,
            eye_phase_offset_ms: 30,
            pupil_rate: 4.0,
            focus_rate: 2.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    pub long_press_ms: u64,
    pub double_tap_ms: u64,
    /// Movement beyond this distance classifies as a drag.
    pub drag_threshold: f32,
    /// Movement in (rub_threshold, drag_threshold] classifies as a rub;
    /// anything at or below is jitter and is ignored.
    pub rub_threshold: f32,
    pub default_cooldown_ms: u64,
    pub cooldown_multiplier: f32,
    pub affection_decay_per_hour: f32,
    pub initial_affection: f32,
    /// More than this many events on one area within the window trips the
    /// excessive-touch breaker.
    pub breaker_limit: usize,
    pub breaker_window_secs: u64,
    pub breaker_penalty: f32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 600,
            double_tap_ms: 300,
            drag_threshold: 10.0,
            rub_threshold: 3.0,
            default_cooldown_ms: 1000,
            cooldown_multiplier: 1.0,
            affection_decay_per_hour: 0.5,
            initial_affection: 50.0,
            breaker_limit: 8,
            breaker_window_secs: 10,
            breaker_penalty: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub animation_enabled: bool,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            animation_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    pub min_intensity: f32,
    pub max_intensity: f32,
    /// The combined multiplier is clamped to [min_multiplier, max_multiplier]
    /// before being applied.
    pub min_multiplier: f32,
    pub max_multiplier: f32,
    /// Fatigue accumulated per conversation turn.
    pub fatigue_per_turn: f32,
    /// Fatigue accumulated per hour of session time.
    pub fatigue_per_hour: f32,
    /// Fatigue recovered per minute of idle time.
    pub fatigue_recovery_per_minute: f32,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            min_intensity: 0.1,
            max_intensity: 1.0,
            min_multiplier: 0.3,
            max_multiplier: 1.5,
            fatigue_per_turn: 0.01,
            fatigue_per_hour: 0.15,
            fatigue_recovery_per_minute: 0.05,
        }
    }
}
