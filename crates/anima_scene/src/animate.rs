//! Per-light procedural animation.
//!
//! The scene itself is immutable between rebuilds; this animator carries
//! the only frame-to-frame lighting state — per-light phase and the
//! animated intensity/position samples. The CSS-equivalent filter string is
//! recomputed only when animation has actually moved overall intensity,
//! not every frame.

use crate::lighting::{Light, LightAnimation, LightingScene};
use anima_core::FrameTask;
use rand::Rng;
use std::time::Instant;

/// A light with its animation evaluated for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedLight {
    pub light: Light,
    pub intensity: f32,
    pub position: (f32, f32),
}

pub struct SceneAnimator {
    scene: LightingScene,
    enabled: bool,
    origin: Instant,
    /// Per-light phase offsets, assigned at scene install.
    phases: Vec<f32>,
    animated: Vec<AnimatedLight>,
    /// Mean animated intensity at the last filter recompute.
    filter_intensity: f32,
    filter: String,
}

impl SceneAnimator {
    pub fn new(scene: LightingScene) -> Self {
        let phases = (0..scene.lights.len()).map(|i| i as f32 * 1.7).collect();
        let filter = scene.filter.clone();
        let animated = scene
            .lights
            .iter()
            .map(|l| AnimatedLight {
                light: l.clone(),
                intensity: l.intensity,
                position: l.position,
            })
            .collect();
        Self {
            scene,
            enabled: true,
            origin: Instant::now(),
            phases,
            animated,
            filter_intensity: 1.0,
            filter,
        }
    }

    /// Install a freshly built scene; animation phases restart.
    pub fn set_scene(&mut self, scene: LightingScene) {
        *self = Self::new(scene);
    }

    pub fn scene(&self) -> &LightingScene {
        &self.scene
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Lights with this frame's animation applied (value copies).
    pub fn animated_lights(&self) -> Vec<AnimatedLight> {
        self.animated.clone()
    }

    /// Current composite filter string.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn update(&mut self, now: Instant) {
        self.update_with(now, &mut rand::thread_rng());
    }

    pub fn update_with(&mut self, now: Instant, rng: &mut impl Rng) {
        let t = now.saturating_duration_since(self.origin).as_secs_f32();

        for (i, entry) in self.animated.iter_mut().enumerate() {
            let light = &entry.light;
            let phase = self.phases.get(i).copied().unwrap_or(0.0);
            let (intensity, position) = if !self.enabled {
                (light.intensity, light.position)
            } else {
                match light.animation {
                    None => (light.intensity, light.position),
                    Some(LightAnimation::Pulse { speed, depth }) => {
                        let wave = (t * speed + phase).sin() * 0.5 + 0.5;
                        (
                            light.intensity * (1.0 - depth + depth * wave).max(0.0),
                            light.position,
                        )
                    }
                    Some(LightAnimation::Flicker { depth, .. }) => {
                        // Fresh randomness every tick.
                        let jitter = 1.0 - depth * rng.gen::<f32>();
                        (light.intensity * jitter.max(0.0), light.position)
                    }
                    Some(LightAnimation::Sway { speed, radius }) => {
                        let dx = (t * speed + phase).sin() * radius;
                        (
                            light.intensity,
                            (light.position.0 + dx, light.position.1),
                        )
                    }
                    Some(LightAnimation::Rotate { speed, radius }) => {
                        let a = t * speed + phase;
                        (
                            light.intensity,
                            (
                                light.position.0 + a.cos() * radius,
                                light.position.1 + a.sin() * radius,
                            ),
                        )
                    }
                }
            };
            entry.intensity = intensity;
            entry.position = position;
        }

        self.refresh_filter();
    }

    /// Recompute the filter only when animated intensity moved enough to
    /// matter.
    fn refresh_filter(&mut self) {
        if self.scene.lights.is_empty() {
            return;
        }
        let base: f32 = self.scene.lights.iter().map(|l| l.intensity).sum::<f32>();
        if base <= f32::EPSILON {
            return;
        }
        let current: f32 = self.animated.iter().map(|a| a.intensity).sum::<f32>();
        let factor = current / base;
        if (factor - self.filter_intensity).abs() < 0.05 {
            return;
        }
        self.filter_intensity = factor;
        self.filter = LightingScene::compose_filter(
            (self.scene.exposure * factor).clamp(0.2, 2.0),
            self.scene.contrast,
            self.scene.saturation,
        );
        tracing::trace!("lighting filter refreshed (factor {:.2})", factor);
    }
}

impl FrameTask for SceneAnimator {
    fn tick(&mut self, now: Instant) {
        self.update(now);
    }

    fn reset(&mut self) {
        let scene = crate::lighting::build_scene(
            anima_core::Emotion::Neutral,
            crate::lighting::TimeOfDay::Day,
            crate::lighting::Weather::Clear,
        );
        self.set_scene(scene);
    }
}
