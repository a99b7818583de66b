//! Mass-spring-damper chain simulation for hair, accessories and cloth.
//!
//! Each chain is a 1-D kinematic chain whose first point is pinned to an
//! external driver (the head). Non-fixed points accumulate gravity,
//! bidirectional spring+damper forces toward both neighbors, turbulent
//! wind, and an inertial reaction to driver motion, then integrate with
//! semi-implicit Euler inside a fixed-timestep accumulator. Constraint
//! relaxation afterwards clamps stretch and bend.
//!
//! Real frame deltas are capped before entering the accumulator: a debugger
//! pause or tab-suspend resume must read as one bounded step, not a force
//! impulse that sends hair into orbit. Every exposed value stays finite.

use crate::vec2::Vec2;
use anima_core::{config::PhysicsConfig, FrameTask, ParamMap};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Per-chain spring material parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    /// Damping on relative velocity along the spring axis.
    pub damping: f32,
    /// Air drag applied to point velocity (per second).
    pub drag: f32,
    pub rest_length: f32,
    pub point_mass: f32,
    pub gravity_scale: f32,
    /// Allowed stretch as a fraction of rest length (±).
    pub max_stretch: f32,
    /// Maximum bend across three consecutive points, degrees.
    pub max_angle_deg: f32,
    pub wind_response: f32,
    /// Reaction to driver velocity; near-anchor points react more.
    pub inertia_response: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 60.0,
            damping: 4.0,
            drag: 1.2,
            rest_length: 12.0,
            point_mass: 1.0,
            gravity_scale: 1.0,
            max_stretch: 0.15,
            max_angle_deg: 40.0,
            wind_response: 1.0,
            inertia_response: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainPoint {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub fixed: bool,
}

/// One simulated strand. Point 0 is the anchor and tracks the driver.
#[derive(Debug, Clone)]
pub struct PhysicsChain {
    pub id: String,
    pub points: Vec<ChainPoint>,
    /// Rest-pose offsets relative to the anchor; index 0 is the anchor's
    /// own offset from the driver position.
    rest_offsets: Vec<Vec2>,
    pub config: SpringConfig,
}

impl PhysicsChain {
    /// A chain with arbitrary rest-pose offsets (first entry is the anchor).
    pub fn from_offsets(id: impl Into<String>, offsets: Vec<Vec2>, config: SpringConfig) -> Self {
        let points = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| ChainPoint {
                position: *offset,
                velocity: Vec2::ZERO,
                mass: config.point_mass.max(0.01),
                fixed: i == 0,
            })
            .collect();
        Self {
            id: id.into(),
            points,
            rest_offsets: offsets,
            config,
        }
    }

    /// A straight strand hanging down from the anchor.
    pub fn strand(id: impl Into<String>, segments: usize, config: SpringConfig) -> Self {
        let offsets = (0..=segments)
            .map(|i| Vec2::new(0.0, i as f32 * config.rest_length))
            .collect();
        Self::from_offsets(id, offsets, config)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rest length of the segment ending at point `i`.
    fn segment_rest(&self, i: usize) -> f32 {
        let r = (self.rest_offsets[i] - self.rest_offsets[i - 1]).length();
        if r > 1e-3 {
            r
        } else {
            self.config.rest_length.max(1e-3)
        }
    }
}

/// Sampled output for one point: displacement and segment rotation
/// relative to the rest pose. The renderer binding maps these onto model
/// parameters; the simulator never touches model parameters directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOutput {
    pub offset: Vec2,
    /// Radians of segment rotation away from rest orientation.
    pub rotation: f32,
}

#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub id: String,
    pub points: Vec<PointOutput>,
}

/// Global wind state with a time-varying turbulence term.
#[derive(Debug, Clone, Copy)]
pub struct Wind {
    pub direction: Vec2,
    pub strength: f32,
    pub turbulence: f32,
}

impl Default for Wind {
    fn default() -> Self {
        Self {
            direction: Vec2::new(1.0, 0.0),
            strength: 0.0,
            turbulence: 0.3,
        }
    }
}

pub struct PhysicsWorld {
    config: PhysicsConfig,
    chains: Vec<PhysicsChain>,
    wind: Wind,
    gravity: Vec2,

    driver_position: Vec2,
    driver_velocity: Vec2,
    last_driver_update: Option<Instant>,

    /// Current speech loudness in [0, 1]; adds a high-frequency vibration
    /// near the anchor while the avatar talks.
    speech_level: f32,

    last_tick: Option<Instant>,
    accumulator: f32,
    /// Simulated elapsed seconds, used as the wind phase clock.
    elapsed: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        let gravity = Vec2::new(config.gravity_x, config.gravity_y);
        Self {
            config,
            chains: Vec::new(),
            wind: Wind::default(),
            gravity,
            driver_position: Vec2::ZERO,
            driver_velocity: Vec2::ZERO,
            last_driver_update: None,
            speech_level: 0.0,
            last_tick: None,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Add a chain; an existing chain with the same id is replaced.
    pub fn add_chain(&mut self, chain: PhysicsChain) {
        if let Some(existing) = self.chains.iter_mut().find(|c| c.id == chain.id) {
            tracing::debug!("replacing physics chain '{}'", chain.id);
            *existing = chain;
        } else {
            self.chains.push(chain);
        }
    }

    pub fn remove_chain(&mut self, id: &str) -> bool {
        let before = self.chains.len();
        self.chains.retain(|c| c.id != id);
        self.chains.len() != before
    }

    pub fn chain(&self, id: &str) -> Option<&PhysicsChain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn set_wind(&mut self, direction: Vec2, strength: f32, turbulence: f32) {
        self.wind = Wind {
            direction: direction.normalized(),
            strength: strength.max(0.0),
            turbulence: turbulence.clamp(0.0, 1.0),
        };
    }

    /// Update the external driver (head) position; driver velocity is
    /// derived from successive calls and feeds the inertia force.
    pub fn set_driver_position(&mut self, position: Vec2, now: Instant) {
        if !position.is_finite() {
            tracing::warn!("non-finite driver position ignored");
            return;
        }
        if let Some(last) = self.last_driver_update {
            let dt = now.saturating_duration_since(last).as_secs_f32().max(1e-3);
            let raw = (position - self.driver_position) * (1.0 / dt);
            // Smooth so one jittery sample doesn't whip the chains.
            self.driver_velocity = self.driver_velocity * 0.5 + raw * 0.5;
        }
        self.driver_position = position;
        self.last_driver_update = Some(now);
    }

    pub fn driver_velocity(&self) -> Vec2 {
        self.driver_velocity
    }

    /// Set the current speech loudness (mouth movement vibrates the head).
    pub fn set_speech_level(&mut self, level: f32) {
        self.speech_level = anima_core::sanitize_f32(level, 0.0).clamp(0.0, 1.0);
    }

    /// Advance simulation to `now`, consuming whole fixed steps.
    pub fn update(&mut self, now: Instant) {
        let time_step = (self.config.time_step_ms / 1000.0).max(1e-4);
        let max_delta = (self.config.max_frame_delta_ms / 1000.0).max(time_step);

        let dt = match self.last_tick {
            Some(last) => now
                .saturating_duration_since(last)
                .as_secs_f32()
                .min(max_delta),
            None => time_step,
        };
        self.last_tick = Some(now);
        self.accumulator += dt;

        while self.accumulator >= time_step {
            self.step(time_step);
            self.accumulator -= time_step;
        }

        // Driver velocity bleeds off between position updates.
        self.driver_velocity = self.driver_velocity * (1.0 - (2.0 * dt).min(0.9));
    }

    /// One fixed integration step.
    fn step(&mut self, h: f32) {
        self.elapsed += h;
        let elapsed = self.elapsed;
        let gravity = self.gravity;
        let wind = self.wind;
        let driver_position = self.driver_position;
        let driver_velocity = self.driver_velocity;
        let speech_level = self.speech_level;

        for chain in &mut self.chains {
            if chain.points.is_empty() {
                continue;
            }

            // Anchor tracks the driver exactly.
            chain.points[0].position = driver_position + chain.rest_offsets[0];
            chain.points[0].velocity = driver_velocity;

            integrate_chain(chain, gravity, wind, driver_velocity, speech_level, elapsed, h);

            for _ in 0..self.config.constraint_iterations.max(1) {
                relax_distance(chain);
                relax_angle(chain);
            }

            sanitize_chain(chain, driver_position);
        }
    }

    /// Per-point rotation/offset relative to rest pose, per chain.
    pub fn outputs(&self) -> Vec<ChainOutput> {
        self.chains
            .iter()
            .map(|chain| {
                let points = chain
                    .points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let rest_world = self.driver_position + chain.rest_offsets[i];
                        let offset = p.position - rest_world;
                        let rotation = if i == 0 {
                            0.0
                        } else {
                            let rest_dir = chain.rest_offsets[i] - chain.rest_offsets[i - 1];
                            let cur_dir = p.position - chain.points[i - 1].position;
                            wrap_angle(cur_dir.angle() - rest_dir.angle())
                        };
                        PointOutput { offset, rotation }
                    })
                    .collect();
                ChainOutput {
                    id: chain.id.clone(),
                    points,
                }
            })
            .collect()
    }

    /// Flatten outputs into the renderer-facing parameter map.
    pub fn to_params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        for output in self.outputs() {
            for (i, p) in output.points.iter().enumerate() {
                params.set(format!("phys_{}_{}_rot", output.id, i), p.rotation);
                params.set(format!("phys_{}_{}_ox", output.id, i), p.offset.x);
                params.set(format!("phys_{}_{}_oy", output.id, i), p.offset.y);
            }
        }
        params
    }

    /// Drop all chains and timing state.
    pub fn clear(&mut self) {
        self.chains.clear();
        self.accumulator = 0.0;
        self.last_tick = None;
        self.last_driver_update = None;
        self.driver_velocity = Vec2::ZERO;
        self.speech_level = 0.0;
    }
}

fn integrate_chain(
    chain: &mut PhysicsChain,
    gravity: Vec2,
    wind: Wind,
    driver_velocity: Vec2,
    speech_level: f32,
    elapsed: f32,
    h: f32,
) {
    let cfg = chain.config.clone();
    let n = chain.points.len();

    for i in 1..n {
        if chain.points[i].fixed {
            continue;
        }
        let p = chain.points[i];
        let mut force = gravity * cfg.gravity_scale * p.mass;

        // Bidirectional springs: predecessor always, successor when present.
        force += spring_force(&chain.points, i, i - 1, chain.segment_rest(i), &cfg);
        if i + 1 < n {
            force += spring_force(&chain.points, i, i + 1, chain.segment_rest(i + 1), &cfg);
        }

        // Wind with per-point phase-shifted turbulence so neighboring
        // points don't move in lockstep.
        if wind.strength > 0.0 {
            let phase = i as f32;
            let turb = 0.5 * (elapsed * 1.3 + phase * 0.7).sin()
                + 0.3 * (elapsed * 2.7 + phase * 1.9).sin()
                + 0.2 * (elapsed * 4.1 + phase * 3.1).sin();
            force += wind.direction
                * (wind.strength * cfg.wind_response * (1.0 + wind.turbulence * turb));
        }

        // Inertial reaction to driver motion, strongest near the anchor.
        force += -driver_velocity * (cfg.inertia_response * p.mass / i as f32);

        // Speech vibration: a fast small shake that also fades down-chain.
        if speech_level > 0.0 {
            let shake = (elapsed * 55.0 + i as f32).sin() * speech_level * 30.0 / i as f32;
            force += Vec2::new(shake, shake * 0.4);
        }

        // Semi-implicit Euler: velocity first, then position.
        let point = &mut chain.points[i];
        point.velocity += force * (h / p.mass.max(0.01));
        point.velocity = point.velocity * (1.0 - (cfg.drag * h).min(0.9));
        let velocity = point.velocity;
        point.position += velocity * h;
    }
}

fn spring_force(
    points: &[ChainPoint],
    i: usize,
    j: usize,
    rest: f32,
    cfg: &SpringConfig,
) -> Vec2 {
    let delta = points[j].position - points[i].position;
    let dist = delta.length();
    if dist < 1e-6 {
        return Vec2::ZERO;
    }
    let dir = delta * (1.0 / dist);
    let stretch = dist - rest;
    let spring = dir * (cfg.stiffness * stretch);
    let rel_vel = points[j].velocity - points[i].velocity;
    let damping = dir * (rel_vel.dot(dir) * cfg.damping);
    spring + damping
}

/// Clamp each segment's length to rest × (1 ± max_stretch).
fn relax_distance(chain: &mut PhysicsChain) {
    let max_stretch = chain.config.max_stretch.clamp(0.0, 1.0);
    for i in 1..chain.points.len() {
        let rest = chain.segment_rest(i);
        let min_len = rest * (1.0 - max_stretch);
        let max_len = rest * (1.0 + max_stretch);

        let delta = chain.points[i].position - chain.points[i - 1].position;
        let dist = delta.length();
        if dist < 1e-6 {
            // Degenerate overlap: nudge the point back toward rest.
            let rest_dir = (chain.rest_offsets[i] - chain.rest_offsets[i - 1]).normalized();
            chain.points[i].position = chain.points[i - 1].position + rest_dir * min_len;
            continue;
        }
        let clamped = dist.clamp(min_len, max_len);
        if (clamped - dist).abs() < 1e-6 {
            continue;
        }
        let correction = delta.normalized() * (clamped - dist);
        if chain.points[i - 1].fixed {
            chain.points[i].position += correction;
        } else {
            chain.points[i].position += correction * 0.5;
            let prev_correction = correction * -0.5;
            chain.points[i - 1].position += prev_correction;
        }
    }
}

/// Prevent any three consecutive points from bending past max_angle by
/// rotating the trailing point back into the allowed cone.
fn relax_angle(chain: &mut PhysicsChain) {
    let max_angle = chain.config.max_angle_deg.clamp(1.0, 179.0).to_radians();
    let n = chain.points.len();
    for i in 1..n.saturating_sub(1) {
        let a = chain.points[i].position - chain.points[i - 1].position;
        let b = chain.points[i + 1].position - chain.points[i].position;
        if a.length_squared() < 1e-9 || b.length_squared() < 1e-9 {
            continue;
        }
        let bend = wrap_angle(b.angle() - a.angle());
        if bend.abs() <= max_angle {
            continue;
        }
        let excess = bend - max_angle.copysign(bend);
        let corrected = b.rotated(-excess);
        chain.points[i + 1].position = chain.points[i].position + corrected;
    }
}

/// Any point that went non-finite is reset to rest pose. Stress sequences
/// must never leave NaN in exposed state.
fn sanitize_chain(chain: &mut PhysicsChain, driver_position: Vec2) {
    for i in 0..chain.points.len() {
        let p = &chain.points[i];
        if p.position.is_finite() && p.velocity.is_finite() {
            continue;
        }
        tracing::warn!(
            "chain '{}' point {} went non-finite, resetting to rest",
            chain.id,
            i
        );
        chain.points[i].position = driver_position + chain.rest_offsets[i];
        chain.points[i].velocity = Vec2::ZERO;
    }
}

fn wrap_angle(a: f32) -> f32 {
    let mut a = a % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    } else if a < -std::f32::consts::PI {
        a += std::f32::consts::TAU;
    }
    a
}

impl FrameTask for PhysicsWorld {
    fn tick(&mut self, now: Instant) {
        self.update(now);
    }

    fn reset(&mut self) {
        self.clear();
    }
}
