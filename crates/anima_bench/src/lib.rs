//! anima_bench — trajectory simulations over long simulated time spans.
//!
//! Validates emergent behavior under pathological input sequences:
//! - sustained rapid emotion switching
//! - frame drops and clock stalls in the physics accumulator
//! - high-frequency touch storms against the breaker and affection economy
//! - multi-hour idle decay

use anima_emotion::TransitionEngine;
use anima_motion::PhysicsWorld;
use std::time::{Duration, Instant};

/// Drive a transition engine with fixed-interval frames from `start`.
pub fn run_transition_frames(
    engine: &mut TransitionEngine,
    start: Instant,
    frames: usize,
    frame_ms: u64,
) -> Instant {
    let mut now = start;
    for _ in 0..frames {
        now += Duration::from_millis(frame_ms);
        engine.update(now);
    }
    now
}

/// Drive a physics world with fixed-interval frames from `start`.
pub fn run_physics_frames(
    world: &mut PhysicsWorld,
    start: Instant,
    frames: usize,
    frame_ms: u64,
) -> Instant {
    let mut now = start;
    for _ in 0..frames {
        now += Duration::from_millis(frame_ms);
        world.update(now);
    }
    now
}
