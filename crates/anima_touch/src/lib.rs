//! anima_touch — touch interaction for the avatar.
//!
//! Classifies raw press/move/release input into gestures, routes them
//! through an affection-gated rule table with cooldowns and an
//! excessive-touch breaker, and notifies observers of every outcome.

pub mod engine;
pub mod gesture;
pub mod rules;

pub use engine::{TouchEngine, TouchOutcome};
pub use gesture::{
    GestureThresholds, GestureTracker, TouchArea, TouchEvent, TouchGesture, TouchPoint,
};
pub use rules::{default_rules, InteractionRule, Reaction};

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::FrameLoop;
    use std::time::Duration;

    /// The affection-decay loop runs as an ordinary frame task.
    #[tokio::test]
    async fn test_touch_engine_decay_loop_lifecycle() {
        let mut frame = FrameLoop::new(TouchEngine::default(), Duration::from_millis(8));
        frame.with_mut(|t| t.set_affection(90.0)).await;

        frame.start();
        frame.start(); // idempotent
        tokio::time::sleep(Duration::from_millis(50)).await;
        frame.stop();

        // Milliseconds of wall clock decay next to nothing, but the value
        // must remain clamped and finite.
        let affection = frame.with(|t| t.affection()).await;
        assert!((0.0..=100.0).contains(&affection));

        frame.destroy().await;
        let affection = frame.with(|t| t.affection()).await;
        assert_eq!(affection, 50.0, "destroy resets to the configured default");
    }
}
