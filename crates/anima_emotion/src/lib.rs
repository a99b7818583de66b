//! anima_emotion — the emotion/animation coordination core's decision layer.
//!
//! Owns the authoritative displayed-emotion state: the transition engine
//! that moves it, the distance/compatibility graph it moves along, the
//! expression memory that picks concrete display variants, and the final
//! intensity gain stage.

pub mod distance;
pub mod intensity;
pub mod memory;
pub mod transition;

pub use distance::{CompatibilityTable, DistanceTable, DEFAULT_DISTANCE, SAME_EMOTION_DISTANCE};
pub use intensity::{IntensityBreakdown, IntensityModulator};
pub use memory::{ExpressionMemory, ExpressionVariant};
pub use transition::{TransitionEngine, TransitionEvent};

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{Emotion, FrameLoop};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_transition_engine_in_frame_loop() {
        let mut frame = FrameLoop::new(TransitionEngine::default(), Duration::from_millis(8));
        frame.start();

        let now = Instant::now();
        frame
            .with_mut(|t| t.set_emotion(Emotion::Happy, 0.8, now))
            .await;
        // The loop's own ticks drive the transition to completion.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let (emotion, transitioning) = frame
            .with(|t| (t.current_state().emotion, t.is_transitioning()))
            .await;
        assert_eq!(emotion, Emotion::Happy);
        assert!(!transitioning);

        frame.destroy().await;
        assert_eq!(
            frame.with(|t| t.current_state().emotion).await,
            Emotion::Neutral
        );
    }
}
