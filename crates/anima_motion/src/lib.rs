//! anima_motion — continuous secondary motion for the avatar.
//!
//! Three independently-clocked simulators: spring-chain physics for hair
//! and accessories, stochastic micro-expressions, and eye behavior. Each
//! implements [`FrameTask`](anima_core::FrameTask) and is driven by its own
//! [`FrameLoop`](anima_core::FrameLoop); their parameter maps are merged by
//! the renderer binding downstream.

pub mod eye;
pub mod micro;
pub mod physics;
pub mod vec2;

pub use eye::EyeTracker;
pub use micro::{MicroChannel, MicroExpressionGenerator, ReactionKind};
pub use physics::{
    ChainOutput, ChainPoint, PhysicsChain, PhysicsWorld, PointOutput, SpringConfig, Wind,
};
pub use vec2::Vec2;

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::FrameLoop;
    use std::time::Duration;

    #[tokio::test]
    async fn test_physics_frame_loop_lifecycle() {
        let mut frame = FrameLoop::new(PhysicsWorld::default(), Duration::from_millis(8));
        frame
            .with_mut(|w| {
                w.add_chain(PhysicsChain::strand("hair", 4, SpringConfig::default()));
            })
            .await;

        frame.start();
        frame.start(); // idempotent
        tokio::time::sleep(Duration::from_millis(80)).await;
        frame.stop();

        let params = frame.with(|w| w.to_params()).await;
        assert!(!params.is_empty());
        for (name, v) in params.iter() {
            assert!(v.is_finite(), "{} not finite", name);
        }

        frame.destroy().await;
        assert_eq!(frame.with(|w| w.chain_count()).await, 0);
        frame.destroy().await; // destroy is repeatable
    }

    #[tokio::test]
    async fn test_micro_and_eye_loops_run_independently() {
        let mut micro = FrameLoop::new(MicroExpressionGenerator::default(), Duration::from_millis(8));
        let mut eye = FrameLoop::new(EyeTracker::default(), Duration::from_millis(8));
        micro.start();
        eye.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        micro.stop();
        eye.stop();

        assert!(!micro.with(|m| m.params()).await.is_empty());
        assert!(!eye.with(|e| e.params()).await.is_empty());
    }
}
