//! anima_scene — dynamic lighting for the avatar stage.
//!
//! Scenes are pure lookups merged from emotion × time-of-day × weather
//! tables; the animator layers procedural per-light motion on top and is
//! the only stateful piece.

pub mod animate;
pub mod lighting;

pub use animate::{AnimatedLight, SceneAnimator};
pub use lighting::{
    build_scene, Color, Light, LightAnimation, LightKind, LightingScene, TimeOfDay, Weather,
};
