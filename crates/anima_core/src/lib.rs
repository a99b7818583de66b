//! anima_core — shared vocabulary and plumbing for the Anima avatar
//! behavior stack.
//!
//! Everything the animating subsystems exchange lives here: the canonical
//! [`Emotion`] set and its circumplex geometry, emotion state snapshots,
//! the flat renderer-facing [`ParamMap`], easing curves, fault-isolated
//! observers, per-subsystem frame loops, and deep-merging configuration.

pub mod affect;
pub mod config;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod math;
pub mod observers;
pub mod params;
pub mod state;

pub use affect::Affect;
pub use config::AnimaConfig;
pub use emotion::Emotion;
pub use error::AnimaError;
pub use frame::{FrameLoop, FrameTask};
pub use math::{approach, clamp01, lerp, sanitize_f32, Easing};
pub use observers::{ObserverId, ObserverSet};
pub use params::ParamMap;
pub use state::{BlendedEmotion, EmotionState};
