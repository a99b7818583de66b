//! anima_sense — signal extraction and conversational context.
//!
//! The leaves of the behavior stack: pure text/voice analyzers producing
//! candidate emotions, and the [`ContextEngine`] that blends those candidates
//! with conversational inertia before anything reaches the transition engine.

pub mod context;
pub mod intent;
pub mod sentiment;
pub mod voice;

pub use context::{
    Atmosphere, ContextEngine, ConversationTone, Influence, InfluenceSource, ResolvedContext,
    TopicRule,
};
pub use intent::Intent;
pub use sentiment::{analyze_text, TextSignal};
pub use voice::{VoiceEmotionMapper, VoiceFeatures, VoiceSignal};
