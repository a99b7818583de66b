//! The few loud failures this workspace allows itself.
//!
//! Runtime conditions degrade to defaults (see the lookup-miss and clamping
//! policies in each engine); an `AnimaError` marks a programmer-contract
//! violation that should fail once, loudly, at the call site.

#[derive(Debug, thiserror::Error)]
pub enum AnimaError {
    /// An operation was called before the resource it needs was acquired,
    /// e.g. analyzing voice features before calibration.
    #[error("{0} has not been initialized")]
    NotInitialized(&'static str),
}
