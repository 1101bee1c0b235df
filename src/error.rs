//! Engine error taxonomy
//!
//! Every path that reaches the UI boundary terminates in a
//! `CommandResult` with `kind = Error`; these variants exist for the
//! collaborator seams and internal propagation, not for raw display.

/// Errors surfaced by the engine and its collaborator traits
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Host has no speech capability; the engine stays disabled for the session
    #[error("speech capability unavailable on this host")]
    CapabilityUnavailable,

    /// A session was asked to start while already started
    #[error("recognition session already started")]
    AlreadyStarted,

    /// Recognition failed inside an adapter
    #[error("recognition error: {0}")]
    Recognition(String),

    /// The generative-language collaborator failed (transport or otherwise)
    #[error("generation request failed: {0}")]
    Generation(String),

    /// A read-only data collaborator failed
    #[error("data lookup failed: {0}")]
    Data(String),

    /// Failed to hand an event to the engine (channel closed)
    #[error("engine channel closed")]
    ChannelClosed,
}
