//! Speech session adapter contract
//!
//! Wraps the host's recognition capability behind a small trait. Two
//! logical sessions exist: a continuous one for wake-word listening and
//! a single-shot one for active command capture. Sessions push
//! `RecognitionEvent`s into the state machine over a channel; the state
//! machine is the only component allowed to start or stop them.

use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::events::RecognitionEvent;

/// Which of the two logical sessions produced a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Wake-word listening; kept alive until explicitly stopped
    Continuous,
    /// Command capture; ends after the first final transcript
    SingleShot,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Continuous => write!(f, "continuous"),
            SessionKind::SingleShot => write!(f, "single-shot"),
        }
    }
}

/// A recognition event tagged with its originating session
#[derive(Debug, Clone)]
pub struct RecognitionSignal {
    pub kind: SessionKind,
    pub event: RecognitionEvent,
}

/// One recognition session on the host
///
/// Restart policy is NOT the session's job: when a continuous session
/// ends while wake listening should still be active, the state machine
/// starts it again. Implementations only bridge host events onto the
/// channel handed over at construction.
pub trait SpeechSession: Send {
    /// Begin recognizing. Fails if already started or if the host
    /// refuses the session.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Stop gracefully; the host may still deliver a pending final
    /// transcript before emitting `End`.
    fn stop(&mut self);

    /// Stop immediately, discarding any pending transcript.
    fn abort(&mut self);

    /// Whether the session is currently started.
    fn is_started(&self) -> bool;
}

/// Factory for the host's speech capability
///
/// Probed once at engine construction; an unavailable capability
/// disables the whole engine without panicking.
pub trait SpeechCapability: Send {
    /// Whether the host supports speech recognition at all.
    fn is_available(&self) -> bool;

    /// Construct a session of the given kind that emits its events into
    /// `signal_tx`, tagged with `kind`.
    fn create_session(
        &self,
        kind: SessionKind,
        signal_tx: mpsc::Sender<RecognitionSignal>,
    ) -> Result<Box<dyn SpeechSession>, EngineError>;
}
