//! sideline-voice: voice command recognition and dispatch engine
//!
//! Turns streamed speech-recognition events into dashboard actions:
//! - Passive wake-word listening and active command capture, mutually
//!   exclusive, coordinated by an explicit five-state machine
//! - A deterministic phrase grammar tried first, with a
//!   generative-language fallback for everything it misses
//! - A dispatcher that executes matched intents against host-registered
//!   callbacks and read-only data collaborators
//!
//! The host supplies the speech capability, the AI collaborator, and
//! the data lookups; the engine owns the sessions, the timeouts, and
//! the state. All outcomes reach the UI as `CommandResult`s through
//! watch channels on the `VoiceEngine` handle.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod grammar;
pub mod providers;
pub mod resolver;
pub mod session;

pub use config::EngineConfig;
pub use dispatch::{CommandResult, DashboardHooks, ResultKind};
pub use engine::{SessionState, VoiceEngine};
pub use error::EngineError;
pub use events::{EngineEvent, RecognitionErrorCode, RecognitionEvent};
pub use grammar::EventKind;
pub use providers::{
    EventRecord, GenerationOptions, GenerativeModel, PlayerRecord, RosterEntry,
    TeamDataProvider, UserProfile,
};
pub use session::{RecognitionSignal, SessionKind, SpeechCapability, SpeechSession};
