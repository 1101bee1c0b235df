//! Public engine surface
//!
//! `VoiceEngine` is the handle the hosting UI holds: command entry
//! points plus watch channels for state, live transcript, the latest
//! result, and the latest error. The state machine itself runs as a
//! background task in `machine`.

mod machine;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::EngineConfig;
use crate::dispatch::{CommandResult, DashboardHooks, Dispatcher};
use crate::events::EngineEvent;
use crate::providers::{GenerativeModel, TeamDataProvider, UserProfile};
use crate::resolver::IntentResolver;
use crate::session::{SessionKind, SpeechCapability};

use machine::SessionMachine;

/// The five engine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Voice is off; nothing is listening
    Idle,
    /// Continuous session armed, waiting for a wake word
    WakeListening,
    /// Single-shot session armed with a capture deadline
    ActiveListening,
    /// An utterance is with the intent resolver
    Processing,
    /// A result was published; re-arm after the grace delay
    ResultReady,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::WakeListening => write!(f, "WakeListening"),
            SessionState::ActiveListening => write!(f, "ActiveListening"),
            SessionState::Processing => write!(f, "Processing"),
            SessionState::ResultReady => write!(f, "ResultReady"),
        }
    }
}

/// Commands from the public surface into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineCommand {
    EnableWake,
    DisableWake,
    StartListening,
    StopListening,
}

/// Handle to a running (or permanently disabled) voice engine
pub struct VoiceEngine {
    command_tx: Option<mpsc::Sender<EngineCommand>>,
    state_rx: watch::Receiver<SessionState>,
    transcript_rx: watch::Receiver<String>,
    result_rx: watch::Receiver<Option<CommandResult>>,
    error_rx: watch::Receiver<Option<String>>,
    event_tx: broadcast::Sender<EngineEvent>,
    task: Option<JoinHandle<()>>,
}

impl VoiceEngine {
    /// Wire the engine and spawn its state machine task.
    ///
    /// If the host reports no speech capability, the returned handle is
    /// permanently disabled: every command is a no-op and
    /// `is_available()` returns false. Nothing panics.
    pub fn spawn(
        config: EngineConfig,
        capability: Box<dyn SpeechCapability>,
        model: Arc<dyn GenerativeModel>,
        data: Arc<dyn TeamDataProvider>,
        user: UserProfile,
        hooks: DashboardHooks,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (transcript_tx, transcript_rx) = watch::channel(String::new());
        let (result_tx, result_rx) = watch::channel(None);
        let (error_tx, error_rx) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(64);

        if !capability.is_available() {
            warn!("speech capability unavailable, voice engine disabled");
            return Self {
                command_tx: None,
                state_rx,
                transcript_rx,
                result_rx,
                error_rx,
                event_tx,
                task: None,
            };
        }

        let (signal_tx, signal_rx) = mpsc::channel(32);
        let (command_tx, command_rx) = mpsc::channel(16);

        let continuous = capability.create_session(SessionKind::Continuous, signal_tx.clone());
        let single_shot = capability.create_session(SessionKind::SingleShot, signal_tx);
        let (continuous, single_shot) = match (continuous, single_shot) {
            (Ok(c), Ok(s)) => (c, s),
            (c, s) => {
                let e = c.err().or_else(|| s.err());
                warn!(?e, "failed to create recognition sessions, voice engine disabled");
                return Self {
                    command_tx: None,
                    state_rx,
                    transcript_rx,
                    result_rx,
                    error_rx,
                    event_tx,
                    task: None,
                };
            }
        };

        let dispatcher = Dispatcher::new(hooks, Arc::clone(&data));
        let resolver = Arc::new(IntentResolver::new(&config, dispatcher, model, data, user));

        let machine = SessionMachine::new(
            config,
            continuous,
            single_shot,
            resolver,
            command_rx,
            signal_rx,
            state_tx,
            transcript_tx,
            result_tx,
            error_tx,
            event_tx.clone(),
        );
        let task = tokio::spawn(machine.run());

        Self {
            command_tx: Some(command_tx),
            state_rx,
            transcript_rx,
            result_rx,
            error_rx,
            event_tx,
            task: Some(task),
        }
    }

    /// Whether the host supports voice at all.
    pub fn is_available(&self) -> bool {
        self.command_tx.is_some()
    }

    /// Turn on passive wake-word listening.
    pub async fn enable_wake_word(&self) {
        self.send(EngineCommand::EnableWake).await;
    }

    /// Turn voice off entirely; safe to call from any state.
    pub async fn disable_wake_word(&self) {
        self.send(EngineCommand::DisableWake).await;
    }

    /// Start active command capture immediately, bypassing the wake word.
    pub async fn start_listening(&self) {
        self.send(EngineCommand::StartListening).await;
    }

    /// Cancel active capture; no-op when nothing is being captured.
    pub async fn stop_listening(&self) {
        self.send(EngineCommand::StopListening).await;
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch the session state.
    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Watch the live transcript for display.
    pub fn transcript_watch(&self) -> watch::Receiver<String> {
        self.transcript_rx.clone()
    }

    /// Watch the latest command result.
    pub fn result_watch(&self) -> watch::Receiver<Option<CommandResult>> {
        self.result_rx.clone()
    }

    /// Watch the latest recognition error message.
    pub fn error_watch(&self) -> watch::Receiver<Option<String>> {
        self.error_rx.clone()
    }

    /// Subscribe to engine event notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    async fn send(&self, command: EngineCommand) {
        let Some(tx) = &self.command_tx else {
            return;
        };
        if tx.send(command).await.is_err() {
            warn!(?command, "engine task gone, command dropped");
        }
    }
}

impl Drop for VoiceEngine {
    fn drop(&mut self) {
        // Closing the command channel lets the machine abort its
        // sessions and exit; abort is a fallback for a stuck task.
        self.command_tx = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::error::EngineError;
    use crate::grammar::EventKind;
    use crate::providers::{
        EventRecord, GenerationOptions, PlayerRecord, RosterEntry,
    };
    use crate::session::{RecognitionSignal, SpeechSession};

    struct NoCapability;

    impl SpeechCapability for NoCapability {
        fn is_available(&self) -> bool {
            false
        }

        fn create_session(
            &self,
            _kind: SessionKind,
            _signal_tx: mpsc::Sender<RecognitionSignal>,
        ) -> Result<Box<dyn SpeechSession>, EngineError> {
            Err(EngineError::CapabilityUnavailable)
        }
    }

    struct NoData;

    #[async_trait]
    impl crate::providers::TeamDataProvider for NoData {
        async fn find_player(&self, _n: &str) -> Result<Option<PlayerRecord>, EngineError> {
            Ok(None)
        }
        async fn next_event(&self, _k: EventKind) -> Result<Option<EventRecord>, EngineError> {
            Ok(None)
        }
        async fn upcoming_events(&self, _l: usize) -> Result<Vec<EventRecord>, EngineError> {
            Ok(Vec::new())
        }
        async fn roster(&self) -> Result<Vec<RosterEntry>, EngineError> {
            Ok(Vec::new())
        }
        async fn roster_count(&self) -> Result<usize, EngineError> {
            Ok(0)
        }
    }

    struct NoModel;

    #[async_trait]
    impl GenerativeModel for NoModel {
        async fn generate(
            &self,
            _prompt: &str,
            _opts: GenerationOptions,
        ) -> Result<String, EngineError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_unavailable_capability_disables_engine() {
        // The disabled engine spawns no task, so a bare executor is enough.
        tokio_test::block_on(async {
            let engine = VoiceEngine::spawn(
                EngineConfig::default(),
                Box::new(NoCapability),
                Arc::new(NoModel),
                Arc::new(NoData),
                UserProfile { display_name: "Sam".into(), role: "coach".into() },
                DashboardHooks::default(),
            );

            assert!(!engine.is_available());
            assert_eq!(engine.state(), SessionState::Idle);

            // All entry points are no-ops, none panic.
            engine.enable_wake_word().await;
            engine.start_listening().await;
            engine.stop_listening().await;
            engine.disable_wake_word().await;
            assert_eq!(engine.state(), SessionState::Idle);
        });
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::WakeListening.to_string(), "WakeListening");
        assert_eq!(SessionState::default(), SessionState::Idle);
    }
}
