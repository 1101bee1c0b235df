//! Core session state machine
//!
//! Owns the two recognition sessions, the single mutable state value,
//! the active-capture deadline, and the wake-word restart policy. All
//! transitions happen inside one select loop; no other component may
//! start or stop a session.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dispatch::CommandResult;
use crate::events::{EngineEvent, RecognitionErrorCode, RecognitionEvent};
use crate::grammar::strip_wake_word;
use crate::resolver::IntentResolver;
use crate::session::{RecognitionSignal, SessionKind, SpeechSession};

use super::{EngineCommand, SessionState};

/// The one timer that can be armed at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    /// Active capture must produce a final transcript before this
    CaptureDeadline,
    /// Grace delay before re-arming wake listening after a result
    RearmGrace,
}

pub(crate) struct SessionMachine {
    config: EngineConfig,
    continuous: Box<dyn SpeechSession>,
    single_shot: Box<dyn SpeechSession>,
    resolver: Arc<IntentResolver>,

    command_rx: mpsc::Receiver<EngineCommand>,
    signal_rx: mpsc::Receiver<RecognitionSignal>,
    resolution_tx: mpsc::Sender<CommandResult>,
    resolution_rx: mpsc::Receiver<CommandResult>,

    state: SessionState,
    state_entered_at: Instant,
    wake_enabled: bool,
    partial: String,
    timer: Option<(TimerKind, TokioInstant)>,
    resolve_task: Option<JoinHandle<()>>,

    state_tx: watch::Sender<SessionState>,
    transcript_tx: watch::Sender<String>,
    result_tx: watch::Sender<Option<CommandResult>>,
    error_tx: watch::Sender<Option<String>>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl SessionMachine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: EngineConfig,
        continuous: Box<dyn SpeechSession>,
        single_shot: Box<dyn SpeechSession>,
        resolver: Arc<IntentResolver>,
        command_rx: mpsc::Receiver<EngineCommand>,
        signal_rx: mpsc::Receiver<RecognitionSignal>,
        state_tx: watch::Sender<SessionState>,
        transcript_tx: watch::Sender<String>,
        result_tx: watch::Sender<Option<CommandResult>>,
        error_tx: watch::Sender<Option<String>>,
        event_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        let (resolution_tx, resolution_rx) = mpsc::channel(1);
        Self {
            config,
            continuous,
            single_shot,
            resolver,
            command_rx,
            signal_rx,
            resolution_tx,
            resolution_rx,
            state: SessionState::Idle,
            state_entered_at: Instant::now(),
            wake_enabled: false,
            partial: String::new(),
            timer: None,
            resolve_task: None,
            state_tx,
            transcript_tx,
            result_tx,
            error_tx,
            event_tx,
        }
    }

    /// Drive the machine until the command channel closes.
    pub(crate) async fn run(mut self) {
        info!("session machine started in Idle state");

        loop {
            let timer = self.timer;
            // The sleep future is constructed unconditionally, so give
            // it a harmless deadline when no timer is armed.
            let deadline = timer
                .map(|(_, at)| at)
                .unwrap_or_else(|| TokioInstant::now() + std::time::Duration::from_secs(3600));

            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal);
                }
                Some(result) = self.resolution_rx.recv() => {
                    self.handle_resolution(result);
                }
                _ = tokio::time::sleep_until(deadline), if timer.is_some() => {
                    self.handle_timer();
                }
            }
        }

        self.abort_all();
        info!("session machine stopped");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        debug!(?command, state = %self.state, "command received");
        match command {
            EngineCommand::EnableWake => {
                self.wake_enabled = true;
                if self.state == SessionState::Idle {
                    self.start_wake_listening();
                }
            }
            EngineCommand::DisableWake => {
                self.wake_enabled = false;
                self.abort_all();
                if self.state != SessionState::Idle {
                    self.transition(SessionState::Idle);
                }
                let _ = self.event_tx.send(EngineEvent::Disabled);
            }
            EngineCommand::StartListening => match self.state {
                SessionState::Idle | SessionState::WakeListening => {
                    self.begin_active_capture();
                }
                _ => debug!(state = %self.state, "start_listening ignored"),
            },
            EngineCommand::StopListening => {
                if self.state == SessionState::ActiveListening {
                    self.timer = None;
                    self.single_shot.abort();
                    self.partial.clear();
                    let _ = self.event_tx.send(EngineEvent::CaptureCancelled);
                    self.return_to_listening();
                }
            }
        }
    }

    fn handle_signal(&mut self, signal: RecognitionSignal) {
        match (self.state, signal.kind) {
            (SessionState::WakeListening, SessionKind::Continuous) => {
                self.handle_wake_signal(signal.event);
            }
            (SessionState::ActiveListening, SessionKind::SingleShot) => {
                self.handle_capture_signal(signal.event);
            }
            _ => {
                // Only the armed session for the current state is heard.
                debug!(
                    kind = %signal.kind,
                    state = %self.state,
                    "dropping signal from unarmed session"
                );
            }
        }
    }

    fn handle_wake_signal(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Final { text } => {
                let Some(residual) = strip_wake_word(&text, &self.config.wake_words) else {
                    debug!(%text, "no wake word in transcript");
                    return;
                };
                if residual.is_empty() {
                    let _ = self
                        .event_tx
                        .send(EngineEvent::WakeWordDetected { with_command: false });
                    self.begin_active_capture();
                } else {
                    // The command rode along with the wake word; skip
                    // active capture entirely.
                    let _ = self
                        .event_tx
                        .send(EngineEvent::WakeWordDetected { with_command: true });
                    self.continuous.stop();
                    self.begin_processing(residual);
                }
            }
            RecognitionEvent::Error {
                code: RecognitionErrorCode::NoSpeech,
            } => {
                debug!("no speech while wake listening");
            }
            RecognitionEvent::Error { code } => {
                // Hosts follow a session error with End, which drives
                // the restart; nothing is surfaced to the user here.
                warn!(?code, "error while wake listening");
            }
            RecognitionEvent::End => {
                if self.wake_enabled {
                    self.restart_continuous();
                }
            }
            RecognitionEvent::Partial { .. } => {}
        }
    }

    fn handle_capture_signal(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Partial { text } => {
                self.partial = text.clone();
                let _ = self.transcript_tx.send(text);
            }
            RecognitionEvent::Final { text } => {
                self.timer = None;
                self.begin_processing(text);
            }
            RecognitionEvent::Error {
                code: RecognitionErrorCode::NoSpeech,
            } => {
                self.timer = None;
                self.single_shot.abort();
                self.partial.clear();
                let _ = self.error_tx.send(Some("No speech detected".to_string()));
                let _ = self.event_tx.send(EngineEvent::CaptureTimedOut);
                self.return_to_listening();
            }
            RecognitionEvent::Error { code } => {
                warn!(?code, "recognition error during capture");
                self.timer = None;
                self.single_shot.abort();
                self.partial.clear();
                self.transition(SessionState::Processing);
                self.finish_with_result(CommandResult::error(
                    "Sorry, I couldn't hear that. Please try again",
                ));
            }
            RecognitionEvent::End => {
                // End before any final behaves like the deadline:
                // promote a pending partial, otherwise give up.
                self.timer = None;
                if self.partial.is_empty() {
                    let _ = self.event_tx.send(EngineEvent::CaptureTimedOut);
                    self.return_to_listening();
                } else {
                    let utterance = std::mem::take(&mut self.partial);
                    self.begin_processing(utterance);
                }
            }
        }
    }

    fn handle_timer(&mut self) {
        let Some((kind, _)) = self.timer.take() else {
            return;
        };
        match kind {
            TimerKind::CaptureDeadline => {
                if self.state != SessionState::ActiveListening {
                    return;
                }
                self.single_shot.abort();
                if self.partial.is_empty() {
                    // Deadline with no transcript: never reaches the resolver.
                    let _ = self.event_tx.send(EngineEvent::CaptureTimedOut);
                    self.return_to_listening();
                } else {
                    let utterance = std::mem::take(&mut self.partial);
                    debug!(%utterance, "deadline reached, promoting partial transcript");
                    self.begin_processing(utterance);
                }
            }
            TimerKind::RearmGrace => {
                if self.state == SessionState::ResultReady {
                    self.return_to_listening();
                }
            }
        }
    }

    fn handle_resolution(&mut self, result: CommandResult) {
        self.resolve_task = None;
        if self.state != SessionState::Processing {
            debug!(state = %self.state, "stale resolution dropped");
            return;
        }
        self.finish_with_result(result);
    }

    /// Publish a result and schedule the re-arm grace delay.
    fn finish_with_result(&mut self, result: CommandResult) {
        let _ = self.event_tx.send(EngineEvent::ResultPublished {
            kind: result.kind.to_string(),
        });
        let _ = self.result_tx.send(Some(result));
        self.transition(SessionState::ResultReady);
        self.timer = Some((
            TimerKind::RearmGrace,
            TokioInstant::now() + self.config.rearm_grace,
        ));
    }

    fn start_wake_listening(&mut self) {
        if self.single_shot.is_started() {
            self.single_shot.abort();
        }
        match self.continuous.start() {
            Ok(()) => {
                self.transition(SessionState::WakeListening);
                let _ = self.event_tx.send(EngineEvent::WakeListeningStarted);
            }
            Err(e) => {
                warn!(?e, "failed to start wake listening");
                let _ = self
                    .error_tx
                    .send(Some("Voice recognition failed to start".to_string()));
                if self.state != SessionState::Idle {
                    self.transition(SessionState::Idle);
                }
            }
        }
    }

    fn begin_active_capture(&mut self) {
        if self.continuous.is_started() {
            self.continuous.stop();
        }
        self.partial.clear();
        let _ = self.transcript_tx.send(String::new());
        let _ = self.result_tx.send(None);
        let _ = self.error_tx.send(None);

        match self.single_shot.start() {
            Ok(()) => {
                self.timer = Some((
                    TimerKind::CaptureDeadline,
                    TokioInstant::now() + self.config.capture_timeout,
                ));
                self.transition(SessionState::ActiveListening);
                let _ = self.event_tx.send(EngineEvent::CaptureStarted);
            }
            Err(e) => {
                warn!(?e, "failed to start command capture");
                let _ = self
                    .error_tx
                    .send(Some("Voice recognition failed to start".to_string()));
                self.return_to_listening();
            }
        }
    }

    fn begin_processing(&mut self, utterance: String) {
        if self.single_shot.is_started() {
            self.single_shot.stop();
        }
        if self
            .resolve_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            // Processing is serialized; one resolution at a time.
            warn!(%utterance, "resolution already in flight, utterance dropped");
            return;
        }

        let _ = self.transcript_tx.send(utterance.clone());
        let _ = self.result_tx.send(None);
        self.transition(SessionState::Processing);
        let _ = self.event_tx.send(EngineEvent::ProcessingStarted {
            utterance: utterance.clone(),
        });

        let resolver = Arc::clone(&self.resolver);
        let resolution_tx = self.resolution_tx.clone();
        self.resolve_task = Some(tokio::spawn(async move {
            let result = resolver.resolve(&utterance).await;
            let _ = resolution_tx.send(result).await;
        }));
    }

    fn restart_continuous(&mut self) {
        if self.continuous.is_started() {
            return;
        }
        if let Err(e) = self.continuous.start() {
            warn!(?e, "failed to restart wake listening");
            let _ = self
                .error_tx
                .send(Some("Voice recognition stopped unexpectedly".to_string()));
            self.transition(SessionState::Idle);
        }
    }

    fn return_to_listening(&mut self) {
        self.timer = None;
        if self.wake_enabled {
            self.start_wake_listening();
        } else if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
    }

    fn abort_all(&mut self) {
        self.timer = None;
        self.partial.clear();
        if let Some(task) = self.resolve_task.take() {
            task.abort();
        }
        self.continuous.abort();
        self.single_shot.abort();
    }

    fn transition(&mut self, new_state: SessionState) {
        let old_state = self.state;
        let duration_ms = self.state_entered_at.elapsed().as_millis() as u64;

        info!(
            from = %old_state,
            to = %new_state,
            duration_ms = duration_ms,
            "state transition"
        );

        self.state = new_state;
        self.state_entered_at = Instant::now();
        let _ = self.state_tx.send(new_state);
    }
}
