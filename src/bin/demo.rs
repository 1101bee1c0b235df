//! Interactive demo for the voice engine
//!
//! Stands in for a real host: each line typed on stdin is delivered as
//! a final transcript to whichever recognition session is armed, the
//! dashboard callbacks print what they would do, and the AI fallback is
//! a canned responder. Try:
//!
//! ```text
//! hey coach
//! go to team
//! hey coach show stats for bo
//! hey coach tell me a joke
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sideline_voice::events::RecognitionEvent;
use sideline_voice::grammar::EventKind;
use sideline_voice::{
    CommandResult, DashboardHooks, EngineConfig, EngineError, EventRecord, GenerationOptions,
    GenerativeModel, PlayerRecord, RecognitionSignal, RosterEntry, SessionKind, SpeechCapability,
    SpeechSession, TeamDataProvider, UserProfile, VoiceEngine,
};

/// Session that only tracks whether it is armed; the stdin reader task
/// routes typed lines to whichever session is started.
struct StdinSession {
    started: Arc<AtomicBool>,
}

impl SpeechSession for StdinSession {
    fn start(&mut self) -> Result<(), EngineError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.started.store(false, Ordering::SeqCst);
    }

    fn abort(&mut self) {
        self.started.store(false, Ordering::SeqCst);
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct StdinCapability {
    continuous: Arc<AtomicBool>,
    single_shot: Arc<AtomicBool>,
    signal_slot: Arc<Mutex<Option<mpsc::Sender<RecognitionSignal>>>>,
}

impl SpeechCapability for StdinCapability {
    fn is_available(&self) -> bool {
        true
    }

    fn create_session(
        &self,
        kind: SessionKind,
        signal_tx: mpsc::Sender<RecognitionSignal>,
    ) -> Result<Box<dyn SpeechSession>, EngineError> {
        *self.signal_slot.lock().unwrap() = Some(signal_tx);
        let started = match kind {
            SessionKind::Continuous => Arc::clone(&self.continuous),
            SessionKind::SingleShot => Arc::clone(&self.single_shot),
        };
        Ok(Box::new(StdinSession { started }))
    }
}

struct CannedModel;

#[async_trait]
impl GenerativeModel for CannedModel {
    async fn generate(
        &self,
        prompt: &str,
        _opts: GenerationOptions,
    ) -> Result<String, EngineError> {
        info!(prompt_chars = prompt.len(), "fallback prompt sent");
        Ok("I can only help with team matters, but here goes: ask me about the schedule!".into())
    }
}

struct DemoData;

#[async_trait]
impl TeamDataProvider for DemoData {
    async fn find_player(&self, name: &str) -> Result<Option<PlayerRecord>, EngineError> {
        let roster = [
            PlayerRecord { name: "Bo Jackson".into(), jersey: 58, position: "RB".into(), overall: 72 },
            PlayerRecord { name: "Dana Reyes".into(), jersey: 7, position: "QB".into(), overall: 81 },
        ];
        let lower = name.to_lowercase();
        Ok(roster.iter().find(|p| p.name.to_lowercase().contains(&lower)).cloned())
    }

    async fn next_event(&self, kind: EventKind) -> Result<Option<EventRecord>, EngineError> {
        Ok(self
            .upcoming_events(10)
            .await?
            .into_iter()
            .find(|e| e.kind == kind))
    }

    async fn upcoming_events(&self, limit: usize) -> Result<Vec<EventRecord>, EngineError> {
        let mut events = vec![
            EventRecord {
                title: "Tuesday drills".into(),
                kind: EventKind::Practice,
                starts_at: Local::now() + ChronoDuration::days(2),
                location: "Riverside Field".into(),
                kit_color: None,
                arrive_early_minutes: 15,
            },
            EventRecord {
                title: "vs Rovers".into(),
                kind: EventKind::Game,
                starts_at: Local::now() + ChronoDuration::days(5),
                location: "Memorial Stadium".into(),
                kit_color: Some("red".into()),
                arrive_early_minutes: 45,
            },
        ];
        events.truncate(limit);
        Ok(events)
    }

    async fn roster(&self) -> Result<Vec<RosterEntry>, EngineError> {
        Ok(vec![
            RosterEntry { jersey: 58, name: "Bo Jackson".into() },
            RosterEntry { jersey: 7, name: "Dana Reyes".into() },
        ])
    }

    async fn roster_count(&self) -> Result<usize, EngineError> {
        Ok(2)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "sideline-voice demo starting");

    let capability = StdinCapability::default();
    let continuous = Arc::clone(&capability.continuous);
    let single_shot = Arc::clone(&capability.single_shot);
    let signal_slot = Arc::clone(&capability.signal_slot);

    let hooks = DashboardHooks::default()
        .on_set_view(|view| println!(">> dashboard view set to '{view}'"))
        .on_navigate(|path| println!(">> route changed to '{path}'"))
        .on_open_chat(|| println!(">> chat opened"))
        .on_open_calendar(|| println!(">> calendar opened"))
        .on_open_admin(|| println!(">> admin panel opened"));

    let engine = VoiceEngine::spawn(
        EngineConfig::default(),
        Box::new(capability),
        Arc::new(CannedModel),
        Arc::new(DemoData),
        UserProfile { display_name: "Sam Okafor".into(), role: "coach".into() },
        hooks,
    );

    engine.enable_wake_word().await;

    // Mirror state and results to the terminal.
    let mut state_rx = engine.state_watch();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            println!("-- state: {}", *state_rx.borrow());
        }
    });
    let mut result_rx = engine.result_watch();
    tokio::spawn(async move {
        while result_rx.changed().await.is_ok() {
            let result: Option<CommandResult> = result_rx.borrow().clone();
            if let Some(result) = result {
                println!("== [{}] {}", result.kind, result.message);
            }
        }
    });

    // Deliver typed lines as final transcripts to the armed session.
    let reader = tokio::spawn(async move {
        let signal_tx = loop {
            if let Some(tx) = signal_slot.lock().unwrap().clone() {
                break tx;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        };
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let kind = if single_shot.load(Ordering::SeqCst) {
                SessionKind::SingleShot
            } else if continuous.load(Ordering::SeqCst) {
                SessionKind::Continuous
            } else {
                warn!("no session armed, input dropped");
                continue;
            };
            let signal = RecognitionSignal {
                kind,
                event: RecognitionEvent::Final { text: line },
            };
            if signal_tx.send(signal).await.is_err() {
                break;
            }
        }
    });

    println!("Say 'hey coach' (type it) to start. Ctrl-C to quit.");
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    engine.disable_wake_word().await;
    reader.abort();
    drop(engine);

    Ok(())
}
