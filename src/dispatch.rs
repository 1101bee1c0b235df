//! Intent dispatcher
//!
//! Executes a matched grammar intent against the host-registered
//! callbacks and the read-only data collaborators, and packages the
//! outcome as a `CommandResult` for display. The dispatcher never
//! starts or stops recognition sessions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grammar::{
    subject_after_preposition, CommandIntent, CommandPattern, EventKind, NavTarget, QueryIntent,
    UiAction,
};
use crate::providers::TeamDataProvider;

/// What kind of outcome a command produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Navigation,
    Action,
    Data,
    Ai,
    Info,
    Error,
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultKind::Navigation => write!(f, "navigation"),
            ResultKind::Action => write!(f, "action"),
            ResultKind::Data => write!(f, "data"),
            ResultKind::Ai => write!(f, "ai"),
            ResultKind::Info => write!(f, "info"),
            ResultKind::Error => write!(f, "error"),
        }
    }
}

/// Display-ready outcome of one command cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub kind: ResultKind,
    pub message: String,
    /// Structured payload for hosts that render more than the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn navigation(message: impl Into<String>) -> Self {
        Self { kind: ResultKind::Navigation, message: message.into(), data: None }
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self { kind: ResultKind::Action, message: message.into(), data: None }
    }

    pub fn data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self { kind: ResultKind::Data, message: message.into(), data: Some(data) }
    }

    pub fn ai(message: impl Into<String>) -> Self {
        Self { kind: ResultKind::Ai, message: message.into(), data: None }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: ResultKind::Info, message: message.into(), data: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ResultKind::Error, message: message.into(), data: None }
    }
}

/// Callback taking a view name or route path
pub type NavHook = Box<dyn Fn(&str) + Send + Sync>;
/// Side-effecting callback with no arguments
pub type ActionHook = Box<dyn Fn() + Send + Sync>;

/// Callbacks registered by the hosting UI at engine initialization.
/// These are the only mutation points the dispatcher may call.
#[derive(Default)]
pub struct DashboardHooks {
    pub set_view: Option<NavHook>,
    pub navigate: Option<NavHook>,
    pub open_chat: Option<ActionHook>,
    pub open_calendar: Option<ActionHook>,
    pub open_admin: Option<ActionHook>,
}

impl DashboardHooks {
    pub fn on_set_view(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.set_view = Some(Box::new(hook));
        self
    }

    pub fn on_navigate(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.navigate = Some(Box::new(hook));
        self
    }

    pub fn on_open_chat(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.open_chat = Some(Box::new(hook));
        self
    }

    pub fn on_open_calendar(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.open_calendar = Some(Box::new(hook));
        self
    }

    pub fn on_open_admin(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.open_admin = Some(Box::new(hook));
        self
    }
}

const UNKNOWN_COMMAND: &str = "Unknown command";
const LOOKUP_FAILED: &str = "Sorry, that lookup failed";

/// Maps matched intents to the three external capability sets
pub struct Dispatcher {
    hooks: DashboardHooks,
    data: Arc<dyn TeamDataProvider>,
}

impl Dispatcher {
    pub fn new(hooks: DashboardHooks, data: Arc<dyn TeamDataProvider>) -> Self {
        Self { hooks, data }
    }

    /// Execute a matched pattern. Some query intents re-parse their
    /// parameters out of the raw utterance.
    pub async fn dispatch(&self, pattern: &CommandPattern, utterance: &str) -> CommandResult {
        match pattern.intent {
            CommandIntent::Navigate(target) => self.dispatch_navigation(target),
            CommandIntent::Query(query) => self.dispatch_query(query, utterance).await,
            CommandIntent::Ui(action) => self.dispatch_action(action),
        }
    }

    fn dispatch_navigation(&self, target: NavTarget) -> CommandResult {
        match target {
            NavTarget::View(view) => match &self.hooks.set_view {
                Some(hook) => {
                    hook(view);
                    CommandResult::navigation(format!("Navigating to {view}"))
                }
                None => {
                    warn!(view, "no view setter registered");
                    CommandResult::error(UNKNOWN_COMMAND)
                }
            },
            NavTarget::Route(path) => match &self.hooks.navigate {
                Some(hook) => {
                    hook(path);
                    CommandResult::navigation(format!("Navigating to {path}"))
                }
                None => {
                    warn!(path, "no route setter registered");
                    CommandResult::error(UNKNOWN_COMMAND)
                }
            },
        }
    }

    async fn dispatch_query(&self, query: QueryIntent, utterance: &str) -> CommandResult {
        match query {
            QueryIntent::PlayerStats => self.query_player(utterance).await,
            QueryIntent::NextEvent(kind) => self.query_next_event(kind).await,
            QueryIntent::KitColor => self.query_kit_color().await,
            QueryIntent::RosterCount => self.query_roster_count().await,
        }
    }

    async fn query_player(&self, utterance: &str) -> CommandResult {
        let Some(name) = subject_after_preposition(utterance) else {
            return CommandResult::error("I didn't catch the player's name");
        };

        match self.data.find_player(&name).await {
            Ok(Some(player)) => {
                let message = format!(
                    "{}: #{}, {}, Overall {}",
                    player.name, player.jersey, player.position, player.overall
                );
                let payload = serde_json::to_value(&player).unwrap_or(serde_json::Value::Null);
                CommandResult::data(message, payload)
            }
            Ok(None) => CommandResult::info(format!("No player found matching {name}")),
            Err(e) => {
                warn!(?e, name, "player lookup failed");
                CommandResult::error(LOOKUP_FAILED)
            }
        }
    }

    async fn query_next_event(&self, kind: EventKind) -> CommandResult {
        match self.data.next_event(kind).await {
            Ok(Some(event)) => {
                let when = event.starts_at.format("%A %B %-d at %-I:%M %p");
                let mut message =
                    format!("Next {kind}: {} on {when} at {}", event.title, event.location);
                if event.arrive_early_minutes > 0 {
                    message.push_str(&format!(
                        ". Arrive {} minutes early",
                        event.arrive_early_minutes
                    ));
                }
                let payload = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
                CommandResult::data(message, payload)
            }
            Ok(None) => CommandResult::info(format!("No upcoming {kind} found")),
            Err(e) => {
                warn!(?e, %kind, "event lookup failed");
                CommandResult::error(LOOKUP_FAILED)
            }
        }
    }

    async fn query_kit_color(&self) -> CommandResult {
        match self.data.next_event(EventKind::Game).await {
            Ok(Some(event)) => match event.kit_color {
                Some(color) => {
                    CommandResult::data(
                        format!("Wear the {color} kit for the next game"),
                        serde_json::json!({ "kit_color": color }),
                    )
                }
                None => CommandResult::info("No kit assigned for the next game yet"),
            },
            Ok(None) => CommandResult::info("No upcoming game found"),
            Err(e) => {
                warn!(?e, "kit lookup failed");
                CommandResult::error(LOOKUP_FAILED)
            }
        }
    }

    async fn query_roster_count(&self) -> CommandResult {
        match self.data.roster_count().await {
            Ok(1) => CommandResult::data(
                "There is 1 player on the roster".to_string(),
                serde_json::json!({ "count": 1 }),
            ),
            Ok(count) => CommandResult::data(
                format!("There are {count} players on the roster"),
                serde_json::json!({ "count": count }),
            ),
            Err(e) => {
                warn!(?e, "roster count failed");
                CommandResult::error(LOOKUP_FAILED)
            }
        }
    }

    fn dispatch_action(&self, action: UiAction) -> CommandResult {
        let (hook, ack) = match action {
            UiAction::OpenChat => (&self.hooks.open_chat, "Opening chat"),
            UiAction::OpenCalendar => (&self.hooks.open_calendar, "Opening calendar"),
            UiAction::OpenAdmin => (&self.hooks.open_admin, "Opening admin panel"),
        };

        match hook {
            Some(hook) => {
                hook();
                CommandResult::action(ack)
            }
            None => {
                warn!(?action, "no callback registered");
                CommandResult::error(UNKNOWN_COMMAND)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Local, TimeZone};

    use super::*;
    use crate::error::EngineError;
    use crate::grammar::match_command;
    use crate::providers::{EventRecord, PlayerRecord, RosterEntry, TeamDataProvider};

    /// Canned data provider for dispatcher tests
    struct StubData {
        player: Option<PlayerRecord>,
        next_game: Option<EventRecord>,
        next_practice: Option<EventRecord>,
        fail: bool,
    }

    impl Default for StubData {
        fn default() -> Self {
            Self {
                player: Some(PlayerRecord {
                    name: "Bo Jackson".into(),
                    jersey: 58,
                    position: "RB".into(),
                    overall: 72,
                }),
                next_game: None,
                next_practice: None,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl TeamDataProvider for StubData {
        async fn find_player(&self, name: &str) -> Result<Option<PlayerRecord>, EngineError> {
            if self.fail {
                return Err(EngineError::Data("boom".into()));
            }
            Ok(self.player.clone().filter(|p| {
                p.name.to_lowercase().contains(&name.to_lowercase())
            }))
        }

        async fn next_event(&self, kind: EventKind) -> Result<Option<EventRecord>, EngineError> {
            if self.fail {
                return Err(EngineError::Data("boom".into()));
            }
            Ok(match kind {
                EventKind::Game => self.next_game.clone(),
                EventKind::Practice => self.next_practice.clone(),
            })
        }

        async fn upcoming_events(&self, _limit: usize) -> Result<Vec<EventRecord>, EngineError> {
            Ok(Vec::new())
        }

        async fn roster(&self) -> Result<Vec<RosterEntry>, EngineError> {
            Ok(Vec::new())
        }

        async fn roster_count(&self) -> Result<usize, EngineError> {
            if self.fail {
                return Err(EngineError::Data("boom".into()));
            }
            Ok(18)
        }
    }

    fn game_event(kit: Option<&str>) -> EventRecord {
        EventRecord {
            title: "vs Rovers".into(),
            kind: EventKind::Game,
            starts_at: Local.with_ymd_and_hms(2026, 9, 5, 14, 0, 0).unwrap(),
            location: "Riverside Field".into(),
            kit_color: kit.map(Into::into),
            arrive_early_minutes: 30,
        }
    }

    fn dispatcher_with(data: StubData, hooks: DashboardHooks) -> Dispatcher {
        Dispatcher::new(hooks, Arc::new(data))
    }

    #[tokio::test]
    async fn test_go_to_team_sets_view() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let hooks = DashboardHooks::default()
            .on_set_view(move |v| seen_clone.lock().unwrap().push(v.to_string()));
        let dispatcher = dispatcher_with(StubData::default(), hooks);

        let pattern = match_command("go to team").unwrap();
        let result = dispatcher.dispatch(pattern, "go to team").await;

        assert_eq!(result.kind, ResultKind::Navigation);
        assert_eq!(result.message, "Navigating to team");
        assert_eq!(*seen.lock().unwrap(), vec!["team".to_string()]);
    }

    #[tokio::test]
    async fn test_route_navigation_uses_navigate_hook() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let hooks = DashboardHooks::default()
            .on_navigate(move |p| seen_clone.lock().unwrap().push(p.to_string()));
        let dispatcher = dispatcher_with(StubData::default(), hooks);

        let pattern = match_command("open settings").unwrap();
        let result = dispatcher.dispatch(pattern, "open settings").await;

        assert_eq!(result.kind, ResultKind::Navigation);
        assert_eq!(*seen.lock().unwrap(), vec!["/settings".to_string()]);
    }

    #[tokio::test]
    async fn test_player_stats_message() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("show stats for bo").unwrap();
        let result = dispatcher.dispatch(pattern, "show stats for bo").await;

        assert_eq!(result.kind, ResultKind::Data);
        assert!(result.message.contains("#58"));
        assert!(result.message.contains("Overall 72"));
        assert!(result.data.is_some());
    }

    #[tokio::test]
    async fn test_player_stats_without_name_is_error() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("player stats").unwrap();
        let result = dispatcher.dispatch(pattern, "player stats").await;

        assert_eq!(result.kind, ResultKind::Error);
    }

    #[tokio::test]
    async fn test_player_not_found_is_info() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("stats for zora").unwrap();
        let result = dispatcher.dispatch(pattern, "stats for zora").await;

        assert_eq!(result.kind, ResultKind::Info);
    }

    #[tokio::test]
    async fn test_no_upcoming_practice_is_info() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("when is next practice").unwrap();
        let result = dispatcher.dispatch(pattern, "when is next practice").await;

        assert_eq!(result.kind, ResultKind::Info);
        assert_eq!(result.message, "No upcoming practice found");
    }

    #[tokio::test]
    async fn test_kit_color_from_next_game() {
        let data = StubData {
            next_game: Some(game_event(Some("red"))),
            ..StubData::default()
        };
        let dispatcher = dispatcher_with(data, DashboardHooks::default());

        let pattern = match_command("what kit are we wearing").unwrap();
        let result = dispatcher.dispatch(pattern, "what kit are we wearing").await;

        assert_eq!(result.kind, ResultKind::Data);
        assert!(result.message.contains("red"));
    }

    #[tokio::test]
    async fn test_roster_count_message() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("how many players do we have").unwrap();
        let result = dispatcher
            .dispatch(pattern, "how many players do we have")
            .await;

        assert_eq!(result.kind, ResultKind::Data);
        assert!(result.message.contains("18"));
    }

    #[tokio::test]
    async fn test_action_without_hook_is_unknown_command() {
        let dispatcher = dispatcher_with(StubData::default(), DashboardHooks::default());

        let pattern = match_command("open chat").unwrap();
        let result = dispatcher.dispatch(pattern, "open chat").await;

        assert_eq!(result.kind, ResultKind::Error);
        assert_eq!(result.message, "Unknown command");
    }

    #[tokio::test]
    async fn test_action_acknowledgement() {
        let fired = Arc::new(Mutex::new(false));
        let fired_clone = Arc::clone(&fired);
        let hooks = DashboardHooks::default()
            .on_open_calendar(move || *fired_clone.lock().unwrap() = true);
        let dispatcher = dispatcher_with(StubData::default(), hooks);

        let pattern = match_command("open calendar").unwrap();
        let result = dispatcher.dispatch(pattern, "open calendar").await;

        assert_eq!(result.kind, ResultKind::Action);
        assert!(*fired.lock().unwrap());
    }

    #[tokio::test]
    async fn test_provider_failure_is_generic_error() {
        let data = StubData { fail: true, ..StubData::default() };
        let dispatcher = dispatcher_with(data, DashboardHooks::default());

        let pattern = match_command("how many players do we have").unwrap();
        let result = dispatcher
            .dispatch(pattern, "how many players do we have")
            .await;

        assert_eq!(result.kind, ResultKind::Error);
        assert!(!result.message.contains("boom"));
    }
}
