//! External collaborator seams
//!
//! The engine reads team data and calls the generative-language
//! fallback through these traits; the host supplies implementations at
//! construction. Nothing here is cached across calls.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::grammar::EventKind;

/// The active user, included in the AI fallback prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub role: String,
}

/// One player as returned by the fuzzy name lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub jersey: u32,
    pub position: String,
    pub overall: u32,
}

/// One schedule entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub kind: EventKind,
    pub starts_at: DateTime<Local>,
    pub location: String,
    /// Kit color for games, when assigned
    pub kit_color: Option<String>,
    /// Minutes before start the team should arrive
    pub arrive_early_minutes: u32,
}

/// Roster summary line for the AI fallback prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub jersey: u32,
    pub name: String,
}

/// Generation knobs passed with each fallback request
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Request/response text generation, treated as a black box. One failed
/// call surfaces one error result; no retries.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        opts: GenerationOptions,
    ) -> Result<String, EngineError>;
}

/// Read-only lookups against the team datastore
#[async_trait]
pub trait TeamDataProvider: Send + Sync {
    /// Fuzzy player-by-name search; `None` when nobody matches.
    async fn find_player(&self, name: &str) -> Result<Option<PlayerRecord>, EngineError>;

    /// Next upcoming event of the given kind, if any.
    async fn next_event(&self, kind: EventKind) -> Result<Option<EventRecord>, EngineError>;

    /// Upcoming events across kinds, soonest first, at most `limit`.
    async fn upcoming_events(&self, limit: usize) -> Result<Vec<EventRecord>, EngineError>;

    /// Jersey number + name for every rostered player.
    async fn roster(&self) -> Result<Vec<RosterEntry>, EngineError>;

    /// How many players are rostered.
    async fn roster_count(&self) -> Result<usize, EngineError>;
}
