//! Two-tier intent resolution
//!
//! Deterministic grammar first, generative-language fallback second.
//! Every path out of `resolve` is a `CommandResult`; collaborator
//! failures are mapped to a generic error result and never reach the
//! UI boundary as raw error text.

mod prompt;

pub use prompt::build_fallback_prompt;

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dispatch::{CommandResult, Dispatcher};
use crate::grammar::match_command;
use crate::providers::{GenerationOptions, GenerativeModel, TeamDataProvider, UserProfile};

const FALLBACK_FAILED: &str = "Sorry, I couldn't process that request";

/// Orchestrates grammar matching, dispatch, and the AI fallback
pub struct IntentResolver {
    dispatcher: Dispatcher,
    model: Arc<dyn GenerativeModel>,
    data: Arc<dyn TeamDataProvider>,
    user: UserProfile,
    prompt_event_limit: usize,
    generation: GenerationOptions,
}

impl IntentResolver {
    pub fn new(
        config: &EngineConfig,
        dispatcher: Dispatcher,
        model: Arc<dyn GenerativeModel>,
        data: Arc<dyn TeamDataProvider>,
        user: UserProfile,
    ) -> Self {
        Self {
            dispatcher,
            model,
            data,
            user,
            prompt_event_limit: config.prompt_event_limit,
            generation: GenerationOptions {
                temperature: config.temperature,
                max_tokens: config.max_response_tokens,
            },
        }
    }

    /// Resolve one utterance to a display-ready result.
    pub async fn resolve(&self, utterance: &str) -> CommandResult {
        let text = utterance.trim().to_lowercase();

        if let Some(pattern) = match_command(&text) {
            debug!(utterance = %text, intent = ?pattern.intent, "grammar match");
            return self.dispatcher.dispatch(pattern, &text).await;
        }

        debug!(utterance = %text, "no grammar match, falling back to AI");
        match self.fallback(&text).await {
            Ok(answer) => CommandResult::ai(answer),
            Err(e) => {
                warn!(?e, "AI fallback failed");
                CommandResult::error(FALLBACK_FAILED)
            }
        }
    }

    async fn fallback(&self, utterance: &str) -> Result<String, crate::error::EngineError> {
        // Context lookups are best-effort; a failed summary query just
        // shrinks the prompt rather than failing the whole fallback.
        let events = self
            .data
            .upcoming_events(self.prompt_event_limit)
            .await
            .unwrap_or_else(|e| {
                warn!(?e, "schedule summary unavailable for prompt");
                Vec::new()
            });
        let roster = self.data.roster().await.unwrap_or_else(|e| {
            warn!(?e, "roster summary unavailable for prompt");
            Vec::new()
        });

        let prompt =
            build_fallback_prompt(utterance, Local::now(), &self.user, &events, &roster);
        self.model.generate(&prompt, self.generation).await
    }
}
