//! Engine configuration

use std::time::Duration;

/// Tunables for the voice engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trigger phrases, matched case-insensitively as substrings
    pub wake_words: Vec<String>,

    /// How long active capture waits for a final transcript
    pub capture_timeout: Duration,

    /// Delay before re-arming wake listening after a result, so the
    /// engine does not hear its own action echoes
    pub rearm_grace: Duration,

    /// Maximum upcoming events summarized into the AI fallback prompt
    pub prompt_event_limit: usize,

    /// Sampling temperature for the AI fallback
    pub temperature: f32,

    /// Response length cap for the AI fallback
    pub max_response_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wake_words: vec!["hey coach".into(), "okay coach".into(), "ok coach".into()],
            capture_timeout: Duration::from_secs(8),
            rearm_grace: Duration::from_millis(600),
            prompt_event_limit: 5,
            temperature: 0.4,
            max_response_tokens: 120,
        }
    }
}

impl EngineConfig {
    /// Replace the wake word set
    pub fn with_wake_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wake_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Override the active-capture deadline
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Override the post-result re-arm delay
    pub fn with_rearm_grace(mut self, grace: Duration) -> Self {
        self.rearm_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.capture_timeout, Duration::from_secs(8));
        assert!(config.wake_words.iter().any(|w| w == "hey coach"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = EngineConfig::default()
            .with_wake_words(["hey team"])
            .with_capture_timeout(Duration::from_secs(4));
        assert_eq!(config.wake_words, vec!["hey team".to_string()]);
        assert_eq!(config.capture_timeout, Duration::from_secs(4));
    }
}
