//! Static command grammar
//!
//! A fixed table of phrase → intent rules, matched by substring against
//! the lowercase utterance. Categories are tried in a fixed priority
//! order (navigation, query, action); within a category, declaration
//! order wins. Matching is not token-boundary-aware, so a short phrase
//! declared earlier can shadow a longer one declared later.

/// Where a navigation intent lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    /// Switch the current dashboard view by name
    View(&'static str),
    /// Full route change
    Route(&'static str),
}

/// Kinds of schedule entries the engine can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Practice,
    Game,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Practice => write!(f, "practice"),
            EventKind::Game => write!(f, "game"),
        }
    }
}

/// Read-only lookups the dispatcher can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// Fuzzy player lookup; the subject is re-parsed from the utterance
    PlayerStats,
    /// Next upcoming event of a kind
    NextEvent(EventKind),
    /// Kit color for the next game
    KitColor,
    /// How many players are on the roster
    RosterCount,
}

/// Ephemeral UI actions the host can register callbacks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    OpenChat,
    OpenCalendar,
    OpenAdmin,
}

/// Closed set of intents the grammar can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandIntent {
    Navigate(NavTarget),
    Query(QueryIntent),
    Ui(UiAction),
}

/// Grammar category, derived from the intent variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Navigation,
    Query,
    Action,
}

/// One phrase-set → intent rule
#[derive(Debug)]
pub struct CommandPattern {
    /// Lowercase trigger substrings, any of which matches
    pub phrases: &'static [&'static str],
    pub intent: CommandIntent,
}

impl CommandPattern {
    pub fn category(&self) -> Category {
        match self.intent {
            CommandIntent::Navigate(_) => Category::Navigation,
            CommandIntent::Query(_) => Category::Query,
            CommandIntent::Ui(_) => Category::Action,
        }
    }
}

const NAVIGATION_PATTERNS: &[CommandPattern] = &[
    CommandPattern {
        phrases: &["go to dashboard", "show dashboard", "go home"],
        intent: CommandIntent::Navigate(NavTarget::View("dashboard")),
    },
    CommandPattern {
        phrases: &["go to team", "show my team", "show the team"],
        intent: CommandIntent::Navigate(NavTarget::View("team")),
    },
    CommandPattern {
        phrases: &["go to schedule", "show schedule"],
        intent: CommandIntent::Navigate(NavTarget::View("schedule")),
    },
    CommandPattern {
        phrases: &["go to stats", "open stats page"],
        intent: CommandIntent::Navigate(NavTarget::View("stats")),
    },
    CommandPattern {
        phrases: &["go to settings", "open settings"],
        intent: CommandIntent::Navigate(NavTarget::Route("/settings")),
    },
];

const QUERY_PATTERNS: &[CommandPattern] = &[
    CommandPattern {
        phrases: &["stats for", "stats about", "player stats", "how good is"],
        intent: CommandIntent::Query(QueryIntent::PlayerStats),
    },
    CommandPattern {
        phrases: &["next practice", "when is practice"],
        intent: CommandIntent::Query(QueryIntent::NextEvent(EventKind::Practice)),
    },
    CommandPattern {
        phrases: &["next game", "next match", "when is the game"],
        intent: CommandIntent::Query(QueryIntent::NextEvent(EventKind::Game)),
    },
    CommandPattern {
        phrases: &["what kit", "which kit", "kit color", "kit colour"],
        intent: CommandIntent::Query(QueryIntent::KitColor),
    },
    CommandPattern {
        phrases: &["how many players", "roster count", "squad size"],
        intent: CommandIntent::Query(QueryIntent::RosterCount),
    },
];

const ACTION_PATTERNS: &[CommandPattern] = &[
    CommandPattern {
        phrases: &["open chat", "team chat"],
        intent: CommandIntent::Ui(UiAction::OpenChat),
    },
    CommandPattern {
        phrases: &["open calendar", "show calendar"],
        intent: CommandIntent::Ui(UiAction::OpenCalendar),
    },
    CommandPattern {
        phrases: &["open admin", "admin panel", "manage team"],
        intent: CommandIntent::Ui(UiAction::OpenAdmin),
    },
];

/// Match an utterance against the grammar. Expects lowercase trimmed
/// input; first match wins in category-then-declaration order.
pub fn match_command(utterance: &str) -> Option<&'static CommandPattern> {
    [NAVIGATION_PATTERNS, QUERY_PATTERNS, ACTION_PATTERNS]
        .into_iter()
        .flatten()
        .find(|pattern| pattern.phrases.iter().any(|p| utterance.contains(p)))
}

/// Extract the subject following the last preposition token
/// ("for" / "about" / "is"), e.g. "show stats for bo" -> "bo".
pub fn subject_after_preposition(utterance: &str) -> Option<String> {
    let tokens: Vec<&str> = utterance.split_whitespace().collect();
    let last_prep = tokens
        .iter()
        .rposition(|t| matches!(*t, "for" | "about" | "is"))?;
    let subject = tokens[last_prep + 1..].join(" ");
    if subject.is_empty() {
        None
    } else {
        Some(subject)
    }
}

/// Find the first configured wake word in the transcript and return the
/// command text remaining after it. `None` means no wake word was heard;
/// an empty residual means the wake word stood alone.
pub fn strip_wake_word(transcript: &str, wake_words: &[String]) -> Option<String> {
    let lower = transcript.to_lowercase();
    for word in wake_words {
        let word = word.to_lowercase();
        if let Some(pos) = lower.find(word.as_str()) {
            let residual = lower[pos + word.len()..]
                .trim_start_matches([',', '.', '!', '?'])
                .trim()
                .to_string();
            return Some(residual);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_match() {
        let pattern = match_command("go to team").unwrap();
        assert_eq!(
            pattern.intent,
            CommandIntent::Navigate(NavTarget::View("team"))
        );
        assert_eq!(pattern.category(), Category::Navigation);
    }

    #[test]
    fn test_query_match_by_substring() {
        let pattern = match_command("show stats for bo").unwrap();
        assert_eq!(pattern.intent, CommandIntent::Query(QueryIntent::PlayerStats));
    }

    #[test]
    fn test_action_match() {
        let pattern = match_command("please open chat now").unwrap();
        assert_eq!(pattern.intent, CommandIntent::Ui(UiAction::OpenChat));
    }

    #[test]
    fn test_no_match() {
        assert!(match_command("tell me a joke").is_none());
    }

    #[test]
    fn test_category_priority_order() {
        // Contains both a navigation phrase and a query phrase;
        // navigation is tried first.
        let pattern = match_command("go to schedule and tell me the next game").unwrap();
        assert_eq!(pattern.category(), Category::Navigation);
    }

    #[test]
    fn test_declaration_order_within_category() {
        // Matches both the practice and game patterns; the practice
        // pattern is declared first in the query table.
        let pattern = match_command("when is practice or the next game").unwrap();
        assert_eq!(
            pattern.intent,
            CommandIntent::Query(QueryIntent::NextEvent(EventKind::Practice))
        );
    }

    #[test]
    fn test_match_is_deterministic() {
        let first = match_command("next game").unwrap() as *const CommandPattern;
        for _ in 0..10 {
            let again = match_command("next game").unwrap() as *const CommandPattern;
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_subject_extraction() {
        assert_eq!(
            subject_after_preposition("show stats for bo"),
            Some("bo".to_string())
        );
        assert_eq!(
            subject_after_preposition("tell me about marcus jones"),
            Some("marcus jones".to_string())
        );
        assert_eq!(subject_after_preposition("show stats for"), None);
        assert_eq!(subject_after_preposition("show stats"), None);
    }

    #[test]
    fn test_subject_uses_last_preposition() {
        assert_eq!(
            subject_after_preposition("what is the overall for dana"),
            Some("dana".to_string())
        );
    }

    #[test]
    fn test_strip_wake_word_bare() {
        let words = vec!["hey coach".to_string()];
        assert_eq!(strip_wake_word("Hey Coach", &words), Some(String::new()));
        assert_eq!(strip_wake_word("hey coach!", &words), Some(String::new()));
    }

    #[test]
    fn test_strip_wake_word_with_residual() {
        let words = vec!["hey coach".to_string()];
        assert_eq!(
            strip_wake_word("Hey Coach, go to team", &words),
            Some("go to team".to_string())
        );
    }

    #[test]
    fn test_strip_wake_word_mixed_case_config() {
        // Hosts may configure wake words in any casing.
        let words = vec!["Hey Coach".to_string()];
        assert_eq!(
            strip_wake_word("hey coach go to team", &words),
            Some("go to team".to_string())
        );
    }

    #[test]
    fn test_strip_wake_word_absent() {
        let words = vec!["hey coach".to_string()];
        assert_eq!(strip_wake_word("go to team", &words), None);
    }
}
