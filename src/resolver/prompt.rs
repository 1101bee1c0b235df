//! Fallback prompt assembly
//!
//! Builds the bounded natural-language prompt sent to the generative
//! collaborator when the grammar has no match. The context summary is
//! deliberately small: a handful of upcoming events and a roster list.

use chrono::{DateTime, Local};

use crate::providers::{EventRecord, RosterEntry, UserProfile};

const SYSTEM_INSTRUCTION: &str = "You are the voice assistant for a team dashboard. \
Answer only questions about the team's schedule, roster, players, and kit. \
If asked about anything else, say you can only help with team matters. \
Keep answers to one or two short sentences.";

/// Assemble the full prompt for one fallback call.
pub fn build_fallback_prompt(
    utterance: &str,
    today: DateTime<Local>,
    user: &UserProfile,
    events: &[EventRecord],
    roster: &[RosterEntry],
) -> String {
    let mut prompt = String::new();
    prompt.push_str(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\n");

    prompt.push_str(&format!("Today is {}.\n", today.format("%A, %B %-d, %Y")));
    prompt.push_str(&format!("User: {} ({})\n", user.display_name, user.role));

    if events.is_empty() {
        prompt.push_str("\nUpcoming events: none scheduled.\n");
    } else {
        prompt.push_str("\nUpcoming events:\n");
        for event in events {
            prompt.push_str(&format_event_line(event));
        }
    }

    if !roster.is_empty() {
        prompt.push_str("\nRoster:\n");
        for entry in roster {
            prompt.push_str(&format!("- #{} {}\n", entry.jersey, entry.name));
        }
    }

    prompt.push_str(&format!("\nQuestion: {utterance}\n"));
    prompt
}

fn format_event_line(event: &EventRecord) -> String {
    let mut line = format!(
        "- {} ({}) on {} at {}",
        event.title,
        event.kind,
        event.starts_at.format("%a %b %-d %-I:%M %p"),
        event.location,
    );
    if let Some(kit) = &event.kit_color {
        line.push_str(&format!(", {kit} kit"));
    }
    if event.arrive_early_minutes > 0 {
        line.push_str(&format!(", arrive {} min early", event.arrive_early_minutes));
    }
    line.push('\n');
    line
}
