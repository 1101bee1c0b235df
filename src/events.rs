//! Event types crossing the engine's boundaries
//!
//! `RecognitionEvent` flows from a speech session into the state
//! machine; `EngineEvent` flows out to subscribed hosts as transitions
//! and results happen.

use serde::{Deserialize, Serialize};

/// Error codes a speech session can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionErrorCode {
    /// Nothing was said. Benign while wake-listening; a timed-out
    /// attempt during active capture.
    NoSpeech,
    /// Microphone or audio pipeline failure
    AudioCapture,
    /// Recognition backend was unreachable
    Network,
    /// Host denied microphone permission
    NotAllowed,
    /// Session was aborted by the engine
    Aborted,
    /// Anything else
    Other,
}

/// Events emitted by a speech session adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// Interim transcript, may be revised by later events
    Partial { text: String },

    /// Final transcript for the utterance
    Final { text: String },

    /// Recognition failed
    Error { code: RecognitionErrorCode },

    /// The session stopped emitting (host-side end of stream)
    End,
}

/// Notifications broadcast by the state machine during a command cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Continuous wake-word listening started
    WakeListeningStarted,

    /// A configured wake word was heard
    WakeWordDetected {
        /// Whether command text followed the wake word in the same utterance
        with_command: bool,
    },

    /// Active command capture started (deadline armed)
    CaptureStarted,

    /// Active capture ended with no transcript before the deadline
    CaptureTimedOut,

    /// Active capture was cancelled by the user
    CaptureCancelled,

    /// An utterance was handed to the intent resolver
    ProcessingStarted { utterance: String },

    /// A command result was published
    ResultPublished { kind: String },

    /// Voice was disabled; all sessions aborted
    Disabled,
}

impl std::fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::WakeListeningStarted => write!(f, "WAKE_LISTENING_STARTED"),
            EngineEvent::WakeWordDetected { with_command } => {
                write!(f, "WAKE_WORD_DETECTED (with_command={})", with_command)
            }
            EngineEvent::CaptureStarted => write!(f, "CAPTURE_STARTED"),
            EngineEvent::CaptureTimedOut => write!(f, "CAPTURE_TIMED_OUT"),
            EngineEvent::CaptureCancelled => write!(f, "CAPTURE_CANCELLED"),
            EngineEvent::ProcessingStarted { utterance } => {
                write!(f, "PROCESSING_STARTED ({})", utterance)
            }
            EngineEvent::ResultPublished { kind } => {
                write!(f, "RESULT_PUBLISHED ({})", kind)
            }
            EngineEvent::Disabled => write!(f, "DISABLED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_event_serialization() {
        let event = RecognitionEvent::Final {
            text: "go to team".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("final"));
        assert!(json.contains("go to team"));
    }

    #[test]
    fn test_recognition_event_deserialization() {
        let json = r#"{"type":"error","code":"no_speech"}"#;
        let event: RecognitionEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            RecognitionEvent::Error {
                code: RecognitionErrorCode::NoSpeech
            }
        ));
    }

    #[test]
    fn test_engine_event_serialization() {
        let event = EngineEvent::WakeWordDetected { with_command: true };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("wake_word_detected"));
        assert!(json.contains("true"));
    }
}
