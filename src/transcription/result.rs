use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel text for windows where the recognizer heard no speech.
pub const NO_SPEECH_TEXT: &str = "[Inaudible]";

/// Sentinel text for recognition service failures.
pub const SERVICE_ERROR_TEXT: &str = "[Error de transcripción]";

/// One transcription record. Created once per artifact; never mutated
/// after it is appended to the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Recognized text, possibly a sentinel
    pub text: String,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
    /// Language code the recognizer was asked for
    pub language: String,
    /// When the result was created
    pub timestamp: DateTime<Utc>,
    /// Attributed speaker label, when identification is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Service error detail for the error sentinel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds since the session started, set when dispatched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_timestamp: Option<f64>,
}

impl TranscriptionResult {
    /// True when the text is real recognized speech rather than a sentinel.
    pub fn has_transcript(&self) -> bool {
        !self.text.is_empty() && self.text != NO_SPEECH_TEXT && self.text != SERVICE_ERROR_TEXT
    }
}
