use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether capture is currently active
    pub is_recording: bool,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total session duration in seconds
    pub duration_secs: f64,

    /// Windows flushed into artifacts so far
    pub windows_flushed: usize,

    /// Transcription results appended to the log so far
    pub results_count: usize,
}
