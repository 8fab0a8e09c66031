use serde::{Deserialize, Serialize};

/// Transcription request sent to the STT service.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    /// Base64-encoded WAV bytes
    pub wav: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub language: String,
    /// RFC3339 timestamp
    pub timestamp: String,
}

/// Reply from the STT service.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeReply {
    pub status: RecognitionStatus,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStatus {
    Ok,
    NoSpeech,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub instruction: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnhanceReply {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StyleRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StyleReply {
    pub style: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryReply {
    pub summary: String,
}
