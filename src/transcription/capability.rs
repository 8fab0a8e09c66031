use crate::audio::AudioArtifact;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of a speech-to-text request. Service failures are the `Err`
/// branch of the capability call itself, not a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Transcript(String),
    NoSpeech,
}

/// Coarse text register, used as a speaker-attribution signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStyle {
    Formal,
    Informal,
    Technical,
    Casual,
}

impl SpeechStyle {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "FORMAL" => Some(Self::Formal),
            "INFORMAL" => Some(Self::Informal),
            "TECHNICAL" | "TECNICO" => Some(Self::Technical),
            "CASUAL" => Some(Self::Casual),
            _ => None,
        }
    }
}

/// Speech-to-text capability. Implemented by any backing recognition
/// engine; the orchestrator never depends on a specific provider.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(
        &self,
        artifact: &AudioArtifact,
        language: &str,
    ) -> Result<RecognitionOutcome>;
}

/// Text-correction capability: same meaning back, no new facts.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, instruction: &str, text: &str) -> Result<String>;
}

#[async_trait]
pub trait StyleClassifier: Send + Sync {
    async fn classify_style(&self, text: &str) -> Result<SpeechStyle>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<String>;
}
