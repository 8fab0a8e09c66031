use super::messages::{
    EnhanceReply, EnhanceRequest, RecognitionStatus, StyleReply, StyleRequest, SummaryReply,
    SummaryRequest, TranscribeReply, TranscribeRequest,
};
use crate::audio::AudioArtifact;
use crate::transcription::{
    RecognitionOutcome, SpeechRecognizer, SpeechStyle, StyleClassifier, Summarizer, TextEnhancer,
};
use anyhow::{anyhow, Context, Result};
use async_nats::Client;
use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// Subjects served by the STT/LLM workers.
const SUBJECT_TRANSCRIBE: &str = "stt.transcribe";
const SUBJECT_ENHANCE: &str = "llm.enhance";
const SUBJECT_STYLE: &str = "llm.style";
const SUBJECT_SUMMARIZE: &str = "llm.summarize";

/// NATS-backed implementation of all four external capabilities.
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    async fn request<Req, Reply>(&self, subject: &'static str, request: &Req) -> Result<Reply>
    where
        Req: Serialize + Sync,
        Reply: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;
        let response = self
            .client
            .request(subject, payload.into())
            .await
            .with_context(|| format!("Request to {} failed", subject))?;
        serde_json::from_slice(&response.payload)
            .with_context(|| format!("Malformed reply from {}", subject))
    }
}

#[async_trait]
impl SpeechRecognizer for NatsClient {
    async fn transcribe(
        &self,
        artifact: &AudioArtifact,
        language: &str,
    ) -> Result<RecognitionOutcome> {
        let request = TranscribeRequest {
            wav: base64::engine::general_purpose::STANDARD.encode(artifact.wav_bytes()),
            sample_rate: artifact.sample_rate,
            channels: artifact.channels,
            language: language.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let reply: TranscribeReply = self.request(SUBJECT_TRANSCRIBE, &request).await?;
        match reply.status {
            RecognitionStatus::Ok => Ok(RecognitionOutcome::Transcript(reply.text)),
            RecognitionStatus::NoSpeech => Ok(RecognitionOutcome::NoSpeech),
            RecognitionStatus::Error => Err(anyhow!(
                "recognition service error: {}",
                reply.error.unwrap_or_else(|| "unspecified".to_string())
            )),
        }
    }
}

#[async_trait]
impl TextEnhancer for NatsClient {
    async fn enhance(&self, instruction: &str, text: &str) -> Result<String> {
        let request = EnhanceRequest {
            instruction: instruction.to_string(),
            text: text.to_string(),
        };
        let reply: EnhanceReply = self.request(SUBJECT_ENHANCE, &request).await?;
        Ok(reply.text)
    }
}

#[async_trait]
impl StyleClassifier for NatsClient {
    async fn classify_style(&self, text: &str) -> Result<SpeechStyle> {
        let request = StyleRequest {
            text: text.to_string(),
        };
        let reply: StyleReply = self.request(SUBJECT_STYLE, &request).await?;
        SpeechStyle::parse(&reply.style)
            .ok_or_else(|| anyhow!("unknown style label: {}", reply.style))
    }
}

#[async_trait]
impl Summarizer for NatsClient {
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let request = SummaryRequest {
            transcript: transcript.to_string(),
        };
        let reply: SummaryReply = self.request(SUBJECT_SUMMARIZE, &request).await?;
        Ok(reply.summary)
    }
}
