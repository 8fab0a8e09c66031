use super::capability::{
    RecognitionOutcome, SpeechRecognizer, StyleClassifier, Summarizer, TextEnhancer,
};
use super::result::{TranscriptionResult, NO_SPEECH_TEXT, SERVICE_ERROR_TEXT};
use super::speaker::SpeakerClassifier;
use crate::audio::{AudioArtifact, FeatureExtractor};
use crate::config::TranscriptionConfig;
use chrono::{Local, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Placeholder confidence for successful recognition. The recognizer
/// contract returns no score, so this value carries no real signal.
pub const DEFAULT_RECOGNITION_CONFIDENCE: f32 = 0.9;

const ENHANCE_INSTRUCTION: &str = "Correct grammar and punctuation while keeping the \
     original meaning. Do not add information that is not in the text.";

const SUMMARY_UNAVAILABLE: &str = "Summary not available (AI enhancement disabled)";
const SUMMARY_NO_CONTENT: &str = "Not enough transcribed content to generate a summary";

/// Turns flushed audio artifacts into transcription records: invokes the
/// recognition capability, optionally enhances the text, attaches speaker
/// and confidence, caches by artifact identity, and accumulates the
/// per-session result log.
pub struct TranscriptionEngine {
    config: TranscriptionConfig,
    recognizer: Arc<dyn SpeechRecognizer>,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    speaker: SpeakerClassifier,
    /// Keyed by artifact identity. Grows for the engine's lifetime: one
    /// entry per flushed window, no eviction.
    cache: Mutex<HashMap<String, TranscriptionResult>>,
    log: Mutex<Vec<TranscriptionResult>>,
}

impl TranscriptionEngine {
    pub fn new(
        config: TranscriptionConfig,
        recognizer: Arc<dyn SpeechRecognizer>,
        enhancer: Option<Arc<dyn TextEnhancer>>,
        style: Option<Arc<dyn StyleClassifier>>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        Self {
            config,
            recognizer,
            enhancer,
            summarizer,
            speaker: SpeakerClassifier::new(style),
            cache: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Turn one artifact into a transcription record. Never fails: every
    /// per-artifact problem is absorbed into a sentinel result.
    pub async fn transcribe(
        &self,
        artifact: &AudioArtifact,
        relative_timestamp: f64,
    ) -> TranscriptionResult {
        let key = artifact.cache_key();

        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                info!("Transcription cache hit: {}", key);
                return cached.clone();
            }
        }

        let (text, confidence, error) = match self
            .recognizer
            .transcribe(artifact, &self.config.language)
            .await
        {
            Ok(RecognitionOutcome::Transcript(raw)) => {
                let text = self.enhance_text(raw).await;
                (text, DEFAULT_RECOGNITION_CONFIDENCE, None)
            }
            Ok(RecognitionOutcome::NoSpeech) => (NO_SPEECH_TEXT.to_string(), 0.0, None),
            Err(e) => {
                warn!("Recognition service failed: {e:#}");
                (SERVICE_ERROR_TEXT.to_string(), 0.0, Some(format!("{e:#}")))
            }
        };

        let speaker = if self.config.enable_speaker_identification {
            let features = FeatureExtractor::extract(artifact);
            Some(self.speaker.classify(&features, Some(text.as_str())).await)
        } else {
            None
        };

        let result = TranscriptionResult {
            text,
            confidence,
            language: self.config.language.clone(),
            timestamp: Utc::now(),
            speaker,
            error,
            relative_timestamp: Some(relative_timestamp),
        };

        {
            let mut cache = self.cache.lock().await;
            cache.insert(key, result.clone());
        }
        {
            let mut log = self.log.lock().await;
            log.push(result.clone());
        }

        info!(
            "Transcribed segment at {:.1}s: {}",
            relative_timestamp, result.text
        );
        result
    }

    async fn enhance_text(&self, raw: String) -> String {
        if !self.config.enable_ai_enhancement {
            return raw;
        }
        let Some(enhancer) = &self.enhancer else {
            return raw;
        };

        match enhancer.enhance(ENHANCE_INSTRUCTION, &raw).await {
            Ok(enhanced) => {
                debug!("Enhanced transcription: {} -> {}", raw, enhanced);
                enhanced.trim().to_string()
            }
            Err(e) => {
                warn!("Text enhancement failed, keeping raw transcription: {e:#}");
                raw
            }
        }
    }

    /// Snapshot of the session log, ordered by relative timestamp.
    /// Dispatch completes out of order, so append order is never treated
    /// as chronological order.
    pub async fn results(&self) -> Vec<TranscriptionResult> {
        let mut results = self.log.lock().await.clone();
        results.sort_by(|a, b| {
            let a = a.relative_timestamp.unwrap_or(0.0);
            let b = b.relative_timestamp.unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    /// Concise meeting summary from the speaker-attributed transcript.
    /// Sentinel and empty entries are skipped; with no summarizer or no
    /// usable content a fixed message is returned instead of calling out.
    pub async fn meeting_summary(&self) -> String {
        let Some(summarizer) = &self.summarizer else {
            return SUMMARY_UNAVAILABLE.to_string();
        };

        let results = self.results().await;
        let transcript: Vec<String> = results
            .iter()
            .filter(|r| r.has_transcript())
            .map(|r| {
                format!(
                    "{}: {}",
                    r.speaker.as_deref().unwrap_or("Unknown"),
                    r.text
                )
            })
            .collect();

        if transcript.is_empty() {
            return SUMMARY_NO_CONTENT.to_string();
        }

        match summarizer.summarize(&transcript.join("\n")).await {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                error!("Failed to generate meeting summary: {e:#}");
                "Failed to generate summary".to_string()
            }
        }
    }

    /// Human-readable session report: per-segment lines with computed
    /// offsets, then aggregate statistics.
    pub fn format_report(&self, results: &[TranscriptionResult]) -> String {
        let mut output = Vec::new();
        let now = Local::now();

        output.push("=== MEETING TRANSCRIPT ===".to_string());
        output.push(format!("Date: {}", now.format("%Y-%m-%d")));
        output.push(format!("Time: {}", now.format("%H:%M:%S")));
        output.push(format!(
            "Duration: ~{} seconds",
            (results.len() as f64 * self.config.window_secs) as u64
        ));

        let speakers: HashSet<&str> = results
            .iter()
            .map(|r| r.speaker.as_deref().unwrap_or("Unknown"))
            .collect();
        output.push(format!("Participants detected: {}", speakers.len()));

        output.push(String::new());
        output.push("=== CONTENT ===".to_string());
        for (index, result) in results.iter().enumerate() {
            if !result.has_transcript() {
                continue;
            }
            let offset = (index as f64 * self.config.window_secs) as u64;
            output.push(format!(
                "[{:02}:{:02}] {}: {}",
                offset / 60,
                offset % 60,
                result.speaker.as_deref().unwrap_or("Unknown"),
                result.text
            ));
        }

        output.push(String::new());
        output.push("=== STATISTICS ===".to_string());
        let transcribed: Vec<&TranscriptionResult> =
            results.iter().filter(|r| r.has_transcript()).collect();
        output.push(format!("Total segments: {}", results.len()));
        output.push(format!("Transcribed segments: {}", transcribed.len()));

        let words: usize = transcribed
            .iter()
            .map(|r| r.text.split_whitespace().count())
            .sum();
        output.push(format!("Total words: {}", words));

        let mean_confidence = if transcribed.is_empty() {
            0.0
        } else {
            transcribed.iter().map(|r| r.confidence as f64).sum::<f64>() / transcribed.len() as f64
        };
        output.push(format!("Mean confidence: {:.1}%", mean_confidence * 100.0));

        output.join("\n")
    }
}
