use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration. Every component receives the section it needs
/// by value; there is no process-global settings object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono)
    pub channels: u16,
    /// Samples per capture chunk
    pub frame_size: usize,
    /// Preferred input device (enumeration index)
    pub device_index: Option<usize>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            frame_size: 1024,
            device_index: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Language code passed to the recognition service
    pub language: String,
    /// Window length: audio accumulated before each transcription dispatch
    pub window_secs: f64,
    pub enable_speaker_identification: bool,
    pub enable_ai_enhancement: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
            window_secs: 5.0,
            enable_speaker_identification: true,
            enable_ai_enhancement: false,
        }
    }
}

/// Silence-detection tuning for speech segment scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Samples quieter than this (dBFS) count as silence
    pub silence_threshold_db: f64,
    /// Minimum silence gap that splits two speech segments
    pub min_silence_ms: u64,
    /// Scan stride in samples
    pub scan_step: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: -40.0,
            min_silence_ms: 1000,
            scan_step: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory audio artifacts are persisted under
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output/audio"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
