use crate::config::{AudioConfig, Config, ProcessingConfig, TranscriptionConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything one capture session needs, carried by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique meeting identifier (used in artifact filenames)
    pub meeting_id: String,
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
    pub processing: ProcessingConfig,
    /// Directory artifacts are persisted under
    pub output_dir: PathBuf,
}

impl SessionConfig {
    pub fn from_config(meeting_id: String, config: &Config) -> Self {
        Self {
            meeting_id,
            audio: config.audio.clone(),
            transcription: config.transcription.clone(),
            processing: config.processing.clone(),
            output_dir: config.output.dir.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            meeting_id: format!("meeting-{}", uuid::Uuid::new_v4()),
            audio: AudioConfig::default(),
            transcription: TranscriptionConfig::default(),
            processing: ProcessingConfig::default(),
            output_dir: PathBuf::from("output/audio"),
        }
    }
}
