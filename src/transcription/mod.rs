//! Transcription orchestration
//!
//! This module turns flushed audio artifacts into transcription records:
//! - Capability traits for the external STT/LLM services
//! - The orchestrator (cache, sentinel protocol, per-session result log)
//! - Heuristic speaker attribution

mod capability;
mod engine;
mod result;
mod speaker;

pub use capability::{
    RecognitionOutcome, SpeechRecognizer, SpeechStyle, StyleClassifier, Summarizer, TextEnhancer,
};
pub use engine::{TranscriptionEngine, DEFAULT_RECOGNITION_CONFIDENCE};
pub use result::{TranscriptionResult, NO_SPEECH_TEXT, SERVICE_ERROR_TEXT};
pub use speaker::SpeakerClassifier;
