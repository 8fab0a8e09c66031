pub mod audio;
pub mod config;
pub mod nats;
pub mod session;
pub mod transcription;

pub use audio::{
    AudioArtifact, AudioChunk, AudioFeatures, DeviceError, DeviceInfo, FeatureExtractor,
    LevelMeter, MicSource, WindowBuffer,
};
pub use config::Config;
pub use nats::NatsClient;
pub use session::{CaptureSession, SessionConfig, SessionStats};
pub use transcription::{
    RecognitionOutcome, SpeakerClassifier, SpeechRecognizer, SpeechStyle, StyleClassifier,
    Summarizer, TextEnhancer, TranscriptionEngine, TranscriptionResult,
};
