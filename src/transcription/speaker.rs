use super::capability::{SpeechStyle, StyleClassifier};
use super::result::NO_SPEECH_TEXT;
use crate::audio::AudioFeatures;
use std::sync::Arc;
use tracing::debug;

/// Heuristic speaker attribution from acoustic features and, when a style
/// classifier is available, the text register.
pub struct SpeakerClassifier {
    style: Option<Arc<dyn StyleClassifier>>,
}

impl SpeakerClassifier {
    pub fn new(style: Option<Arc<dyn StyleClassifier>>) -> Self {
        Self { style }
    }

    /// Contextual classification when usable text and a style classifier
    /// are present; fixed energy thresholds otherwise. Classifier failures
    /// fall back to the thresholds.
    pub async fn classify(&self, features: &AudioFeatures, text: Option<&str>) -> String {
        let text = match text {
            Some(text) if !text.is_empty() && text != NO_SPEECH_TEXT => text,
            _ => return Self::classify_by_energy(features.energy),
        };
        let Some(style) = &self.style else {
            return Self::classify_by_energy(features.energy);
        };

        match style.classify_style(text).await {
            Ok(SpeechStyle::Formal | SpeechStyle::Technical) => {
                if features.energy > 0.5 {
                    "Presenter".to_string()
                } else {
                    "Moderator".to_string()
                }
            }
            Ok(_) => format!("Participant {}", (features.energy * 3.0) as i64 + 1),
            Err(e) => {
                debug!("Style classification failed, using energy thresholds: {e:#}");
                Self::classify_by_energy(features.energy)
            }
        }
    }

    /// Fixed thresholds. Deterministic and monotonic in energy.
    pub fn classify_by_energy(energy: f64) -> String {
        if energy < 0.3 {
            "Speaker 1".to_string()
        } else if energy < 0.6 {
            "Speaker 2".to_string()
        } else {
            "Speaker 3".to_string()
        }
    }
}
