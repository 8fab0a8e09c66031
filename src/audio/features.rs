use super::chunk::AudioArtifact;
use tracing::warn;

/// Acoustic features derived from one artifact. Recomputed per artifact,
/// never cached across artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFeatures {
    /// Normalized RMS amplitude in [0, 1]
    pub energy: f64,
    /// Estimated fundamental frequency in Hz (0 when undetectable)
    pub pitch: f64,
    /// Artifact length in seconds
    pub duration: f64,
}

/// Lag range searched for the autocorrelation pitch peak, in samples.
const MIN_PITCH_LAG: usize = 20;
const MAX_PITCH_LAG: usize = 500;

pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract energy, approximate pitch, and duration. Malformed artifacts
    /// degrade to zeroed features instead of failing.
    pub fn extract(artifact: &AudioArtifact) -> AudioFeatures {
        let samples = match artifact.samples() {
            Ok(samples) if !samples.is_empty() => samples,
            Ok(_) => return AudioFeatures::default(),
            Err(e) => {
                warn!("Feature extraction failed, using zeroed features: {e:#}");
                return AudioFeatures::default();
            }
        };

        AudioFeatures {
            energy: rms_energy(&samples),
            pitch: estimate_pitch(&samples, artifact.sample_rate),
            duration: samples.len() as f64 / artifact.sample_rate as f64,
        }
    }
}

/// Normalized RMS amplitude of PCM16 samples, in [0, 1].
pub fn rms_energy(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt() / 32_768.0
}

/// Fundamental-frequency estimate: the autocorrelation peak over the
/// non-trivial lag range. Returns 0 when the signal is too short to hold
/// a valid peak.
fn estimate_pitch(samples: &[i16], sample_rate: u32) -> f64 {
    let max_lag = MAX_PITCH_LAG.min(samples.len().saturating_sub(1));
    if max_lag <= MIN_PITCH_LAG {
        return 0.0;
    }

    let mut best_lag = 0usize;
    let mut best_value = f64::MIN;
    for lag in MIN_PITCH_LAG..max_lag {
        let mut acc = 0.0f64;
        for i in 0..samples.len() - lag {
            acc += samples[i] as f64 * samples[i + lag] as f64;
        }
        if acc > best_value {
            best_value = acc;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return 0.0;
    }
    sample_rate as f64 / best_lag as f64
}
