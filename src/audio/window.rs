use super::chunk::{AudioArtifact, AudioChunk};
use crate::config::ProcessingConfig;
use tracing::{error, warn};

/// Accumulates capture-order chunks until the coordinator flushes a window.
///
/// Single producer, single consumer: the pump task owns the buffer, so no
/// locking is needed here. Invariant: `buffered_duration` equals the sum of
/// the durations of the buffered chunks.
pub struct WindowBuffer {
    chunks: Vec<AudioChunk>,
    buffered_secs: f64,
    sample_rate: u32,
    channels: u16,
    processing: ProcessingConfig,
}

impl WindowBuffer {
    pub fn new(sample_rate: u32, channels: u16, processing: ProcessingConfig) -> Self {
        Self {
            chunks: Vec::new(),
            buffered_secs: 0.0,
            sample_rate,
            channels,
            processing,
        }
    }

    /// Chunks arrive in capture order and are kept that way.
    pub fn add_chunk(&mut self, chunk: AudioChunk) {
        self.buffered_secs += chunk.duration;
        self.chunks.push(chunk);
    }

    pub fn buffered_duration(&self) -> f64 {
        self.buffered_secs
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buffered_secs = 0.0;
    }

    /// Concatenate everything buffered into one WAV artifact and reset.
    /// Returns `None` for an empty buffer (no-op) or an encoding failure.
    pub fn flush(&mut self) -> Option<AudioArtifact> {
        if self.chunks.is_empty() {
            return None;
        }

        let total: usize = self.chunks.iter().map(|c| c.samples.len()).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in &self.chunks {
            samples.extend_from_slice(&chunk.samples);
        }
        self.clear();

        match AudioArtifact::encode(&samples, self.sample_rate, self.channels) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                error!("Failed to encode window artifact: {e:#}");
                None
            }
        }
    }

    /// Non-silent `[start, end)` sample intervals of an artifact. Silent
    /// gaps shorter than the configured minimum do not split a segment.
    /// Malformed artifacts yield an empty list.
    pub fn detect_speech_segments(&self, artifact: &AudioArtifact) -> Vec<(usize, usize)> {
        let samples = match artifact.samples() {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Failed to decode artifact for segment detection: {e:#}");
                return Vec::new();
            }
        };
        detect_nonsilent(&samples, artifact.sample_rate, &self.processing)
    }
}

fn detect_nonsilent(
    samples: &[i16],
    sample_rate: u32,
    processing: &ProcessingConfig,
) -> Vec<(usize, usize)> {
    if samples.is_empty() {
        return Vec::new();
    }

    let threshold = (32_768.0 * 10f64.powf(processing.silence_threshold_db / 20.0)) as i32;
    let min_silence = (sample_rate as u64 * processing.min_silence_ms / 1000) as usize;
    let step = processing.scan_step.max(1);

    let mut segments = Vec::new();
    // (segment start, end of the last loud stretch seen)
    let mut current: Option<(usize, usize)> = None;

    let mut idx = 0;
    while idx < samples.len() {
        if (samples[idx] as i32).abs() >= threshold {
            let end = (idx + step).min(samples.len());
            current = match current {
                Some((start, last_end)) if idx - last_end < min_silence => Some((start, end)),
                Some(done) => {
                    segments.push(done);
                    Some((idx, end))
                }
                None => Some((idx, end)),
            };
        }
        idx += step;
    }

    if let Some(done) = current {
        segments.push(done);
    }
    segments
}

/// Rescale so the loudest sample sits at 90% of full scale. All-zero input
/// is returned unchanged.
pub fn normalize(samples: &[i16]) -> Vec<i16> {
    let max = samples.iter().map(|&s| (s as i32).abs()).max().unwrap_or(0);
    if max == 0 {
        return samples.to_vec();
    }

    let scale = 0.9 * 32_767.0 / max as f64;
    samples.iter().map(|&s| (s as f64 * scale) as i16).collect()
}

/// 5-sample moving-average low-pass filter. Same-length output with
/// zero-padded edges; inputs shorter than the window pass through.
pub fn smooth(samples: &[i16]) -> Vec<i16> {
    const WINDOW: usize = 5;
    if samples.len() <= WINDOW {
        return samples.to_vec();
    }

    let half = WINDOW / 2;
    let mut output = Vec::with_capacity(samples.len());
    for i in 0..samples.len() {
        let mut acc = 0i64;
        for k in 0..WINDOW {
            if let Some(j) = (i + k).checked_sub(half) {
                if let Some(&s) = samples.get(j) {
                    acc += s as i64;
                }
            }
        }
        output.push((acc / WINDOW as i64) as i16);
    }
    output
}
