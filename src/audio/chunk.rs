use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

/// One fixed-size frame of captured audio (i16 PCM, interleaved).
/// Produced by the capture stream, consumed once by the window buffer,
/// never mutated.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw audio samples (i16 PCM)
    pub samples: Vec<i16>,
    /// When this chunk was captured
    pub timestamp: DateTime<Utc>,
    /// Chunk length in seconds
    pub duration: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        let duration = samples.len() as f64 / (sample_rate as f64 * channels as f64);
        Self {
            samples,
            timestamp: Utc::now(),
            duration,
            sample_rate,
            channels,
        }
    }

    /// Normalized RMS amplitude in [0, 1].
    pub fn energy(&self) -> f64 {
        super::features::rms_energy(&self.samples)
    }
}

/// The WAV-encoded audio of one flushed window. Owned by the session until
/// persisted; the storage path doubles as the transcription-cache identity.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    wav: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_count: usize,
    pub duration_secs: f64,
    path: Option<PathBuf>,
}

impl AudioArtifact {
    /// Encode PCM samples as a 16-bit little-endian WAV byte sequence.
    pub fn encode(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV data")?;
        }

        let duration_secs = samples.len() as f64 / (sample_rate as f64 * channels as f64);

        Ok(Self {
            wav: cursor.into_inner(),
            sample_rate,
            channels,
            sample_count: samples.len(),
            duration_secs,
            path: None,
        })
    }

    /// Wrap already-encoded WAV bytes, e.g. an artifact reloaded from disk.
    /// The container is not validated here; consumers that decode malformed
    /// data degrade instead of failing. Assumes the canonical 44-byte PCM
    /// header when estimating the sample count.
    pub fn from_wav_bytes(wav: Vec<u8>, sample_rate: u32, channels: u16) -> Self {
        let sample_count = wav.len().saturating_sub(44) / 2;
        let duration_secs = sample_count as f64 / (sample_rate as f64 * channels.max(1) as f64);
        Self {
            wav,
            sample_rate,
            channels,
            sample_count,
            duration_secs,
            path: None,
        }
    }

    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }

    /// Decode the PCM samples back out of the WAV container.
    pub fn samples(&self) -> Result<Vec<i16>> {
        let reader =
            WavReader::new(Cursor::new(&self.wav)).context("Failed to parse WAV data")?;
        reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")
    }

    /// Write the artifact to disk and remember the path.
    pub async fn persist(&mut self, path: PathBuf) -> Result<()> {
        tokio::fs::write(&path, &self.wav)
            .await
            .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
        info!("Audio artifact saved: {}", path.display());
        self.path = Some(path);
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Identity used by the transcription cache: the storage path once the
    /// artifact is persisted, a content hash before that.
    pub fn cache_key(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => {
                let mut hasher = DefaultHasher::new();
                self.wav.hash(&mut hasher);
                format!("artifact-{:016x}", hasher.finish())
            }
        }
    }
}
