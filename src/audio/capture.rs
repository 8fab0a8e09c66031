use super::chunk::AudioChunk;
use crate::config::AudioConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Chunks queued between the stream callback and the blocking reader.
const CHUNK_QUEUE_CAPACITY: usize = 64;

/// Fatal device problems. These surface to whoever starts the session;
/// anything that happens after the stream is up is a logged skip instead.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no default input device available")]
    NoDefaultDevice,
    #[error("input device {0} not found")]
    NotFound(usize),
    #[error("failed to enumerate input devices: {0}")]
    Enumeration(#[from] cpal::DevicesError),
    #[error("failed to query device configuration: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    Start(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// One row of the device table exposed to the application.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub default_sample_rate: u32,
}

/// Enumerate input-capable devices only.
pub fn list_input_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    for (index, device) in host.input_devices()?.enumerate() {
        let name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());
        let Ok(default_config) = device.default_input_config() else {
            debug!("Skipping device without a usable input config: {}", name);
            continue;
        };
        let max_input_channels = device
            .supported_input_configs()
            .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
            .unwrap_or_else(|_| default_config.channels());

        devices.push(DeviceInfo {
            index,
            name,
            max_input_channels,
            default_sample_rate: default_config.sample_rate().0,
        });
    }

    Ok(devices)
}

/// Live audio level in [0, 1], shared lock-free between the capture thread
/// and telemetry readers.
#[derive(Clone, Debug)]
pub struct LevelMeter {
    level_bits: Arc<AtomicU32>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0f32.to_bits())),
        }
    }

    pub fn set(&self, level: f32) {
        self.level_bits
            .store(level.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Microphone audio source. Resolves the device up front so unusable
/// hardware fails the session immediately; the stream itself is built on
/// the capture thread (cpal streams are not `Send`).
pub struct MicSource {
    device: cpal::Device,
    sample_rate: u32,
    frame_size: usize,
}

impl MicSource {
    /// Resolve the capture device by enumeration index, falling back to the
    /// configured index and then the host default.
    pub fn open(config: &AudioConfig, device_index: Option<usize>) -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = match device_index.or(config.device_index) {
            Some(index) => host
                .input_devices()?
                .nth(index)
                .ok_or(DeviceError::NotFound(index))?,
            None => host
                .default_input_device()
                .ok_or(DeviceError::NoDefaultDevice)?,
        };

        // Fail now if the device cannot describe an input stream at all.
        device.default_input_config()?;

        Ok(Self {
            device,
            sample_rate: config.sample_rate,
            frame_size: config.frame_size,
        })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Build and start the input stream. Must be called on the thread that
    /// will own the stream for its whole lifetime.
    pub fn start_stream(&self, meter: &LevelMeter) -> Result<ChunkStream, DeviceError> {
        let default_config = self.device.default_input_config()?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        info!(
            "Opening input stream on '{}': {:?} {}Hz {}ch -> {}Hz mono",
            self.device_name(),
            format,
            device_rate,
            channels,
            self.sample_rate
        );

        let (tx, rx) = bounded::<AudioChunk>(CHUNK_QUEUE_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        let assembler = Arc::new(Mutex::new(FrameAssembler::new(
            self.frame_size,
            device_rate,
            self.sample_rate,
            tx,
            Arc::clone(&dropped),
        )));

        // Stream read errors skip frames; they never abort the capture loop.
        let err_fn = |err| warn!("Audio stream error (frame skipped): {}", err);

        let stream = match format {
            SampleFormat::F32 => {
                let assembler = Arc::clone(&assembler);
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut assembler) = assembler.lock() {
                            assembler.push(data, channels, |sample| sample);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let assembler = Arc::clone(&assembler);
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut assembler) = assembler.lock() {
                            assembler.push(data, channels, |sample| sample as f32 / 32_768.0);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let assembler = Arc::clone(&assembler);
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut assembler) = assembler.lock() {
                            assembler.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(DeviceError::UnsupportedFormat(format!("{other:?}"))),
        };

        stream.play()?;

        let frame_duration =
            Duration::from_secs_f64(self.frame_size as f64 / self.sample_rate as f64);

        Ok(ChunkStream {
            stream,
            rx,
            dropped,
            meter: meter.clone(),
            read_timeout: frame_duration * 4,
        })
    }
}

/// Outcome of one blocking chunk read.
pub enum ChunkRead {
    Chunk(AudioChunk),
    /// No frame arrived in time; the caller skips and keeps looping.
    Timeout,
    EndOfStream,
}

/// A running input stream delivering fixed-size chunks. Lives on the
/// capture thread; one blocking read per chunk.
pub struct ChunkStream {
    stream: cpal::Stream,
    rx: Receiver<AudioChunk>,
    dropped: Arc<AtomicUsize>,
    meter: LevelMeter,
    read_timeout: Duration,
}

impl ChunkStream {
    pub fn read_chunk(&self) -> ChunkRead {
        match self.rx.recv_timeout(self.read_timeout) {
            Ok(chunk) => {
                self.meter.set(chunk.energy() as f32);
                ChunkRead::Chunk(chunk)
            }
            Err(RecvTimeoutError::Timeout) => ChunkRead::Timeout,
            Err(RecvTimeoutError::Disconnected) => ChunkRead::EndOfStream,
        }
    }

    /// Frames discarded because the queue was full.
    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Pause and release the device stream.
    pub fn close(self) {
        let dropped = self.dropped_frames();
        if dropped > 0 {
            warn!("{} audio frames dropped during capture", dropped);
        }
        if let Err(err) = self.stream.pause() {
            warn!("Failed to pause audio stream: {}", err);
        }
        self.meter.set(0.0);
    }
}

/// Converts raw callback buffers into fixed-size mono i16 chunks at the
/// target rate: downmix, accumulate, resample per frame, re-frame.
struct FrameAssembler {
    device_frame_samples: usize,
    target_frame_samples: usize,
    target_rate: u32,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    tx: Sender<AudioChunk>,
    dropped: Arc<AtomicUsize>,
}

impl FrameAssembler {
    fn new(
        frame_size: usize,
        device_rate: u32,
        target_rate: u32,
        tx: Sender<AudioChunk>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        let device_frame_samples =
            ((frame_size as u64 * device_rate as u64) / target_rate.max(1) as u64).max(1) as usize;
        Self {
            device_frame_samples,
            target_frame_samples: frame_size,
            target_rate,
            pending: Vec::with_capacity(device_frame_samples * 2),
            scratch: Vec::new(),
            tx,
            dropped,
        }
    }

    fn push<T, F>(&mut self, data: &[T], channels: usize, mut convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        downmix_to_mono(&mut self.scratch, data, channels, &mut convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.device_frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.device_frame_samples).collect();
            let frame = resample_linear(&frame, self.target_frame_samples);
            let samples: Vec<i16> = frame
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32_767.0) as i16)
                .collect();
            let chunk = AudioChunk::new(samples, self.target_rate, 1);

            if let Err(err) = self.tx.try_send(chunk) {
                match err {
                    TrySendError::Full(_) => {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    TrySendError::Disconnected(_) => break,
                }
            }
        }
    }
}

/// Average interleaved frames down to a single channel.
fn downmix_to_mono<T, F>(buf: &mut Vec<f32>, data: &[T], channels: usize, convert: &mut F)
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(convert));
        return;
    }

    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for &sample in frame {
            acc += convert(sample);
        }
        buf.push(acc / frame.len() as f32);
    }
}

/// Linear-interpolation resample of one frame to the desired length.
fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.len() == output_len {
        return input.to_vec();
    }
    let mut output = Vec::with_capacity(output_len);
    if input.is_empty() {
        output.resize(output_len, 0.0);
        return output;
    }

    let ratio = input.len() as f32 / output_len as f32;
    for i in 0..output_len {
        let src = i as f32 * ratio;
        let idx = src.floor() as usize;
        let frac = src - idx as f32;
        let sample = if idx + 1 < input.len() {
            input[idx] * (1.0 - frac) + input[idx + 1] * frac
        } else {
            input[input.len() - 1]
        };
        output.push(sample);
    }
    output
}
