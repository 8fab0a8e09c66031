use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::{
    list_input_devices, AudioArtifact, AudioChunk, ChunkRead, ChunkStream, DeviceError,
    DeviceInfo, LevelMeter, MicSource, WindowBuffer,
};
use crate::transcription::{TranscriptionEngine, TranscriptionResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

/// Capacity of the capture-thread -> pump-task chunk channel. At the
/// default 1024-sample/16 kHz frame this is about two seconds of audio.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// A capture session wiring microphone capture through window buffering
/// to transcription dispatch.
///
/// Two execution contexts: a dedicated thread for blocking device reads,
/// and tokio tasks for the window pump and the network-bound transcription
/// calls. Chunks cross between them over a bounded channel.
pub struct CaptureSession {
    config: SessionConfig,
    engine: Arc<TranscriptionEngine>,

    /// Whether capture is currently active
    is_recording: Arc<AtomicBool>,

    /// Windows flushed into artifacts so far
    windows_flushed: Arc<AtomicUsize>,

    /// Live input level updated by the capture thread
    level: LevelMeter,

    /// When the session was created
    started_at: DateTime<Utc>,

    /// Handle for the blocking capture thread
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,

    /// Handle for the chunk pump task
    pump_handle: Mutex<Option<JoinHandle<()>>>,

    /// In-flight transcription dispatches
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl CaptureSession {
    pub fn new(config: SessionConfig, engine: Arc<TranscriptionEngine>) -> Self {
        Self {
            config,
            engine,
            is_recording: Arc::new(AtomicBool::new(false)),
            windows_flushed: Arc::new(AtomicUsize::new(0)),
            level: LevelMeter::new(),
            started_at: Utc::now(),
            capture_handle: Mutex::new(None),
            pump_handle: Mutex::new(None),
            tasks: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Input devices usable for a session.
    pub fn list_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
        list_input_devices()
    }

    /// Open the device and start the capture/processing pipeline. Device
    /// problems are fatal and surface here; everything downstream degrades
    /// instead of failing.
    pub async fn start(&self, device_index: Option<usize>) -> Result<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            warn!("Capture session already running");
            return Ok(());
        }

        info!("Starting capture session: {}", self.config.meeting_id);

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .context("Failed to create output directory")?;

        let source = MicSource::open(&self.config.audio, device_index)
            .context("Failed to open audio input device")?;
        info!("Capture device: {}", source.device_name());

        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>(CHUNK_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), DeviceError>>();

        self.is_recording.store(true, Ordering::SeqCst);

        // Dedicated worker for blocking device reads. The cpal stream is
        // built on this thread and stays there; readiness or a fatal build
        // error is reported back through the oneshot.
        let is_recording = Arc::clone(&self.is_recording);
        let level = self.level.clone();
        let capture_thread = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let stream = match source.start_stream(&level) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                capture_loop(stream, chunk_tx, is_recording);
            })
            .context("Failed to spawn capture thread")?;

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.is_recording.store(false, Ordering::SeqCst);
                let _ = capture_thread.join();
                return Err(e).context("Failed to start audio input stream");
            }
            Err(_) => {
                self.is_recording.store(false, Ordering::SeqCst);
                let _ = capture_thread.join();
                anyhow::bail!("Capture thread exited before the stream came up");
            }
        }

        let engine = Arc::clone(&self.engine);
        let windows_flushed = Arc::clone(&self.windows_flushed);
        let tasks = Arc::clone(&self.tasks);
        let config = self.config.clone();
        let session_epoch = Instant::now();

        let pump = tokio::spawn(async move {
            pump_loop(chunk_rx, config, engine, windows_flushed, tasks, session_epoch).await;
        });

        {
            let mut handle = self.capture_handle.lock().await;
            *handle = Some(capture_thread);
        }
        {
            let mut handle = self.pump_handle.lock().await;
            *handle = Some(pump);
        }

        info!("Capture session started");
        Ok(())
    }

    /// Stop capturing. Signals the capture loop, joins it, and waits for
    /// the pump to flush and dispatch the final partial window. In-flight
    /// transcriptions keep running and may append to the log after this
    /// returns; `drain` waits for them.
    pub async fn stop(&self) -> Result<SessionStats> {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            warn!("Capture session not running");
            return self.stats().await;
        }

        info!("Stopping capture session: {}", self.config.meeting_id);

        {
            let mut handle = self.capture_handle.lock().await;
            if let Some(thread) = handle.take() {
                let join = tokio::task::spawn_blocking(move || thread.join());
                if join.await.context("Capture thread join failed")?.is_err() {
                    error!("Capture thread panicked");
                }
            }
        }

        {
            let mut handle = self.pump_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Pump task failed: {}", e);
                }
            }
        }

        self.level.set(0.0);
        info!("Capture session stopped");

        self.stats().await
    }

    /// Wait for every dispatched transcription to finish.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("Transcription task failed: {}", e);
            }
        }
    }

    /// Live input level in [0, 1].
    pub fn current_audio_level(&self) -> f32 {
        self.level.level()
    }

    /// Transcription results so far, ordered by relative timestamp.
    pub async fn results(&self) -> Vec<TranscriptionResult> {
        self.engine.results().await
    }

    pub fn meeting_id(&self) -> &str {
        &self.config.meeting_id
    }

    pub async fn stats(&self) -> Result<SessionStats> {
        let duration = Utc::now().signed_duration_since(self.started_at);

        Ok(SessionStats {
            is_recording: self.is_recording.load(Ordering::SeqCst),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            windows_flushed: self.windows_flushed.load(Ordering::SeqCst),
            results_count: self.engine.results().await.len(),
        })
    }
}

/// Blocking read loop: one chunk per iteration, handed to the pump task
/// over the bounded channel. Read timeouts skip the frame and keep going.
fn capture_loop(
    stream: ChunkStream,
    chunk_tx: mpsc::Sender<AudioChunk>,
    is_recording: Arc<AtomicBool>,
) {
    info!("Capture loop started");

    while is_recording.load(Ordering::SeqCst) {
        match stream.read_chunk() {
            ChunkRead::Chunk(chunk) => {
                if chunk_tx.blocking_send(chunk).is_err() {
                    warn!("Chunk channel closed, stopping capture loop");
                    break;
                }
            }
            ChunkRead::Timeout => continue,
            ChunkRead::EndOfStream => {
                warn!("Audio stream ended");
                break;
            }
        }
    }

    stream.close();
    info!("Capture loop stopped");
    // Dropping chunk_tx here closes the pump's receive side.
}

/// Consumes capture-order chunks, maintains the window buffer, and flushes
/// whenever the accumulated duration crosses the target window. When the
/// channel closes the final partial window is flushed and dispatched
/// synchronously so `stop` returns with it accounted for.
async fn pump_loop(
    mut chunk_rx: mpsc::Receiver<AudioChunk>,
    config: SessionConfig,
    engine: Arc<TranscriptionEngine>,
    windows_flushed: Arc<AtomicUsize>,
    tasks: Arc<Mutex<JoinSet<()>>>,
    session_epoch: Instant,
) {
    let mut buffer = WindowBuffer::new(
        config.audio.sample_rate,
        config.audio.channels,
        config.processing.clone(),
    );

    while let Some(chunk) = chunk_rx.recv().await {
        buffer.add_chunk(chunk);
        if buffer.buffered_duration() >= config.transcription.window_secs {
            if let Some(artifact) = buffer.flush() {
                windows_flushed.fetch_add(1, Ordering::SeqCst);
                dispatch_window(artifact, &config, &engine, &tasks, session_epoch, false).await;
            }
        }
    }

    if let Some(artifact) = buffer.flush() {
        windows_flushed.fetch_add(1, Ordering::SeqCst);
        dispatch_window(artifact, &config, &engine, &tasks, session_epoch, true).await;
    }
}

/// Persist an artifact and hand it to the orchestrator — spawned for
/// regular windows, awaited in place for the final flush on stop. A
/// persistence failure is logged and transcription proceeds from memory.
async fn dispatch_window(
    mut artifact: AudioArtifact,
    config: &SessionConfig,
    engine: &Arc<TranscriptionEngine>,
    tasks: &Arc<Mutex<JoinSet<()>>>,
    session_epoch: Instant,
    synchronous: bool,
) {
    let relative_timestamp = session_epoch.elapsed().as_secs_f64();

    let path = config
        .output_dir
        .join(artifact_filename(&config.meeting_id, Local::now()));
    if let Err(e) = artifact.persist(path).await {
        error!("Failed to persist audio artifact: {e:#}");
    }

    if synchronous {
        engine.transcribe(&artifact, relative_timestamp).await;
    } else {
        let engine = Arc::clone(engine);
        let mut tasks = tasks.lock().await;
        tasks.spawn(async move {
            engine.transcribe(&artifact, relative_timestamp).await;
        });
    }
}

/// Artifact naming convention: `meeting_{meetingId}_{YYYYMMDD_HHMMSS}.wav`.
pub fn artifact_filename<Tz>(meeting_id: &str, time: DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("meeting_{}_{}.wav", meeting_id, time.format("%Y%m%d_%H%M%S"))
}
