use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meet_scribe::session::{CaptureSession, SessionConfig};
use meet_scribe::transcription::{
    SpeechRecognizer, StyleClassifier, Summarizer, TextEnhancer, TranscriptionEngine,
};
use meet_scribe::{Config, NatsClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "meet-scribe", about = "Meeting capture and transcription pipeline")]
struct Cli {
    /// Configuration file (optional, defaults apply without one)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List input-capable audio devices
    Devices,
    /// Capture and transcribe a meeting
    Record {
        /// Meeting identifier used in artifact filenames
        #[arg(long)]
        meeting_id: Option<String>,
        /// Input device index (host default if omitted)
        #[arg(long)]
        device: Option<usize>,
        /// How long to record, in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Devices => list_devices(),
        Command::Record {
            meeting_id,
            device,
            duration,
        } => record(config, meeting_id, device, duration).await,
    }
}

fn list_devices() -> Result<()> {
    let devices = CaptureSession::list_devices().context("Failed to enumerate audio devices")?;
    if devices.is_empty() {
        println!("No input devices found");
        return Ok(());
    }
    for device in devices {
        println!(
            "[{}] {} - channels: {}, default rate: {} Hz",
            device.index, device.name, device.max_input_channels, device.default_sample_rate
        );
    }
    Ok(())
}

async fn record(
    config: Config,
    meeting_id: Option<String>,
    device: Option<usize>,
    duration: u64,
) -> Result<()> {
    let nats = Arc::new(NatsClient::connect(&config.nats.url).await?);

    let recognizer: Arc<dyn SpeechRecognizer> = nats.clone();
    let ai = config.transcription.enable_ai_enhancement;
    let enhancer: Option<Arc<dyn TextEnhancer>> = if ai { Some(nats.clone()) } else { None };
    let style: Option<Arc<dyn StyleClassifier>> = if ai { Some(nats.clone()) } else { None };
    let summarizer: Option<Arc<dyn Summarizer>> = if ai { Some(nats.clone()) } else { None };

    let engine = Arc::new(TranscriptionEngine::new(
        config.transcription.clone(),
        recognizer,
        enhancer,
        style,
        summarizer,
    ));

    let meeting_id = meeting_id.unwrap_or_else(|| format!("meeting-{}", uuid::Uuid::new_v4()));
    let session_config = SessionConfig::from_config(meeting_id, &config);
    let session = CaptureSession::new(session_config, Arc::clone(&engine));

    session.start(device).await?;
    info!("Recording for {} seconds (ctrl-c to stop early)", duration);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(duration)) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
        }
    }

    let stats = session.stop().await?;
    session.drain().await;

    let results = session.results().await;
    println!("{}", engine.format_report(&results));

    if ai {
        println!("\n=== SUMMARY ===\n{}", engine.meeting_summary().await);
    }

    info!(
        "Session complete: {} windows, {} results, {:.1}s",
        stats.windows_flushed,
        results.len(),
        stats.duration_secs
    );
    Ok(())
}
