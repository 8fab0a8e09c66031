// Integration tests for window buffering and artifact processing.
//
// These tests verify the flush invariants, the WAV round trip, and the
// auxiliary silence/normalization helpers.

use meet_scribe::audio::{normalize, smooth, AudioArtifact, AudioChunk, WindowBuffer};
use meet_scribe::config::ProcessingConfig;

fn chunk_of(samples: Vec<i16>, sample_rate: u32) -> AudioChunk {
    AudioChunk::new(samples, sample_rate, 1)
}

fn test_buffer() -> WindowBuffer {
    WindowBuffer::new(16000, 1, ProcessingConfig::default())
}

#[test]
fn buffered_duration_tracks_chunk_sum() {
    let mut buffer = test_buffer();
    assert_eq!(buffer.buffered_duration(), 0.0);

    // 100ms chunks at 16kHz
    for _ in 0..4 {
        buffer.add_chunk(chunk_of(vec![0; 1600], 16000));
    }

    assert!((buffer.buffered_duration() - 0.4).abs() < 1e-9);
}

#[test]
fn flush_on_empty_buffer_is_a_noop() {
    let mut buffer = test_buffer();
    assert!(buffer.flush().is_none());
    assert_eq!(buffer.buffered_duration(), 0.0);
}

#[test]
fn flush_concatenates_in_order_and_clears_buffer() {
    let mut buffer = test_buffer();
    let first: Vec<i16> = (0..1024).map(|i| (i % 251) as i16).collect();
    let second: Vec<i16> = (0..1024).map(|i| -((i % 113) as i16)).collect();
    buffer.add_chunk(chunk_of(first.clone(), 16000));
    buffer.add_chunk(chunk_of(second.clone(), 16000));

    let artifact = buffer.flush().expect("flush should produce an artifact");

    assert_eq!(buffer.buffered_duration(), 0.0);
    assert!(buffer.flush().is_none(), "buffer should be empty after flush");

    let mut expected = first;
    expected.extend(second);
    assert_eq!(artifact.samples().unwrap(), expected);
    assert_eq!(artifact.sample_count, 2048);
    assert_eq!(artifact.sample_rate, 16000);
    assert_eq!(artifact.channels, 1);
}

#[test]
fn wav_round_trip_is_byte_exact() {
    let samples: Vec<i16> = (-500..500).map(|i| (i * 13) as i16).collect();
    let artifact = AudioArtifact::encode(&samples, 16000, 1).unwrap();
    assert_eq!(artifact.samples().unwrap(), samples);
}

#[test]
fn five_second_window_flushes_once_for_5_2s_of_frames() {
    // 5.2s of 1024-sample frames at 16kHz against a 5s window: exactly one
    // flush once the running duration passes 5.0s, ~0.2s left buffered.
    let mut buffer = test_buffer();
    let target = 5.0;
    let frame = vec![0i16; 1024];
    let frame_secs: f64 = 1024.0 / 16000.0; // 64ms
    let total_frames = (5.2 / frame_secs).ceil() as usize;

    let mut artifacts = Vec::new();
    for _ in 0..total_frames {
        buffer.add_chunk(chunk_of(frame.clone(), 16000));
        if buffer.buffered_duration() >= target {
            artifacts.push(buffer.flush().expect("flush at the window boundary"));
        }
    }

    assert_eq!(artifacts.len(), 1, "exactly one window should flush");
    let flushed = &artifacts[0];
    assert!(
        (flushed.duration_secs - 5.056).abs() < 0.01,
        "first window should be just past 5s, got {:.3}s",
        flushed.duration_secs
    );
    assert!(
        buffer.buffered_duration() > 0.0 && buffer.buffered_duration() < 0.3,
        "~0.2s should remain buffered, got {:.3}s",
        buffer.buffered_duration()
    );
}

#[test]
fn normalize_leaves_all_zero_input_unchanged() {
    assert_eq!(normalize(&[0, 0, 0]), vec![0, 0, 0]);
}

#[test]
fn normalize_scales_peak_to_ninety_percent_of_full_scale() {
    let samples = vec![1000i16, -2000, 500];
    let normalized = normalize(&samples);

    let peak = normalized.iter().map(|&s| (s as i32).abs()).max().unwrap();
    let target = (0.9 * 32767.0) as i32;
    assert!(
        (peak - target).abs() <= 1,
        "peak {} should be within rounding of {}",
        peak,
        target
    );
    // Relative shape preserved: signs and ordering survive scaling.
    assert!(normalized[0] > 0 && normalized[1] < 0 && normalized[2] > 0);
}

#[test]
fn smooth_keeps_length_and_averages_plateaus() {
    let samples = vec![10i16; 32];
    let smoothed = smooth(&samples);

    assert_eq!(smoothed.len(), samples.len());
    // Interior samples keep the plateau value; edges dip from zero padding.
    assert_eq!(smoothed[16], 10);
    assert!(smoothed[0] < 10);
}

#[test]
fn smooth_passes_short_input_through() {
    let samples = vec![7i16, -3, 12];
    assert_eq!(smooth(&samples), samples);
}

#[test]
fn detect_speech_segments_finds_the_loud_region() {
    let buffer = test_buffer();
    // 0.5s silence, 0.5s tone, 0.5s silence at 16kHz.
    let mut samples = vec![0i16; 8000];
    samples.extend(std::iter::repeat(8000i16).take(8000));
    samples.extend(std::iter::repeat(0i16).take(8000));
    let artifact = AudioArtifact::encode(&samples, 16000, 1).unwrap();

    let segments = buffer.detect_speech_segments(&artifact);

    assert_eq!(segments.len(), 1);
    let (start, end) = segments[0];
    assert!((7990..=8010).contains(&start), "start {}", start);
    assert!((15990..=16010).contains(&end), "end {}", end);
}

#[test]
fn detect_speech_segments_merges_gaps_shorter_than_minimum() {
    let buffer = test_buffer();
    // Two tones separated by 0.3s of silence: below the 1s minimum gap.
    let mut samples = vec![8000i16; 4000];
    samples.extend(std::iter::repeat(0i16).take(4800));
    samples.extend(std::iter::repeat(8000i16).take(4000));
    let artifact = AudioArtifact::encode(&samples, 16000, 1).unwrap();

    assert_eq!(buffer.detect_speech_segments(&artifact).len(), 1);
}

#[test]
fn detect_speech_segments_splits_on_long_gaps() {
    let buffer = test_buffer();
    // 1.2s of silence splits the segments.
    let mut samples = vec![8000i16; 4000];
    samples.extend(std::iter::repeat(0i16).take(19200));
    samples.extend(std::iter::repeat(8000i16).take(4000));
    let artifact = AudioArtifact::encode(&samples, 16000, 1).unwrap();

    assert_eq!(buffer.detect_speech_segments(&artifact).len(), 2);
}

#[test]
fn detect_speech_segments_returns_empty_for_silence() {
    let buffer = test_buffer();
    let artifact = AudioArtifact::encode(&vec![0i16; 16000], 16000, 1).unwrap();
    assert!(buffer.detect_speech_segments(&artifact).is_empty());
}

#[tokio::test]
async fn persist_writes_the_wav_and_switches_the_cache_key_to_the_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut artifact = AudioArtifact::encode(&[100i16; 1600], 16000, 1).unwrap();

    let content_key = artifact.cache_key();
    assert!(content_key.starts_with("artifact-"));

    let path = dir.path().join("meeting_test_20260101_000000.wav");
    artifact.persist(path.clone()).await.unwrap();

    assert_eq!(artifact.path(), Some(path.as_path()));
    assert_eq!(artifact.cache_key(), path.display().to_string());

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, artifact.wav_bytes());
}
