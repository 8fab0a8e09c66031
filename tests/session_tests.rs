// Unit tests for session configuration, artifact naming, and telemetry
// types. Live device capture is exercised manually; everything here runs
// without hardware.

use chrono::TimeZone;
use meet_scribe::audio::LevelMeter;
use meet_scribe::session::{artifact_filename, SessionConfig};
use meet_scribe::Config;

#[test]
fn default_session_config_generates_a_meeting_id() {
    let config = SessionConfig::default();

    assert!(config.meeting_id.starts_with("meeting-"));
    assert_eq!(config.audio.sample_rate, 16000);
    assert_eq!(config.audio.channels, 1);
    assert_eq!(config.audio.frame_size, 1024);
    assert!((config.transcription.window_secs - 5.0).abs() < f64::EPSILON);
}

#[test]
fn session_config_is_built_from_the_application_config() {
    let mut app_config = Config::default();
    app_config.audio.sample_rate = 48000;
    app_config.transcription.window_secs = 10.0;

    let config = SessionConfig::from_config("standup".to_string(), &app_config);

    assert_eq!(config.meeting_id, "standup");
    assert_eq!(config.audio.sample_rate, 48000);
    assert!((config.transcription.window_secs - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.output_dir, app_config.output.dir);
}

#[test]
fn artifact_filename_follows_the_naming_convention() {
    let time = chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    assert_eq!(
        artifact_filename("42", time),
        "meeting_42_20260314_092653.wav"
    );
}

#[test]
fn config_defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.transcription.language, "es-ES");
    assert!(config.transcription.enable_speaker_identification);
    assert!(!config.transcription.enable_ai_enhancement);
    assert_eq!(config.processing.min_silence_ms, 1000);
    assert!((config.processing.silence_threshold_db + 40.0).abs() < f64::EPSILON);
    assert_eq!(config.processing.scan_step, 10);
    assert_eq!(config.output.dir, std::path::PathBuf::from("output/audio"));
    assert_eq!(config.nats.url, "nats://localhost:4222");
}

#[test]
fn level_meter_clamps_to_the_unit_range() {
    let meter = LevelMeter::new();
    assert_eq!(meter.level(), 0.0);

    meter.set(1.5);
    assert_eq!(meter.level(), 1.0);

    meter.set(0.25);
    assert_eq!(meter.level(), 0.25);

    meter.set(-0.5);
    assert_eq!(meter.level(), 0.0);
}
