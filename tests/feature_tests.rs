// Integration tests for acoustic feature extraction.

use meet_scribe::audio::{AudioArtifact, AudioFeatures, FeatureExtractor};

#[test]
fn pitch_of_440hz_sine_is_within_ten_percent() {
    let sample_rate = 16000u32;
    let samples: Vec<i16> = (0..8000)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 12000.0) as i16
        })
        .collect();
    let artifact = AudioArtifact::encode(&samples, sample_rate, 1).unwrap();

    let features = FeatureExtractor::extract(&artifact);

    assert!(
        (features.pitch - 440.0).abs() / 440.0 < 0.1,
        "pitch estimate {:.1} Hz should be within 10% of 440 Hz",
        features.pitch
    );
}

#[test]
fn energy_of_silence_is_zero() {
    let artifact = AudioArtifact::encode(&vec![0i16; 4000], 16000, 1).unwrap();
    let features = FeatureExtractor::extract(&artifact);
    assert_eq!(features.energy, 0.0);
}

#[test]
fn energy_of_full_scale_square_wave_approaches_one() {
    let samples: Vec<i16> = (0..4000)
        .map(|i| if i % 2 == 0 { 32767 } else { -32767 })
        .collect();
    let artifact = AudioArtifact::encode(&samples, 16000, 1).unwrap();

    let features = FeatureExtractor::extract(&artifact);
    assert!(features.energy > 0.99, "energy {}", features.energy);
    assert!(features.energy <= 1.0);
}

#[test]
fn duration_matches_sample_count() {
    let artifact = AudioArtifact::encode(&vec![100i16; 8000], 16000, 1).unwrap();
    let features = FeatureExtractor::extract(&artifact);
    assert!((features.duration - 0.5).abs() < 1e-9);
}

#[test]
fn pitch_is_zero_when_the_signal_is_too_short() {
    let artifact = AudioArtifact::encode(&[100i16; 10], 16000, 1).unwrap();
    let features = FeatureExtractor::extract(&artifact);
    assert_eq!(features.pitch, 0.0);
    assert!(features.energy > 0.0);
}

#[test]
fn malformed_artifact_degrades_to_zeroed_features() {
    let artifact = AudioArtifact::from_wav_bytes(vec![1, 2, 3, 4], 16000, 1);
    let features = FeatureExtractor::extract(&artifact);
    assert_eq!(features, AudioFeatures::default());
}
