use std::f32::consts::PI;

use approx::assert_abs_diff_eq;
use tonalyzer::audio::encoder::{self, WAV_HEADER_LEN};
use tonalyzer::audio::normalizer::{self, NormalizeOutcome};
use tonalyzer::types::{ReadyPayload, TARGET_SAMPLE_RATE};

fn sine(frequency: f32, seconds: f64, sample_rate: u32) -> Vec<f32> {
    let total = (seconds * sample_rate as f64) as usize;
    (0..total)
        .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin() * 0.6)
        .collect()
}

fn wav_payload(samples: &[f32], channels: u16, sample_rate: u32) -> ReadyPayload {
    let bytes = encoder::encode_wav(samples, channels, sample_rate).unwrap();
    ReadyPayload {
        size_bytes: bytes.len() as u64,
        bytes,
        mime: "audio/wav".to_string(),
        duration_seconds: 0.0,
        suggested_name: "fixture.wav".to_string(),
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

#[test]
fn canonical_wav_header_is_bit_exact() {
    let samples = sine(220.0, 0.25, TARGET_SAMPLE_RATE);
    let canonical = encoder::encode_canonical(&samples, TARGET_SAMPLE_RATE).unwrap();
    let bytes = &canonical.bytes;
    let data_len = (canonical.frame_count * 2) as u32;

    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(read_u32_le(bytes, 4), bytes.len() as u32 - 8);
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[12..16], b"fmt ");
    assert_eq!(read_u32_le(bytes, 16), 16);
    assert_eq!(read_u16_le(bytes, 20), 1); // PCM
    assert_eq!(read_u16_le(bytes, 22), 1); // mono
    assert_eq!(read_u32_le(bytes, 24), TARGET_SAMPLE_RATE);
    assert_eq!(read_u32_le(bytes, 28), TARGET_SAMPLE_RATE * 2); // byte rate
    assert_eq!(read_u16_le(bytes, 32), 2); // block align
    assert_eq!(read_u16_le(bytes, 34), 16); // bits per sample
    assert_eq!(&bytes[36..40], b"data");
    assert_eq!(read_u32_le(bytes, 40), data_len);
    assert_eq!(bytes.len(), WAV_HEADER_LEN + data_len as usize);
}

#[test]
fn round_trip_frame_count_matches_duration() {
    let seconds = 1.0;
    let native_rate = 44_100;
    let payload = wav_payload(&sine(440.0, seconds, native_rate), 1, native_rate);
    let canonical = normalizer::normalize(&payload, TARGET_SAMPLE_RATE).unwrap();
    let expected = (seconds * TARGET_SAMPLE_RATE as f64).round();
    assert!(
        (canonical.frame_count as f64 - expected).abs() <= 1.0,
        "frame count {} vs expected {expected}",
        canonical.frame_count
    );
    assert_eq!(
        canonical.bytes.len(),
        WAV_HEADER_LEN + canonical.frame_count * 2
    );
}

#[test]
fn stereo_opposites_mix_down_to_silence() {
    let frames = 8_000;
    let mut interleaved = Vec::with_capacity(frames * 2);
    for _ in 0..frames {
        interleaved.push(1.0f32);
        interleaved.push(-1.0f32);
    }
    let payload = wav_payload(&interleaved, 2, TARGET_SAMPLE_RATE);
    let canonical = normalizer::normalize(&payload, TARGET_SAMPLE_RATE).unwrap();
    let (channels, _) = encoder::decode_wav(&canonical.bytes).unwrap();
    assert_eq!(channels.len(), 1);
    for &sample in &channels[0] {
        assert_abs_diff_eq!(sample, 0.0, epsilon = 1e-4);
    }
}

#[test]
fn normalizing_canonical_audio_is_idempotent() {
    let samples = sine(180.0, 0.5, TARGET_SAMPLE_RATE);
    let first = encoder::encode_canonical(&samples, TARGET_SAMPLE_RATE).unwrap();
    let payload = ReadyPayload {
        size_bytes: first.bytes.len() as u64,
        bytes: first.bytes.clone(),
        mime: "audio/wav".to_string(),
        duration_seconds: first.duration_seconds(),
        suggested_name: "canonical.wav".to_string(),
    };
    let second = normalizer::normalize(&payload, TARGET_SAMPLE_RATE).unwrap();
    assert_eq!(second.bytes, first.bytes, "re-encoding must be byte-identical");
}

#[test]
fn four_channel_input_averages_every_channel() {
    let frames = 1_000;
    // Channels at +1, +1, -1, 0 average to 0.25.
    let mut interleaved = Vec::with_capacity(frames * 4);
    for _ in 0..frames {
        interleaved.extend_from_slice(&[1.0f32, 1.0, -1.0, 0.0]);
    }
    let payload = wav_payload(&interleaved, 4, TARGET_SAMPLE_RATE);
    let canonical = normalizer::normalize(&payload, TARGET_SAMPLE_RATE).unwrap();
    let (channels, _) = encoder::decode_wav(&canonical.bytes).unwrap();
    for &sample in &channels[0] {
        assert_abs_diff_eq!(sample, 0.25, epsilon = 1e-3);
    }
}

#[test]
fn corrupt_bytes_take_the_fallback_path() {
    let payload = ReadyPayload {
        bytes: b"not audio at all".to_vec(),
        mime: "audio/mpeg".to_string(),
        duration_seconds: 3.0,
        size_bytes: 16,
        suggested_name: "broken.mp3".to_string(),
    };
    match normalizer::normalize_or_fallback(&payload, TARGET_SAMPLE_RATE) {
        NormalizeOutcome::Fallback { bytes, mime, warning } => {
            assert_eq!(bytes, payload.bytes);
            assert_eq!(mime, "audio/mpeg");
            assert!(!warning.is_empty());
        }
        NormalizeOutcome::Canonical(_) => panic!("corrupt input must not produce canonical audio"),
    }
}

#[test]
fn upsampling_also_rounds_the_frame_count_up() {
    let native_rate = 8_000;
    let payload = wav_payload(&sine(200.0, 0.3, native_rate), 1, native_rate);
    let canonical = normalizer::normalize(&payload, TARGET_SAMPLE_RATE).unwrap();
    let source_frames = (0.3 * native_rate as f64) as usize;
    let expected =
        ((source_frames as f64) * TARGET_SAMPLE_RATE as f64 / native_rate as f64).ceil() as usize;
    assert_eq!(canonical.frame_count, expected);
}
