//! Core types for the tonalyzer analysis pipeline

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sample rate all analysis inputs converge on.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Fixed emotion vocabulary, in canonical order.
pub const EMOTION_LABELS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "neutral", "sad", "surprise",
];

/// Per-label weights over the emotion vocabulary. Extra labels from
/// forward-compatible upstreams are carried as-is.
pub type Distribution = BTreeMap<String, f64>;

/// Audio ready for analysis, produced exactly once per capture or upload.
/// Ownership moves to whoever starts the analysis.
#[derive(Debug, Clone)]
pub struct ReadyPayload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub suggested_name: String,
}

/// Canonical mono/16 kHz/PCM16 WAV buffer.
///
/// Invariant: `bytes.len() == 44 + frame_count * 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub frame_count: usize,
}

impl CanonicalAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }
}

/// Top emotion of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Emotion {
    pub label: String,
    pub confidence: f64,
}

/// Summary prosody metrics; all values are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ProsodySummary {
    #[serde(rename = "pitchHz")]
    pub pitch_hz: f64,
    #[serde(rename = "energyRms")]
    pub energy_rms: f64,
    pub wpm: f64,
}

/// One sample of a time series; `t` is seconds and non-decreasing across a
/// series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SeriesPoint {
    pub t: f64,
    pub v: f64,
}

/// Canonical analysis output. Immutable once built; `emotion` must equal the
/// arg-max of `distribution` whenever the distribution is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    pub emotion: Emotion,
    pub distribution: Distribution,
    pub prosody: ProsodySummary,
    #[serde(rename = "pitchSeries")]
    pub pitch_series: Vec<SeriesPoint>,
    #[serde(rename = "energySeries")]
    pub energy_series: Vec<SeriesPoint>,
    pub advice: Vec<String>,
}

/// Response envelope mirroring the analyze endpoint schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_labels_are_sorted_and_unique() {
        let mut sorted = EMOTION_LABELS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, EMOTION_LABELS.to_vec());
    }

    #[test]
    fn canonical_audio_duration_follows_frame_count() {
        let audio = CanonicalAudio {
            bytes: vec![0; 44 + 16_000 * 2],
            sample_rate: TARGET_SAMPLE_RATE,
            frame_count: 16_000,
        };
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-12);
    }
}
