//! Normalizes heterogeneous backend response shapes into the canonical
//! result schema. Each canonical field resolves through a fixed priority
//! list of historical field names; the first non-null value wins.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::types::{AnalysisResult, Distribution, Emotion, ProsodySummary, SeriesPoint};

/// One point in either of the historical series encodings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Pair([f64; 2]),
    Object { t: f64, v: f64 },
}

impl RawPoint {
    fn into_point(self) -> SeriesPoint {
        match self {
            RawPoint::Pair([t, v]) => SeriesPoint { t, v },
            RawPoint::Object { t, v } => SeriesPoint { t, v },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProsody {
    #[serde(rename = "pitchHz")]
    pitch_hz: Option<f64>,
    f0_mean: Option<f64>,
    pitch: Option<f64>,
    #[serde(rename = "energyRms")]
    energy_rms: Option<f64>,
    rms_mean: Option<f64>,
    energy: Option<f64>,
    wpm: Option<f64>,
    speech_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEmotion {
    label: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCharts {
    pitch: Option<Vec<RawPoint>>,
    energy: Option<Vec<RawPoint>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResult {
    emotion: Option<RawEmotion>,
    #[serde(rename = "primaryEmotion")]
    primary_emotion: Option<String>,
    #[serde(rename = "primaryConfidence")]
    primary_confidence: Option<f64>,
    distribution: Option<Distribution>,
    probabilities: Option<Distribution>,
    prosody: Option<RawProsody>,
    #[serde(rename = "pitchSeries")]
    pitch_series: Option<Vec<RawPoint>>,
    #[serde(rename = "energySeries")]
    energy_series: Option<Vec<RawPoint>>,
    charts: Option<RawCharts>,
    advice: Option<Vec<String>>,
}

/// Map an upstream JSON document onto the canonical result. A `result`
/// envelope is preferred; responses carrying the fields at the top level are
/// accepted too. Missing or malformed shapes degrade to safe defaults.
pub fn map_response(value: &Value) -> (AnalysisResult, Option<Value>) {
    let meta = value.get("meta").cloned();
    let raw = match value.get("result") {
        Some(result) => parse_raw(result),
        None => parse_raw(value),
    };
    (canonicalize(raw), meta)
}

fn parse_raw(value: &Value) -> RawResult {
    match serde_json::from_value::<RawResult>(value.clone()) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "upstream result shape not recognized; using defaults");
            RawResult::default()
        }
    }
}

fn canonicalize(raw: RawResult) -> AnalysisResult {
    let prosody_raw = raw.prosody.unwrap_or_default();
    let prosody = ProsodySummary {
        pitch_hz: first_of(&[prosody_raw.pitch_hz, prosody_raw.f0_mean, prosody_raw.pitch]),
        energy_rms: first_of(&[
            prosody_raw.energy_rms,
            prosody_raw.rms_mean,
            prosody_raw.energy,
        ]),
        wpm: first_of(&[prosody_raw.wpm, prosody_raw.speech_rate]),
    };

    let distribution = raw.distribution.or(raw.probabilities).unwrap_or_default();
    let charts = raw.charts.unwrap_or_default();
    let pitch_series = series_from(raw.pitch_series.or(charts.pitch));
    let energy_series = series_from(raw.energy_series.or(charts.energy));

    let emotion_raw = raw.emotion.unwrap_or_default();
    let label = emotion_raw
        .label
        .or(raw.primary_emotion)
        .unwrap_or_else(|| "neutral".to_string());
    let confidence = emotion_raw
        .confidence
        .or(raw.primary_confidence)
        .unwrap_or(0.0);

    AnalysisResult {
        emotion: Emotion { label, confidence },
        distribution,
        prosody,
        pitch_series,
        energy_series,
        advice: raw.advice.unwrap_or_default(),
    }
}

fn first_of(candidates: &[Option<f64>]) -> f64 {
    candidates.iter().copied().flatten().next().unwrap_or(0.0)
}

fn series_from(points: Option<Vec<RawPoint>>) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = points
        .unwrap_or_default()
        .into_iter()
        .map(RawPoint::into_point)
        .collect();
    series.sort_by(|a, b| a.t.total_cmp(&b.t));
    series
}
