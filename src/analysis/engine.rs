use std::f64::consts::PI;

use crate::analysis::advice;
use crate::analysis::weights;
use crate::types::{
    AnalysisResult, Distribution, Emotion, ProsodySummary, ReadyPayload, SeriesPoint,
    EMOTION_LABELS,
};

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;
const SERIES_POINTS: usize = 160;

/// Replacement when a derived seed collapses to zero.
const FALLBACK_SEED: u32 = 0x9E37_79B9;

/// Deterministic linear-congruential generator driving every synthetic
/// choice; the same seed reproduces the same stream.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { FALLBACK_SEED } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Uniform value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }
}

/// Derive the engine seed from payload characteristics. When `vary` is set
/// the seed is perturbed with host entropy so repeated demo runs differ.
pub fn seed_for_payload(payload: &ReadyPayload, vary: bool) -> u32 {
    let mut seed = (payload.size_bytes as u32)
        .wrapping_add(payload.mime.len() as u32)
        .wrapping_add((payload.duration_seconds.max(0.0) * 17.0).floor() as u32);
    if vary {
        seed = seed.wrapping_add(rand::random::<u32>());
    }
    seed
}

/// Stand-in for a real model: produces a plausible, fully deterministic
/// result from an integer seed.
pub struct SyntheticEngine {
    seed: u32,
}

enum SeriesKind {
    Pitch,
    Energy,
}

impl SyntheticEngine {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn analyze(&self, duration_seconds: f64) -> AnalysisResult {
        let distribution = self.distribution();
        let (label, confidence) = weights::top_of(&distribution);
        let duration = duration_seconds.max(1.0);
        let advice = advice::for_label(&label)
            .iter()
            .map(|line| line.to_string())
            .collect();
        AnalysisResult {
            emotion: Emotion { label, confidence },
            distribution,
            prosody: self.prosody(),
            pitch_series: self.series(duration, SeriesKind::Pitch),
            energy_series: self.series(duration, SeriesKind::Energy),
            advice,
        }
    }

    fn distribution(&self) -> Distribution {
        let mut rng = Lcg::new(self.seed);
        let raw: Distribution = EMOTION_LABELS
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let weight = 0.3 + 0.1 * (index + 1) as f64 + rng.next_f64() * 0.7;
                (label.to_string(), weight)
            })
            .collect();
        weights::normalize(raw)
    }

    fn prosody(&self) -> ProsodySummary {
        let mut rng = Lcg::new(self.seed.wrapping_add(1));
        ProsodySummary {
            pitch_hz: round_to(100.0 + rng.next_f64() * 120.0, 1),
            energy_rms: round_to(0.02 + rng.next_f64() * 0.03, 3),
            wpm: (120.0 + rng.next_f64() * 150.0).round(),
        }
    }

    fn series(&self, duration: f64, kind: SeriesKind) -> Vec<SeriesPoint> {
        let seed = self.seed as f64;
        let omega = 2.0 * PI * ((self.seed % 5) + 1) as f64 / duration;
        (0..SERIES_POINTS)
            .map(|index| {
                let t = round_to(
                    index as f64 / (SERIES_POINTS - 1) as f64 * duration,
                    2,
                );
                let noise = ((index as f64 * 1.7 + seed).sin()
                    + (index as f64 * 0.37 + seed).cos())
                    * 0.5;
                let v = match kind {
                    SeriesKind::Pitch => round_to(
                        150.0 + 40.0 * (omega * t + seed * 0.01).sin() + 10.0 * noise,
                        2,
                    ),
                    SeriesKind::Energy => round_to(
                        0.05 + 0.03 * (1.0 + (omega * 0.6 * t + seed * 0.02).sin())
                            + 0.01 * noise.abs(),
                        3,
                    ),
                };
                SeriesPoint { t, v }
            })
            .collect()
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(size: u64, mime: &str, duration: f64) -> ReadyPayload {
        ReadyPayload {
            bytes: Vec::new(),
            mime: mime.to_string(),
            duration_seconds: duration,
            size_bytes: size,
            suggested_name: "seed.wav".to_string(),
        }
    }

    #[test]
    fn lcg_is_reproducible_and_bounded() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..64 {
            let value = a.next_f64();
            assert_eq!(value, b.next_f64());
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn zero_seed_is_replaced() {
        let mut zero = Lcg::new(0);
        let mut fallback = Lcg::new(FALLBACK_SEED);
        assert_eq!(zero.next_f64(), fallback.next_f64());
    }

    #[test]
    fn derived_seed_is_stable_without_vary() {
        let p = payload(1024, "audio/wav", 2.5);
        assert_eq!(seed_for_payload(&p, false), seed_for_payload(&p, false));
        assert_eq!(
            seed_for_payload(&p, false),
            1024 + "audio/wav".len() as u32 + (2.5f64 * 17.0).floor() as u32
        );
    }

    #[test]
    fn same_seed_produces_identical_results() {
        let first = SyntheticEngine::new(7).analyze(6.0);
        let second = SyntheticEngine::new(7).analyze(6.0);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let first = SyntheticEngine::new(7).analyze(6.0);
        let second = SyntheticEngine::new(8).analyze(6.0);
        assert_ne!(first.distribution, second.distribution);
    }

    #[test]
    fn prosody_stays_within_realistic_ranges() {
        for seed in [1u32, 17, 9_999, u32::MAX] {
            let prosody = SyntheticEngine::new(seed).analyze(4.0).prosody;
            assert!((100.0..=220.0).contains(&prosody.pitch_hz), "{prosody:?}");
            assert!((0.02..=0.05).contains(&prosody.energy_rms), "{prosody:?}");
            assert!((120.0..=270.0).contains(&prosody.wpm), "{prosody:?}");
        }
    }

    #[test]
    fn series_spans_the_duration_with_monotonic_time() {
        let result = SyntheticEngine::new(11).analyze(6.0);
        for series in [&result.pitch_series, &result.energy_series] {
            assert_eq!(series.len(), SERIES_POINTS);
            assert_eq!(series[0].t, 0.0);
            assert!((series[series.len() - 1].t - 6.0).abs() < 1e-9);
            for pair in series.windows(2) {
                assert!(pair[1].t >= pair[0].t);
            }
        }
    }

    #[test]
    fn short_clips_stretch_to_a_one_second_floor() {
        let result = SyntheticEngine::new(3).analyze(0.2);
        assert!((result.pitch_series.last().unwrap().t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn emotion_matches_distribution_arg_max() {
        let result = SyntheticEngine::new(23).analyze(3.0);
        let (label, confidence) = weights::top_of(&result.distribution);
        assert_eq!(result.emotion.label, label);
        assert_eq!(result.emotion.confidence, confidence);
    }
}
