use tonalyzer::analysis::engine::{seed_for_payload, SyntheticEngine};
use tonalyzer::analysis::weights;
use tonalyzer::types::{ReadyPayload, EMOTION_LABELS};

fn payload(size: u64, mime: &str, duration: f64) -> ReadyPayload {
    ReadyPayload {
        bytes: Vec::new(),
        mime: mime.to_string(),
        duration_seconds: duration,
        size_bytes: size,
        suggested_name: "clip".to_string(),
    }
}

#[test]
fn identical_seeds_reproduce_identical_results() {
    for seed in [1u32, 42, 77_777, u32::MAX] {
        let first = SyntheticEngine::new(seed).analyze(6.0);
        let second = SyntheticEngine::new(seed).analyze(6.0);
        assert_eq!(first, second, "seed {seed} diverged");
    }
}

#[test]
fn distributions_normalize_across_many_seeds() {
    for seed in 0..200u32 {
        let result = SyntheticEngine::new(seed).analyze(4.0);
        let sum: f64 = result.distribution.values().sum();
        assert!((sum - 1.0).abs() <= 1e-3, "seed {seed}: sum {sum}");
        assert!(result.distribution.values().all(|&v| v >= 0.0));
        assert_eq!(result.distribution.len(), EMOTION_LABELS.len());
        for label in EMOTION_LABELS {
            assert!(result.distribution.contains_key(label));
        }
    }
}

#[test]
fn emotion_is_the_distribution_arg_max() {
    for seed in [3u32, 19, 4_242] {
        let result = SyntheticEngine::new(seed).analyze(5.0);
        let (label, confidence) = weights::top_of(&result.distribution);
        assert_eq!(result.emotion.label, label);
        assert_eq!(result.emotion.confidence, confidence);
    }
}

#[test]
fn prosody_stays_inside_its_documented_bounds() {
    for seed in 0..100u32 {
        let prosody = SyntheticEngine::new(seed).analyze(4.0).prosody;
        assert!((100.0..=220.0).contains(&prosody.pitch_hz), "seed {seed}");
        assert!((0.02..=0.05).contains(&prosody.energy_rms), "seed {seed}");
        assert!((120.0..=270.0).contains(&prosody.wpm), "seed {seed}");
    }
}

#[test]
fn series_are_evenly_spaced_and_cover_the_duration() {
    let result = SyntheticEngine::new(55).analyze(8.0);
    for series in [&result.pitch_series, &result.energy_series] {
        assert_eq!(series.len(), 160);
        assert_eq!(series[0].t, 0.0);
        assert!((series.last().unwrap().t - 8.0).abs() < 1e-9);
        for (index, point) in series.iter().enumerate() {
            let expected = (index as f64 / 159.0 * 8.0 * 100.0).round() / 100.0;
            assert!(
                (point.t - expected).abs() < 1e-9,
                "point {index}: {} vs {expected}",
                point.t
            );
        }
    }
}

#[test]
fn series_values_are_rounded_to_their_decimal_contract() {
    let result = SyntheticEngine::new(21).analyze(3.0);
    for point in &result.pitch_series {
        let scaled = point.v * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6, "pitch {}", point.v);
    }
    for point in &result.energy_series {
        let scaled = point.v * 1000.0;
        assert!((scaled - scaled.round()).abs() < 1e-6, "energy {}", point.v);
    }
}

#[test]
fn advice_follows_the_top_emotion() {
    let result = SyntheticEngine::new(13).analyze(4.0);
    assert_eq!(result.advice.len(), 3);
}

#[test]
fn payload_seed_derivation_combines_the_documented_inputs() {
    let p = payload(2_048, "audio/webm", 3.9);
    let expected = 2_048u32 + "audio/webm".len() as u32 + (3.9f64 * 17.0).floor() as u32;
    assert_eq!(seed_for_payload(&p, false), expected);
    // Deterministic: repeated derivation is stable.
    assert_eq!(seed_for_payload(&p, false), seed_for_payload(&p, false));
}

#[test]
fn varied_seeds_differ_between_calls() {
    let p = payload(1_000, "audio/wav", 2.0);
    let a = seed_for_payload(&p, true);
    let b = seed_for_payload(&p, true);
    let c = seed_for_payload(&p, true);
    // Three identical draws from a 32-bit space would be astronomically
    // unlikely; accept any pair differing.
    assert!(a != b || b != c, "perturbed seeds never changed");
}
