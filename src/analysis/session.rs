use std::sync::mpsc::{channel, Receiver};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::analysis::client::{AnalysisError, BackendClient, Submission};
use crate::analysis::engine::{seed_for_payload, SyntheticEngine};
use crate::analysis::weights;
use crate::config::{AppConfig, BackendMode};
use crate::audio::normalizer;
use crate::types::{AnalysisResult, ReadyPayload};

/// Final state of one analysis request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    pub result: Option<AnalysisResult>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

/// One in-flight analysis running on a worker thread. The UI keeps at most
/// one job outstanding and polls for its snapshot; abandoning the job simply
/// drops the handle.
pub struct AnalysisJob {
    updates: Receiver<AnalysisSnapshot>,
    _join: Option<JoinHandle<()>>,
}

impl AnalysisJob {
    pub fn spawn(config: AppConfig, payload: ReadyPayload) -> Self {
        let (tx, rx) = channel();
        let join = thread::Builder::new()
            .name("analysis-worker".to_string())
            .spawn(move || {
                let snapshot = run_analysis(&config, &payload);
                let _ = tx.send(snapshot);
            })
            .ok();
        Self {
            updates: rx,
            _join: join,
        }
    }

    /// Snapshot when the worker has finished, None while still running.
    pub fn try_recv(&self) -> Option<AnalysisSnapshot> {
        self.updates.try_recv().ok()
    }
}

/// Normalize the payload, run it through the configured backend (or the
/// synthetic engine), and apply the response contract. Never panics; every
/// failure lands in the snapshot.
pub fn run_analysis(config: &AppConfig, payload: &ReadyPayload) -> AnalysisSnapshot {
    let outcome = normalizer::normalize_or_fallback(payload, config.params.sampling_rate);
    let (submission, warning) = Submission::from_outcome(payload, outcome);

    let produced: Result<AnalysisResult, AnalysisError> = match &config.backend {
        BackendMode::Remote { url } => BackendClient::new(url)
            .and_then(|client| client.analyze(&submission, &config.params, &config.class_weights)),
        BackendMode::Synthetic { seed, vary } => {
            let seed = seed.unwrap_or_else(|| seed_for_payload(payload, *vary));
            info!(seed, "running synthetic analysis");
            let mut result = SyntheticEngine::new(seed).analyze(submission.duration_seconds);
            weights::apply_contract(&mut result, &config.class_weights);
            Ok(result)
        }
    };

    match produced {
        Ok(result) => AnalysisSnapshot {
            result: Some(result),
            warning,
            error: None,
        },
        Err(err) => {
            error!(error = %err, "analysis failed");
            AnalysisSnapshot {
                result: None,
                warning,
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder;
    use crate::config::AnalysisParams;
    use crate::analysis::weights::ClassWeights;

    fn demo_config(seed: Option<u32>) -> AppConfig {
        AppConfig {
            backend: BackendMode::Synthetic { seed, vary: false },
            class_weights: ClassWeights::default(),
            params: AnalysisParams::default(),
        }
    }

    fn wav_payload() -> ReadyPayload {
        let samples: Vec<f32> = (0..16_000).map(|i| ((i as f32) * 0.01).sin()).collect();
        let bytes = encoder::encode_wav(&samples, 1, 16_000).unwrap();
        ReadyPayload {
            size_bytes: bytes.len() as u64,
            bytes,
            mime: "audio/wav".to_string(),
            duration_seconds: 1.0,
            suggested_name: "tone.wav".to_string(),
        }
    }

    #[test]
    fn synthetic_run_produces_a_full_result() {
        let snapshot = run_analysis(&demo_config(Some(5)), &wav_payload());
        assert!(snapshot.error.is_none());
        assert!(snapshot.warning.is_none());
        let result = snapshot.result.expect("result present");
        assert_eq!(result.distribution.len(), 7);
        assert_eq!(result.pitch_series.len(), 160);
        assert!(!result.advice.is_empty());
    }

    #[test]
    fn synthetic_runs_with_a_pinned_seed_are_reproducible() {
        let payload = wav_payload();
        let config = demo_config(Some(99));
        let first = run_analysis(&config, &payload).result.unwrap();
        let second = run_analysis(&config, &payload).result.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_audio_still_produces_a_result_with_a_warning() {
        let payload = ReadyPayload {
            bytes: vec![9, 9, 9, 9],
            mime: "audio/webm".to_string(),
            duration_seconds: 2.0,
            size_bytes: 4,
            suggested_name: "broken.webm".to_string(),
        };
        let snapshot = run_analysis(&demo_config(Some(1)), &payload);
        assert!(snapshot.warning.is_some(), "fallback must be surfaced");
        assert!(snapshot.result.is_some(), "synthetic engine still runs");
    }

    #[test]
    fn job_delivers_its_snapshot_over_the_channel() {
        let job = AnalysisJob::spawn(demo_config(Some(2)), wav_payload());
        let mut snapshot = None;
        for _ in 0..200 {
            if let Some(next) = job.try_recv() {
                snapshot = Some(next);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(snapshot.and_then(|s| s.result).is_some());
    }
}
