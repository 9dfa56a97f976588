use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::analysis::mapper;
use crate::analysis::weights::{self, ClassWeights};
use crate::audio::normalizer::NormalizeOutcome;
use crate::config::AnalysisParams;
use crate::types::{AnalysisResult, ReadyPayload};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },
    #[error("backend response was not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("failed to reach backend: {0}")]
    Transport(String),
}

/// Audio plus form metadata submitted for one analysis request.
#[derive(Debug, Clone)]
pub struct Submission {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
    pub duration_seconds: f64,
}

impl Submission {
    /// Canonical WAV when normalization succeeded, the original bytes plus
    /// the surfaced warning otherwise.
    pub fn from_outcome(
        payload: &ReadyPayload,
        outcome: NormalizeOutcome,
    ) -> (Self, Option<String>) {
        match outcome {
            NormalizeOutcome::Canonical(canonical) => {
                let duration_seconds = canonical.duration_seconds();
                let submission = Self {
                    bytes: canonical.bytes,
                    mime: "audio/wav".to_string(),
                    file_name: wav_name(&payload.suggested_name),
                    duration_seconds,
                };
                (submission, None)
            }
            NormalizeOutcome::Fallback {
                bytes,
                mime,
                warning,
            } => {
                let submission = Self {
                    bytes,
                    mime,
                    file_name: payload.suggested_name.clone(),
                    duration_seconds: payload.duration_seconds,
                };
                (submission, Some(warning))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Blocking client for the analyze backend.
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// POST the audio as a multipart form and map the response onto the
    /// canonical schema, applying label mapping and class-weight reweighting.
    pub fn analyze(
        &self,
        submission: &Submission,
        params: &AnalysisParams,
        class_weights: &ClassWeights,
    ) -> Result<AnalysisResult, AnalysisError> {
        let part = multipart::Part::bytes(submission.bytes.clone())
            .file_name(submission.file_name.clone())
            .mime_str(&submission.mime)
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        let form = multipart::Form::new()
            .part("audio", part)
            .text("duration", format_duration(submission.duration_seconds))
            .text("sampling_rate", params.sampling_rate.to_string())
            .text("fft_size", params.fft_size.to_string())
            .text("hop_length", params.hop_length.to_string());

        debug!(
            url = %self.base_url,
            bytes = submission.bytes.len(),
            mime = %submission.mime,
            "submitting analysis request"
        );
        let response = self
            .http
            .post(&self.base_url)
            .multipart(form)
            .send()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                detail: upstream_detail(&body),
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|err| AnalysisError::MalformedResponse(err.to_string()))?;
        let (mut result, _meta) = mapper::map_response(&value);
        weights::apply_contract(&mut result, class_weights);
        info!(emotion = %result.emotion.label, "backend analysis mapped");
        Ok(result)
    }

    /// GET the service root and parse the `{ ok }` health document.
    pub fn health(&self) -> Result<HealthStatus, AnalysisError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        url.set_path("/");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                detail: upstream_detail(&body),
            });
        }
        serde_json::from_str(&body).map_err(|err| AnalysisError::MalformedResponse(err.to_string()))
    }
}

/// Upstream error text, verbatim when present.
fn upstream_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("detail"))
                .and_then(|detail| detail.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "backend error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

fn format_duration(seconds: f64) -> String {
    if seconds.is_finite() && seconds >= 0.0 {
        format!("{seconds}")
    } else {
        "0".to_string()
    }
}

fn wav_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.wav"),
        _ => format!("{name}.wav"),
    }
}
