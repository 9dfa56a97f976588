use std::env;

use serde_json::Value;
use tracing::warn;

use crate::analysis::weights::ClassWeights;
use crate::types::{EMOTION_LABELS, TARGET_SAMPLE_RATE};

pub const ENV_BACKEND_URL: &str = "SER_BACKEND_URL";
pub const ENV_CLASS_WEIGHTS: &str = "SER_CLASS_WEIGHTS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SER_BACKEND_URL is not set; configure a backend or opt into demo mode with --demo")]
    MissingBackendUrl,
    #[error("{variable} is not valid: {reason}")]
    InvalidValue { variable: String, reason: String },
}

/// Where analysis requests go.
#[derive(Debug, Clone)]
pub enum BackendMode {
    Remote { url: String },
    /// Synthetic engine; entered only by explicit demo opt-in. A fixed seed
    /// pins the output; `vary` perturbs derived seeds with host entropy.
    Synthetic { seed: Option<u32>, vary: bool },
}

/// Form parameters forwarded with every analysis request.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    pub sampling_rate: u32,
    pub fft_size: usize,
    pub hop_length: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            sampling_rate: TARGET_SAMPLE_RATE,
            fft_size: 1024,
            hop_length: 320,
        }
    }
}

/// Immutable configuration snapshot, read once at startup and passed into
/// components at construction time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendMode,
    pub class_weights: ClassWeights,
    pub params: AnalysisParams,
}

impl AppConfig {
    /// Resolve configuration from the environment. A missing backend URL is
    /// a fatal error unless the caller explicitly opted into demo mode.
    pub fn from_env(demo: bool, seed: Option<u32>, vary: bool) -> Result<Self, ConfigError> {
        let backend = match env::var(ENV_BACKEND_URL) {
            Ok(url) if !url.trim().is_empty() => BackendMode::Remote { url },
            _ if demo || seed.is_some() => BackendMode::Synthetic { seed, vary },
            _ => return Err(ConfigError::MissingBackendUrl),
        };
        Ok(Self {
            backend,
            class_weights: class_weights_from_env()?,
            params: AnalysisParams::default(),
        })
    }
}

/// Weight overrides: a JSON map in SER_CLASS_WEIGHTS, then per-label
/// SER_<LABEL>_WEIGHT variables on top.
fn class_weights_from_env() -> Result<ClassWeights, ConfigError> {
    let mut weights = ClassWeights::default();
    if let Ok(raw) = env::var(ENV_CLASS_WEIGHTS) {
        let parsed: Value =
            serde_json::from_str(&raw).map_err(|err| ConfigError::InvalidValue {
                variable: ENV_CLASS_WEIGHTS.to_string(),
                reason: err.to_string(),
            })?;
        if let Some(map) = parsed.as_object() {
            for (label, value) in map {
                match value.as_f64() {
                    Some(number) => weights.set(label, number),
                    None => warn!(label = %label, "ignoring non-numeric class weight"),
                }
            }
        }
    }
    for label in EMOTION_LABELS {
        let variable = format!("SER_{}_WEIGHT", label.to_uppercase());
        if let Ok(raw) = env::var(&variable) {
            match raw.parse::<f64>() {
                Ok(number) => weights.set(label, number),
                Err(err) => {
                    warn!(variable = %variable, error = %err, "ignoring unparsable weight override")
                }
            }
        }
    }
    Ok(weights)
}
