use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{Distribution, Emotion, AnalysisResult, EMOTION_LABELS};

/// Per-label multiplicative weights; every label defaults to 1.0.
#[derive(Debug, Clone)]
pub struct ClassWeights(BTreeMap<String, f64>);

impl Default for ClassWeights {
    fn default() -> Self {
        Self(
            EMOTION_LABELS
                .iter()
                .map(|label| (label.to_string(), 1.0))
                .collect(),
        )
    }
}

impl ClassWeights {
    pub fn set(&mut self, label: &str, weight: f64) {
        if weight.is_finite() {
            self.0.insert(label.to_string(), weight);
        }
    }

    pub fn weight(&self, label: &str) -> f64 {
        self.0.get(label).copied().unwrap_or(1.0)
    }
}

/// Map an upstream model code onto the canonical vocabulary. Unknown codes
/// pass through unchanged but are flagged as a data-quality issue.
pub fn canonical_label(code: &str) -> String {
    match code {
        "ANG" => "angry".to_string(),
        "DIS" => "disgust".to_string(),
        "FEA" => "fear".to_string(),
        "HAP" => "happy".to_string(),
        "NEU" => "neutral".to_string(),
        "SAD" => "sad".to_string(),
        "SUR" => "surprise".to_string(),
        other => {
            if !EMOTION_LABELS.contains(&other) {
                warn!(code = other, "unknown emotion code passed through");
            }
            other.to_string()
        }
    }
}

/// Apply [`canonical_label`] to every key of a distribution.
pub fn map_labels(dist: Distribution) -> Distribution {
    dist.into_iter()
        .map(|(code, value)| (canonical_label(&code), value))
        .collect()
}

/// Divide every weight by the vector sum and round to 3 decimals. The
/// rounding residual is folded into the top entry so the values always sum
/// to 1 within 1e-3; negatives are clamped to zero first.
pub fn normalize(dist: Distribution) -> Distribution {
    let clamped: Distribution = dist
        .into_iter()
        .map(|(label, value)| (label, value.max(0.0)))
        .collect();
    let sum: f64 = clamped.values().sum();
    let denominator = if sum > 0.0 { sum } else { 1.0 };
    let mut normalized: Distribution = clamped
        .iter()
        .map(|(label, value)| (label.clone(), round_to(value / denominator, 3)))
        .collect();
    fold_residual(&mut normalized);
    normalized
}

/// Multiply each label by its weight, renormalize to sum 1 (6 decimals), and
/// recompute the arg-max. Applies to synthetic and real responses alike.
pub fn reweight(dist: &Distribution, weights: &ClassWeights) -> (Distribution, String, f64) {
    let weighted: Distribution = dist
        .iter()
        .map(|(label, value)| (label.clone(), value.max(0.0) * weights.weight(label)))
        .collect();
    let sum: f64 = weighted.values().sum();
    let denominator = if sum > 0.0 { sum } else { 1.0 };
    let normalized: Distribution = weighted
        .iter()
        .map(|(label, value)| (label.clone(), round_to(value / denominator, 6)))
        .collect();
    let (label, confidence) = top_of(&normalized);
    (normalized, label, confidence)
}

/// Arg-max with ties broken by first-seen order over the fixed label list;
/// labels outside the vocabulary come after it.
pub fn top_of(dist: &Distribution) -> (String, f64) {
    let mut best: Option<(String, f64)> = None;
    for label in ordered_labels(dist) {
        let value = dist.get(&label).copied().unwrap_or(0.0);
        match &best {
            Some((_, current)) if value <= *current => {}
            _ => best = Some((label, value)),
        }
    }
    best.unwrap_or_else(|| ("neutral".to_string(), 0.0))
}

/// Enforce the full response contract on a mapped result: canonical labels,
/// class-weight reweighting, and a confidence recomputed from the final
/// distribution (never taken verbatim from upstream when one is present).
pub fn apply_contract(result: &mut AnalysisResult, weights: &ClassWeights) {
    result.distribution = map_labels(std::mem::take(&mut result.distribution));
    result.emotion.label = canonical_label(&result.emotion.label);
    if result.distribution.is_empty() {
        return;
    }
    let (distribution, label, confidence) = reweight(&result.distribution, weights);
    result.distribution = distribution;
    result.emotion = Emotion { label, confidence };
}

fn ordered_labels(dist: &Distribution) -> Vec<String> {
    let mut ordered: Vec<String> = EMOTION_LABELS
        .iter()
        .filter(|label| dist.contains_key(**label))
        .map(|label| label.to_string())
        .collect();
    for key in dist.keys() {
        if !EMOTION_LABELS.contains(&key.as_str()) {
            ordered.push(key.clone());
        }
    }
    ordered
}

fn fold_residual(dist: &mut Distribution) {
    let sum: f64 = dist.values().sum();
    let residual = 1.0 - sum;
    if residual.abs() < f64::EPSILON {
        return;
    }
    let (top, _) = top_of(dist);
    if let Some(value) = dist.get_mut(&top) {
        *value = round_to(*value + residual, 3);
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
