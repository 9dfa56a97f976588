use tracing::{debug, warn};

use crate::audio::decoder::{self, DecodedAudio};
use crate::audio::{encoder, resample};
use crate::types::{CanonicalAudio, ReadyPayload};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("failed to decode source audio: {0}")]
    Decode(String),
    #[error("failed to resample source audio: {0}")]
    Resample(String),
    #[error("failed to serialize canonical audio: {0}")]
    Encode(String),
}

/// Outcome of normalization: canonical bytes, or the original payload bytes
/// when decoding failed and the caller should transmit them as-is.
#[derive(Debug, Clone)]
pub enum NormalizeOutcome {
    Canonical(CanonicalAudio),
    Fallback {
        bytes: Vec<u8>,
        mime: String,
        warning: String,
    },
}

/// Convert any captured or uploaded audio into the canonical mono PCM16 WAV
/// representation at `target_rate`.
pub fn normalize(payload: &ReadyPayload, target_rate: u32) -> Result<CanonicalAudio, NormalizeError> {
    let decoded = decode_any(&payload.bytes, &payload.mime)
        .map_err(|err| NormalizeError::Decode(err.to_string()))?;
    debug!(
        channels = decoded.channels.len(),
        native_rate = decoded.sample_rate,
        frames = decoded.frame_count(),
        "decoded analysis input"
    );
    let mono = mix_to_mono(&decoded.channels);
    let resampled = resample::sinc_resample(&mono, decoded.sample_rate, target_rate)
        .map_err(|err| NormalizeError::Resample(err.to_string()))?;
    encoder::encode_canonical(&resampled, target_rate)
        .map_err(|err| NormalizeError::Encode(err.to_string()))
}

/// Normalize with the explicit fallback policy: a decode or resample failure
/// never aborts the calling flow; the original bytes travel instead and the
/// warning is surfaced to the user.
pub fn normalize_or_fallback(payload: &ReadyPayload, target_rate: u32) -> NormalizeOutcome {
    match normalize(payload, target_rate) {
        Ok(canonical) => NormalizeOutcome::Canonical(canonical),
        Err(err) => {
            let warning = format!(
                "audio normalization failed ({err}); submitting the original {} bytes unchanged",
                payload.mime
            );
            warn!(mime = %payload.mime, error = %err, "falling back to unnormalized audio");
            NormalizeOutcome::Fallback {
                bytes: payload.bytes.clone(),
                mime: payload.mime.clone(),
                warning,
            }
        }
    }
}

/// Mix planar channels down to mono by unweighted averaging of every channel
/// per frame index.
pub fn mix_to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.is_empty() {
        return Vec::new();
    }
    if channels.len() == 1 {
        return channels[0].clone();
    }
    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
    let count = channels.len() as f32;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let sum: f32 = channels
            .iter()
            .map(|channel| channel.get(frame).copied().unwrap_or(0.0))
            .sum();
        mono.push(sum / count);
    }
    mono
}

fn decode_any(bytes: &[u8], mime: &str) -> anyhow::Result<DecodedAudio> {
    // PCM16 WAV takes the hound fast path so canonical input round-trips
    // byte-identically; everything else goes through symphonia.
    if let Ok((channels, sample_rate)) = encoder::decode_wav(bytes) {
        return Ok(DecodedAudio {
            channels,
            sample_rate,
        });
    }
    decoder::decode_bytes(bytes, mime)
}
