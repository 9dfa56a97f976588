use std::fs;
use std::path::Path;

use tracing::debug;

use crate::audio::{decoder, encoder, normalizer};
use crate::types::ReadyPayload;

/// Upload size ceiling; larger files never reach the normalizer.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("unsupported audio type '{0}'")]
    UnsupportedType(String),
    #[error("file is {actual} bytes; the limit is {limit}")]
    FileTooLarge { actual: u64, limit: u64 },
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject declared types outside the allow-list and files over the size cap.
pub fn validate(mime: &str, size_bytes: u64) -> Result<(), IntakeError> {
    if !is_allowed_mime(mime) {
        return Err(IntakeError::UnsupportedType(mime.to_string()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(IntakeError::FileTooLarge {
            actual: size_bytes,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Validate a user-selected file and wrap it as a payload, bypassing capture
/// entirely.
pub fn payload_from_file(path: &Path) -> Result<ReadyPayload, IntakeError> {
    let mime = mime_for_path(path)
        .ok_or_else(|| IntakeError::UnsupportedType(describe_extension(path)))?;
    let size_bytes = fs::metadata(path)?.len();
    validate(mime, size_bytes)?;
    let bytes = fs::read(path)?;
    let duration_seconds = probe_duration(&bytes, mime).unwrap_or(0.0);
    let suggested_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.audio".to_string());
    debug!(
        name = %suggested_name,
        mime,
        size_bytes,
        duration_seconds,
        "accepted uploaded file"
    );
    Ok(ReadyPayload {
        bytes,
        mime: mime.to_string(),
        duration_seconds,
        size_bytes,
        suggested_name,
    })
}

fn is_allowed_mime(mime: &str) -> bool {
    matches!(
        mime.split(';').next().unwrap_or("").trim(),
        "audio/wav"
            | "audio/x-wav"
            | "audio/mpeg"
            | "audio/ogg"
            | "audio/webm"
            | "audio/mp4"
            | "audio/x-m4a"
    )
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" | "mpeg" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        "mp4" | "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

fn describe_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| "without extension".to_string())
}

/// Duration from a metadata-level decode; 0.0 when probing fails.
fn probe_duration(bytes: &[u8], mime: &str) -> Option<f64> {
    if let Ok((channels, sample_rate)) = encoder::decode_wav(bytes) {
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        return Some(frames as f64 / sample_rate as f64);
    }
    let decoded = decoder::decode_bytes(bytes, mime).ok()?;
    let mono = normalizer::mix_to_mono(&decoded.channels);
    Some(mono.len() as f64 / decoded.sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_wav_is_rejected_before_decoding() {
        let result = validate("audio/wav", 25 * 1024 * 1024);
        assert!(matches!(result, Err(IntakeError::FileTooLarge { .. })));
    }

    #[test]
    fn text_files_are_rejected() {
        let result = validate("text/plain", 1024);
        assert!(matches!(result, Err(IntakeError::UnsupportedType(_))));
    }

    #[test]
    fn allow_list_accepts_every_supported_container() {
        for mime in [
            "audio/wav",
            "audio/mpeg",
            "audio/ogg",
            "audio/webm",
            "audio/mp4",
        ] {
            assert!(validate(mime, 1024).is_ok(), "{mime} should pass");
        }
    }

    #[test]
    fn codec_parameters_in_mime_are_ignored() {
        assert!(validate("audio/ogg;codecs=opus", 10).is_ok());
    }

    #[test]
    fn extension_mapping_skips_unknown_types() {
        assert_eq!(mime_for_path(Path::new("note.txt")), None);
        assert_eq!(mime_for_path(Path::new("clip.WAV")), Some("audio/wav"));
        assert_eq!(mime_for_path(Path::new("talk.m4a")), Some("audio/mp4"));
    }
}
