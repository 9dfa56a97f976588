use std::io::Cursor;

use anyhow::{ensure, Context, Result};

use crate::types::CanonicalAudio;

/// Size of the RIFF/WAVE header preceding the PCM data chunk.
pub const WAV_HEADER_LEN: usize = 44;

/// Quantize a float sample (clamped to [-1, 1]) to signed 16-bit PCM.
///
/// Negative values use the full -32768 range, positive values top out at
/// 32767, so -1.0 and 1.0 both map onto representable extremes.
pub fn quantize_pcm16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32_768.0
    } else {
        clamped * 32_767.0
    };
    scaled.round() as i16
}

/// Inverse of [`quantize_pcm16`]; round-trips every i16 exactly.
pub fn dequantize_pcm16(sample: i16) -> f32 {
    if sample < 0 {
        sample as f32 / 32_768.0
    } else {
        sample as f32 / 32_767.0
    }
}

/// Encode interleaved float samples as a PCM16 WAV byte buffer.
pub fn encode_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    ensure!(channels > 0, "channel count must be positive");
    ensure!(sample_rate > 0, "sample rate must be positive");
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("failed to start WAV stream")?;
        for &sample in samples {
            writer
                .write_sample(quantize_pcm16(sample))
                .context("failed to write audio sample")?;
        }
        writer.finalize().context("failed to finalize WAV stream")?;
    }
    Ok(cursor.into_inner())
}

/// Encode a mono float signal as canonical audio at the given rate.
pub fn encode_canonical(samples: &[f32], sample_rate: u32) -> Result<CanonicalAudio> {
    let bytes = encode_wav(samples, 1, sample_rate)?;
    ensure!(
        bytes.len() == WAV_HEADER_LEN + samples.len() * 2,
        "canonical WAV length mismatch: {} bytes for {} frames",
        bytes.len(),
        samples.len()
    );
    Ok(CanonicalAudio {
        bytes,
        sample_rate,
        frame_count: samples.len(),
    })
}

/// Decode a PCM16 WAV buffer into planar per-channel float buffers.
///
/// Only integer 16-bit input is accepted here; other WAV flavors go through
/// the general decoder instead.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<Vec<f32>>, u32)> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).context("failed to parse WAV container")?;
    let spec = reader.spec();
    ensure!(
        spec.sample_format == hound::SampleFormat::Int && spec.bits_per_sample == 16,
        "not a PCM16 WAV stream"
    );
    ensure!(spec.channels > 0, "WAV stream has no channels");
    let channel_count = spec.channels as usize;
    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];
    for (index, sample) in reader.into_samples::<i16>().enumerate() {
        let sample = sample.context("failed to read WAV sample")?;
        channels[index % channel_count].push(dequantize_pcm16(sample));
    }
    Ok((channels, spec.sample_rate))
}
