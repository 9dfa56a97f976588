use anyhow::{ensure, Result};
use dasp::interpolate::sinc::Sinc;
use dasp::signal::{self, Signal};
use dasp::ring_buffer;

/// Resample `samples` from `source_rate` to `target_rate` with band-limited
/// sinc interpolation. Output length is `ceil(len * target / source)`; a
/// matching source and target rate returns the input untouched.
pub fn sinc_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let source = signal::from_iter(samples.iter().map(|&sample| [sample]));
    let sinc = Sinc::new(ring_buffer::Fixed::from([[0.0f32]; 32]));
    let mut converter = source.from_hz_to_hz(sinc, source_rate as f64, target_rate as f64);
    let mut output = Vec::with_capacity(output_len);
    for _ in 0..output_len {
        output.push(converter.next()[0]);
    }
    Ok(output)
}
