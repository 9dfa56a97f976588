use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rustfft::{num_complex::Complex, FftPlanner};

/// Smallest window the meter will analyze.
pub const MIN_WINDOW: usize = 256;

const METER_GAIN: f32 = 1.6;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Shared snapshot of the most recent capture window. The capture callback
/// pushes into it; the meter and waveform trace read the latest window.
#[derive(Clone)]
pub struct Analyser {
    inner: Arc<Mutex<AnalyserState>>,
}

struct AnalyserState {
    window: VecDeque<f32>,
    capacity: usize,
}

impl Analyser {
    pub fn new(window_size: usize) -> Self {
        let capacity = window_size.max(MIN_WINDOW).next_power_of_two();
        Self {
            inner: Arc::new(Mutex::new(AnalyserState {
                window: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Append mono samples, keeping only the most recent window.
    pub fn push(&self, samples: &[f32]) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        for &sample in samples {
            if state.window.len() == state.capacity {
                state.window.pop_front();
            }
            state.window.push_back(sample);
        }
    }

    /// Copy of the latest time-domain window.
    pub fn snapshot(&self) -> Vec<f32> {
        self.inner
            .lock()
            .map(|state| state.window.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.window.clear();
        }
    }
}

/// Turns the analyser window into a bounded loudness value in [0, 1] plus a
/// waveform trace. Idles at 0 when no analyser is attached.
pub struct LevelMeter {
    analyser: Option<Analyser>,
    planner: FftPlanner<f32>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            analyser: None,
            planner: FftPlanner::new(),
        }
    }

    pub fn attach(&mut self, analyser: Analyser) {
        self.analyser = Some(analyser);
    }

    pub fn detach(&mut self) {
        self.analyser = None;
    }

    /// Current loudness, recomputed from the latest window on every call.
    pub fn level(&mut self) -> f32 {
        let Some(analyser) = self.analyser.as_ref() else {
            return 0.0;
        };
        let window = analyser.snapshot();
        if window.len() < MIN_WINDOW {
            return 0.0;
        }
        let bins = byte_frequency_bins(&mut self.planner, &window);
        if bins.is_empty() {
            return 0.0;
        }
        let mean_square = bins
            .iter()
            .map(|&bin| (bin as f32) * (bin as f32))
            .sum::<f32>()
            / bins.len() as f32;
        let rms = mean_square.sqrt() / 255.0;
        (rms * METER_GAIN).min(1.0)
    }

    /// Most recent time-domain window for the waveform trace; empty when
    /// detached.
    pub fn waveform(&self) -> Vec<f32> {
        self.analyser
            .as_ref()
            .map(Analyser::snapshot)
            .unwrap_or_default()
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Magnitude spectrum of the window quantized onto the [0, 255] byte range,
/// mapping [-100, -30] dBFS linearly onto the byte scale.
fn byte_frequency_bins(planner: &mut FftPlanner<f32>, window: &[f32]) -> Vec<u8> {
    let len = window.len();
    let fft = planner.plan_fft_forward(len);
    let mut buffer: Vec<Complex<f32>> = window
        .iter()
        .map(|&sample| Complex {
            re: sample,
            im: 0.0,
        })
        .collect();
    fft.process(&mut buffer);

    let scale = 1.0 / len as f32;
    buffer
        .iter()
        .take(len / 2)
        .map(|bin| {
            let magnitude = bin.norm() * scale;
            let db = 20.0 * magnitude.max(1e-12).log10();
            let unit = ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0);
            (unit * 255.0).round() as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_window(len: usize, cycles: f32, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * cycles * i as f32 / len as f32).sin() * amplitude)
            .collect()
    }

    #[test]
    fn detached_meter_idles_at_zero() {
        let mut meter = LevelMeter::new();
        assert_eq!(meter.level(), 0.0);
        assert!(meter.waveform().is_empty());
    }

    #[test]
    fn silence_measures_zero() {
        let analyser = Analyser::new(1024);
        analyser.push(&vec![0.0; 1024]);
        let mut meter = LevelMeter::new();
        meter.attach(analyser);
        assert_eq!(meter.level(), 0.0);
    }

    #[test]
    fn tone_registers_and_stays_bounded() {
        let analyser = Analyser::new(1024);
        analyser.push(&sine_window(1024, 16.0, 0.9));
        let mut meter = LevelMeter::new();
        meter.attach(analyser);
        let level = meter.level();
        assert!(level > 0.0, "tone should register: {level}");
        assert!(level <= 1.0);
    }

    #[test]
    fn analyser_keeps_only_the_latest_window() {
        let analyser = Analyser::new(256);
        analyser.push(&vec![1.0; 300]);
        analyser.push(&vec![-1.0; 10]);
        let window = analyser.snapshot();
        assert_eq!(window.len(), 256);
        assert_eq!(window[window.len() - 1], -1.0);
    }
}
