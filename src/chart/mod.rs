//! Time-series chart rendering: nice-number axis ticks, affine coordinate
//! mapping, and a raster surface with lossless export.

pub mod glyphs;
pub mod raster;

use crate::types::SeriesPoint;

/// Evenly spaced human-readable axis ticks covering a numeric domain.
/// Derived per render call; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSet {
    pub ticks: Vec<f64>,
    pub start: f64,
    pub end: f64,
}

impl TickSet {
    /// Affine position of `value` within the tick domain, in [0, 1].
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.end - self.start;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        (value - self.start) / span
    }
}

/// Smallest "nice" step (1, 2, 5 or 10 times a power of ten) covering `raw`.
pub fn nice_step(raw: f64) -> f64 {
    let raw = raw.abs().max(1e-12);
    let exponent = raw.log10().floor();
    let base = 10f64.powf(exponent);
    let mantissa = raw / base;
    let factor = if mantissa < 1.5 {
        1.0
    } else if mantissa < 3.0 {
        2.0
    } else if mantissa < 7.0 {
        5.0
    } else {
        10.0
    };
    factor * base
}

/// Ticks every nice step from `floor(min/step)*step` to `ceil(max/step)*step`
/// inclusive, for a desired tick count of at least 2.
pub fn make_ticks(min: f64, max: f64, desired: usize) -> TickSet {
    let desired = desired.max(2);
    let (min, max) = widen_if_flat(min, max);
    let step = nice_step((max - min) / desired as f64);
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let mut ticks = Vec::new();
    let mut value = start;
    while value <= end + step * 0.5 {
        ticks.push(round_tick(value));
        value += step;
    }
    TickSet {
        ticks,
        start: round_tick(start),
        end: round_tick(end),
    }
}

/// Min/max of t and v across a series; None when empty.
pub fn series_domain(points: &[SeriesPoint]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let mut min_t = first.t;
    let mut max_t = first.t;
    let mut min_v = first.v;
    let mut max_v = first.v;
    for point in points {
        min_t = min_t.min(point.t);
        max_t = max_t.max(point.t);
        min_v = min_v.min(point.v);
        max_v = max_v.max(point.v);
    }
    Some((min_t, max_t, min_v, max_v))
}

fn widen_if_flat(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min, min + 1e-6)
    } else {
        (min, max)
    }
}

// Keep tick values free of accumulated float noise.
fn round_tick(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}
