use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::chart::glyphs::{self, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};
use crate::chart::{make_ticks, series_domain, TickSet};
use crate::types::SeriesPoint;

pub type Rgba = [u8; 4];

// Fixed padding reserved for axis labels.
pub const PAD_LEFT: u32 = 56;
pub const PAD_RIGHT: u32 = 16;
pub const PAD_TOP: u32 = 22;
pub const PAD_BOTTOM: u32 = 32;

const MIN_WIDTH: u32 = 120;
const MIN_HEIGHT: u32 = 80;

const X_TICK_TARGET: usize = 8;
const Y_TICK_TARGET: usize = 5;
const DOT_TARGET: usize = 40;
const LABEL_SCALE: u32 = 1;

const BACKGROUND: Rgba = [24, 26, 36, 255];
const GRID: Rgba = [44, 47, 58, 255];
const AXIS: Rgba = [88, 92, 104, 255];
const LABEL: Rgba = [216, 218, 224, 255];
const DOT: Rgba = [236, 238, 244, 255];

/// Line color, unit label, and value formatting for one chart flavor.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub line: Rgba,
    pub unit: &'static str,
    pub y_decimals: usize,
}

impl ChartStyle {
    pub fn pitch() -> Self {
        Self {
            line: [34, 211, 238, 255],
            unit: "Hz",
            y_decimals: 0,
        }
    }

    pub fn energy() -> Self {
        Self {
            line: [245, 158, 11, 255],
            unit: "RMS",
            y_decimals: 3,
        }
    }
}

/// Owned RGBA raster a chart renders into. The UI displays the buffer as a
/// texture and export encodes the very same bytes, so the saved image always
/// matches what is on screen.
pub struct ChartSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ChartSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Render a series as a line chart with grid, axes, and tick labels.
    /// Fewer than two points draws the background and a no-data indicator.
    pub fn render(&mut self, points: &[SeriesPoint], style: &ChartStyle) {
        self.fill(BACKGROUND);
        if points.len() < 2 {
            self.draw_text(
                PAD_LEFT as i64,
                (PAD_TOP + 8) as i64,
                "NO DATA",
                2,
                LABEL,
            );
            return;
        }

        let (min_t, max_t, min_v, max_v) =
            series_domain(points).expect("non-empty series has a domain");
        let x_ticks = make_ticks(min_t, max_t, X_TICK_TARGET);
        let y_ticks = make_ticks(min_v, max_v, Y_TICK_TARGET);

        self.draw_grid(&x_ticks, &y_ticks);
        self.draw_axes();
        self.draw_labels(&x_ticks, &y_ticks, style);
        self.draw_series(points, &x_ticks, &y_ticks, style);
    }

    /// Encode the current buffer losslessly. No re-render happens here; the
    /// export is exactly the pixels most recently drawn.
    pub fn export_png(&self, path: &Path) -> Result<()> {
        let image = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("raster buffer does not match its dimensions")?;
        image
            .save(path)
            .with_context(|| format!("failed to write chart image to {}", path.display()))
    }

    fn plot_area(&self) -> (f64, f64, f64, f64) {
        let w = (self.width - PAD_LEFT - PAD_RIGHT) as f64;
        let h = (self.height - PAD_TOP - PAD_BOTTOM) as f64;
        (PAD_LEFT as f64, PAD_TOP as f64, w, h)
    }

    fn x_to_px(&self, ticks: &TickSet, value: f64) -> f64 {
        let (x0, _, w, _) = self.plot_area();
        x0 + ticks.fraction(value) * w
    }

    fn y_to_px(&self, ticks: &TickSet, value: f64) -> f64 {
        let (_, y0, _, h) = self.plot_area();
        y0 + (1.0 - ticks.fraction(value)) * h
    }

    fn draw_grid(&mut self, x_ticks: &TickSet, y_ticks: &TickSet) {
        let (x0, y0, w, h) = self.plot_area();
        for &tick in &x_ticks.ticks {
            let x = self.x_to_px(x_ticks, tick) as f32;
            self.draw_line(x, y0 as f32, x, (y0 + h) as f32, GRID);
        }
        for &tick in &y_ticks.ticks {
            let y = self.y_to_px(y_ticks, tick) as f32;
            self.draw_line(x0 as f32, y, (x0 + w) as f32, y, GRID);
        }
    }

    fn draw_axes(&mut self) {
        let (x0, y0, w, h) = self.plot_area();
        let bottom = (y0 + h) as f32;
        self.draw_line(x0 as f32, bottom, (x0 + w) as f32, bottom, AXIS);
        self.draw_line(x0 as f32, y0 as f32, x0 as f32, bottom, AXIS);
    }

    fn draw_labels(&mut self, x_ticks: &TickSet, y_ticks: &TickSet, style: &ChartStyle) {
        let (x0, y0, w, h) = self.plot_area();
        let baseline = (y0 + h) as i64 + 6;
        for &tick in &x_ticks.ticks {
            let text = format!("{tick:.1}s");
            let width = glyphs::text_width(&text, LABEL_SCALE) as i64;
            let x = self.x_to_px(x_ticks, tick) as i64 - width / 2;
            self.draw_text(x, baseline, &text, LABEL_SCALE, LABEL);
        }
        let glyph_half = ((GLYPH_HEIGHT * LABEL_SCALE) / 2) as i64;
        for &tick in &y_ticks.ticks {
            let text = format!("{:.*}", style.y_decimals, tick);
            let width = glyphs::text_width(&text, LABEL_SCALE) as i64;
            let x = x0 as i64 - 8 - width;
            let y = self.y_to_px(y_ticks, tick) as i64 - glyph_half;
            self.draw_text(x, y, &text, LABEL_SCALE, LABEL);
        }
        let unit_width = glyphs::text_width(style.unit, LABEL_SCALE) as i64;
        self.draw_text(
            (x0 + w) as i64 - unit_width,
            y0 as i64 + 4,
            style.unit,
            LABEL_SCALE,
            LABEL,
        );
    }

    fn draw_series(
        &mut self,
        points: &[SeriesPoint],
        x_ticks: &TickSet,
        y_ticks: &TickSet,
        style: &ChartStyle,
    ) {
        for pair in points.windows(2) {
            let ax = self.x_to_px(x_ticks, pair[0].t) as f32;
            let ay = self.y_to_px(y_ticks, pair[0].v) as f32;
            let bx = self.x_to_px(x_ticks, pair[1].t) as f32;
            let by = self.y_to_px(y_ticks, pair[1].v) as f32;
            self.draw_line(ax, ay, bx, by, style.line);
            self.draw_line(ax, ay + 1.0, bx, by + 1.0, style.line);
        }
        let stride = (points.len() / DOT_TARGET).max(1);
        for point in points.iter().step_by(stride) {
            let x = self.x_to_px(x_ticks, point.t);
            let y = self.y_to_px(y_ticks, point.v);
            self.fill_dot(x as i64, y as i64, 2, DOT);
        }
    }

    fn fill(&mut self, color: Rgba) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn put_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let index = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.pixels[index..index + 4].copy_from_slice(&color);
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.put_pixel(
                (x0 + dx * t).round() as i64,
                (y0 + dy * t).round() as i64,
                color,
            );
        }
    }

    fn fill_dot(&mut self, cx: i64, cy: i64, radius: i64, color: Rgba) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put_pixel(cx + x, cy + y, color);
                }
            }
        }
    }

    fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgba) {
        let advance = ((GLYPH_WIDTH + GLYPH_SPACING) * scale) as i64;
        let mut cursor = x;
        for ch in text.chars() {
            if let Some(rows) = glyphs::glyph(ch) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                            continue;
                        }
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.put_pixel(
                                    cursor + (col * scale + sx) as i64,
                                    y + (row as u32 * scale + sy) as i64,
                                    color,
                                );
                            }
                        }
                    }
                }
            }
            cursor += advance;
        }
    }
}
