use eframe::egui;

use crate::chart::raster::{ChartStyle, ChartSurface};
use crate::types::SeriesPoint;

/// Chart panel backed by a raster surface. The surface is re-rendered only
/// when the data version or the panel size changes; the egui texture and any
/// export both read the same buffer.
pub struct ChartPanel {
    surface: Option<ChartSurface>,
    texture: Option<egui::TextureHandle>,
    rendered_version: u64,
    rendered_size: (u32, u32),
}

impl ChartPanel {
    pub fn new() -> Self {
        Self {
            surface: None,
            texture: None,
            rendered_version: 0,
            rendered_size: (0, 0),
        }
    }

    /// Draw the chart, re-rendering the raster when needed. `version` must
    /// change whenever `points` or the style changes.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        points: &[SeriesPoint],
        style: &ChartStyle,
        version: u64,
    ) {
        let width = ui.available_width().max(1.0) as u32;
        let height = 220u32;
        if self.texture.is_none()
            || self.rendered_version != version
            || self.rendered_size != (width, height)
        {
            let mut surface = ChartSurface::new(width, height);
            surface.render(points, style);
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [surface.width() as usize, surface.height() as usize],
                surface.pixels(),
            );
            self.texture =
                Some(ui.ctx()
                    .load_texture("chart", image, egui::TextureOptions::NEAREST));
            self.surface = Some(surface);
            self.rendered_version = version;
            self.rendered_size = (width, height);
        }
        if let Some(texture) = &self.texture {
            let size = egui::vec2(
                self.rendered_size.0 as f32,
                self.rendered_size.1 as f32,
            );
            ui.image((texture.id(), size));
        }
    }

    /// The last-rendered surface, for export.
    pub fn surface(&self) -> Option<&ChartSurface> {
        self.surface.as_ref()
    }
}

impl Default for ChartPanel {
    fn default() -> Self {
        Self::new()
    }
}
