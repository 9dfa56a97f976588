use eframe::egui::{self, Color32, Stroke};

/// VU bar plus scrolling waveform trace fed by the level meter. Purely
/// visual; redrawn from the latest analyser snapshot every frame.
pub struct MeterView<'a> {
    pub level: f32,
    pub waveform: &'a [f32],
}

impl<'a> MeterView<'a> {
    pub fn show(self, ui: &mut egui::Ui) {
        self.show_vu_bar(ui);
        self.show_waveform(ui);
    }

    fn show_vu_bar(&self, ui: &mut egui::Ui) {
        let size = egui::vec2(ui.available_width(), 12.0);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 4.0, Color32::from_gray(30));
        let level = self.level.clamp(0.0, 1.0);
        if level > 0.0 {
            let filled = egui::Rect::from_min_size(
                rect.min,
                egui::vec2(rect.width() * level, rect.height()),
            );
            painter.rect_filled(filled, 4.0, level_color(level));
        }
        painter.rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::DARK_GRAY));
    }

    fn show_waveform(&self, ui: &mut egui::Ui) {
        let size = egui::vec2(ui.available_width(), 120.0);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from_gray(18));
        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));
        if self.waveform.len() < 2 {
            return;
        }
        let mut points = Vec::with_capacity(self.waveform.len());
        let last_index = (self.waveform.len() - 1) as f32;
        for (index, &value) in self.waveform.iter().enumerate() {
            let fraction = index as f32 / last_index;
            let x = rect.left() + fraction * rect.width();
            let y = rect.center().y - value.clamp(-1.0, 1.0) * rect.height() * 0.45;
            points.push(egui::pos2(x, y));
        }
        painter.add(egui::Shape::line(
            points,
            Stroke::new(2.0, Color32::from_rgb(6, 182, 212)),
        ));
    }
}

fn level_color(level: f32) -> Color32 {
    if level < 0.3 {
        Color32::from_rgb(74, 222, 128)
    } else if level < 0.6 {
        Color32::from_rgb(250, 204, 21)
    } else {
        Color32::from_rgb(239, 68, 68)
    }
}
