use eframe::egui::{self, Color32};

use crate::types::Distribution;

/// Emotion distribution as sorted horizontal bars.
pub struct DistributionView<'a> {
    pub distribution: &'a Distribution,
}

impl<'a> DistributionView<'a> {
    pub fn show(self, ui: &mut egui::Ui) {
        if self.distribution.is_empty() {
            ui.label("Distribution unavailable");
            return;
        }
        let mut entries: Vec<(&String, &f64)> = self.distribution.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(a.1));
        for (label, &value) in entries {
            let fraction = value.clamp(0.0, 1.0) as f32;
            ui.horizontal(|ui| {
                ui.colored_label(emotion_color(label), label);
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .desired_width(ui.available_width() - 48.0)
                        .fill(emotion_color(label)),
                );
                ui.monospace(format!("{:>3.0}%", value * 100.0));
            });
        }
    }
}

pub fn emotion_color(label: &str) -> Color32 {
    match label {
        "angry" => Color32::from_rgb(245, 158, 11),
        "happy" => Color32::from_rgb(253, 224, 71),
        "sad" => Color32::from_rgb(96, 165, 250),
        "fear" => Color32::from_rgb(167, 139, 250),
        "disgust" => Color32::from_rgb(52, 211, 153),
        "surprise" => Color32::from_rgb(244, 114, 182),
        _ => Color32::from_rgb(148, 163, 184),
    }
}
