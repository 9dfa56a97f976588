use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use eframe::egui::{self, Color32};
use tracing::warn;

use crate::analysis::advice;
use crate::analysis::session::AnalysisSnapshot;
use crate::audio::playback;
use crate::chart::raster::ChartStyle;
use crate::types::ProsodySummary;
use crate::ui::components::chart::ChartPanel;
use crate::ui::components::distribution::{emotion_color, DistributionView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartTab {
    Pitch,
    Energy,
}

/// Results screen: top emotion, distribution, prosody, chart tabs with PNG
/// export, playback, and suggestions.
pub struct ResultsScreen {
    snapshot: Option<AnalysisSnapshot>,
    audio: Option<(Vec<u8>, String)>,
    tab: ChartTab,
    chart: ChartPanel,
    version: u64,
    status: Option<String>,
}

impl ResultsScreen {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            audio: None,
            tab: ChartTab::Pitch,
            chart: ChartPanel::new(),
            version: 0,
            status: None,
        }
    }

    pub fn set_snapshot(&mut self, snapshot: AnalysisSnapshot, audio: Option<(Vec<u8>, String)>) {
        self.snapshot = Some(snapshot);
        self.audio = audio;
        self.version += 1;
        self.status = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(snapshot) = self.snapshot.clone() else {
            ui.weak("No result yet. Record or load audio on the Analyze tab.");
            return;
        };
        if let Some(warning) = &snapshot.warning {
            ui.colored_label(Color32::from_rgb(251, 191, 36), warning);
        }
        if let Some(error) = &snapshot.error {
            ui.colored_label(Color32::from_rgb(248, 113, 113), error);
            return;
        }
        let Some(result) = snapshot.result else {
            return;
        };

        let color = emotion_color(&result.emotion.label);
        ui.horizontal(|ui| {
            ui.heading(&result.emotion.label);
            ui.colored_label(
                color,
                format!("{:.0}% confidence", result.emotion.confidence * 100.0),
            );
        });
        ui.separator();

        DistributionView {
            distribution: &result.distribution,
        }
        .show(ui);
        ui.separator();

        ui.label(format!(
            "Pitch {:.0} Hz · Energy {:.3} RMS · {:.0} WPM",
            result.prosody.pitch_hz, result.prosody.energy_rms, result.prosody.wpm
        ));
        for note in prosody_notes(&result.prosody) {
            ui.weak(note);
        }
        ui.separator();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, ChartTab::Pitch, "Pitch");
            ui.selectable_value(&mut self.tab, ChartTab::Energy, "Energy");
            if ui.button("Export PNG").clicked() {
                self.export_chart();
            }
            if self.audio.is_some() && ui.button("▶ Play").clicked() {
                self.play_audio();
            }
        });
        let (points, style, tab_bit) = match self.tab {
            ChartTab::Pitch => (&result.pitch_series, ChartStyle::pitch(), 0),
            ChartTab::Energy => (&result.energy_series, ChartStyle::energy(), 1),
        };
        self.chart
            .show(ui, points, &style, self.version * 2 + tab_bit);
        if let Some(status) = &self.status {
            ui.weak(status);
        }
        ui.separator();

        ui.label("Suggestions");
        if result.advice.is_empty() {
            for line in advice::for_label(&result.emotion.label) {
                ui.weak(*line);
            }
        } else {
            for line in &result.advice {
                ui.weak(line);
            }
        }
    }

    fn export_chart(&mut self) {
        let Some(surface) = self.chart.surface() else {
            self.status = Some("Nothing rendered to export yet.".to_string());
            return;
        };
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = PathBuf::from(format!("chart_{stamp}.png"));
        match surface.export_png(&path) {
            Ok(()) => self.status = Some(format!("Saved {}", path.display())),
            Err(err) => {
                warn!(error = %err, "chart export failed");
                self.status = Some(format!("Export failed: {err}"));
            }
        }
    }

    fn play_audio(&self) {
        if let Some((bytes, _mime)) = self.audio.clone() {
            std::thread::spawn(move || {
                if let Err(err) = playback::play_bytes(bytes) {
                    warn!(error = %err, "playback failed");
                }
            });
        }
    }
}

impl Default for ResultsScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule-based commentary on the prosody metrics.
fn prosody_notes(prosody: &ProsodySummary) -> Vec<String> {
    let mut notes = Vec::new();
    let pitch = prosody.pitch_hz;
    notes.push(
        if pitch > 400.0 {
            "Very high pitch; possibly a child's voice or unreliable detection."
        } else if pitch > 250.0 {
            "Fairly high pitch."
        } else if pitch >= 150.0 {
            "Pitch is in the typical range."
        } else {
            "Fairly low pitch."
        }
        .to_string(),
    );
    let energy = prosody.energy_rms;
    notes.push(
        if energy < 0.02 {
            "Quiet delivery; consider projecting more."
        } else if energy <= 0.06 {
            "Moderate energy; clearly audible."
        } else {
            "Loud delivery."
        }
        .to_string(),
    );
    let wpm = prosody.wpm;
    notes.push(
        if wpm < 100.0 {
            "Fairly slow speech; connective phrasing can smooth the flow."
        } else if wpm <= 140.0 {
            "Speech rate is in the typical range."
        } else if wpm <= 170.0 {
            "Fairly fast speech; pause on the key points."
        } else {
            "Speech is too fast; slow down slightly for clarity."
        }
        .to_string(),
    );
    notes
}
