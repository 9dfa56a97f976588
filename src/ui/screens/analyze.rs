use std::path::PathBuf;

use eframe::egui::{self, Color32};
use tracing::warn;

use crate::audio::capture::Recorder;
use crate::audio::intake;
use crate::audio::meter::LevelMeter;
use crate::types::ReadyPayload;
use crate::ui::components::meter::MeterView;

/// Capture/upload screen: record with live metering, or load a file, then
/// hand the payload off for analysis.
pub struct AnalyzeScreen {
    recorder: Recorder,
    meter: LevelMeter,
    payload: Option<ReadyPayload>,
    path_input: String,
    error: Option<String>,
}

impl AnalyzeScreen {
    pub fn new(meter_window: usize) -> Self {
        Self {
            recorder: Recorder::new(meter_window),
            meter: LevelMeter::new(),
            payload: None,
            path_input: String::new(),
            error: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Audio bytes of the current payload, for playback on the results side.
    pub fn payload_audio(&self) -> Option<(Vec<u8>, String)> {
        self.payload
            .as_ref()
            .map(|p| (p.bytes.clone(), p.mime.clone()))
    }

    /// Returns a payload when the user pressed Analyze this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, submitting: bool) -> Option<ReadyPayload> {
        self.recorder.poll();
        self.show_capture_controls(ui);
        ui.add_space(8.0);
        MeterView {
            level: self.meter.level(),
            waveform: &self.meter.waveform(),
        }
        .show(ui);
        ui.add_space(8.0);
        self.show_upload_row(ui);
        ui.add_space(8.0);
        self.show_payload_summary(ui);
        if let Some(error) = &self.error {
            ui.colored_label(Color32::from_rgb(248, 113, 113), error);
        }
        ui.add_space(8.0);
        self.show_actions(ui, submitting)
    }

    fn show_capture_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.recorder.is_recording() {
                ui.colored_label(Color32::from_rgb(248, 113, 113), "● Recording");
                if ui.button("■ Stop").clicked() {
                    self.meter.detach();
                    match self.recorder.stop() {
                        Ok(payload) => {
                            self.payload = Some(payload);
                            self.error = None;
                        }
                        Err(err) => self.error = Some(err.to_string()),
                    }
                }
                let elapsed = self.recorder.elapsed().as_secs_f64();
                ui.monospace(format!("{elapsed:6.1}s"));
            } else if ui.button("● Record").clicked() {
                match self.recorder.start() {
                    Ok(()) => {
                        if let Some(analyser) = self.recorder.analyser() {
                            self.meter.attach(analyser);
                        }
                        self.error = None;
                    }
                    Err(err) => {
                        warn!(error = %err, "capture failed to start");
                        self.error = Some(err.to_string());
                    }
                }
            }
        });
    }

    fn show_upload_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("File:");
            ui.text_edit_singleline(&mut self.path_input);
            if ui.button("Load").clicked() {
                let path = PathBuf::from(self.path_input.trim());
                match intake::payload_from_file(&path) {
                    Ok(payload) => {
                        self.payload = Some(payload);
                        self.error = None;
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
            }
        });
    }

    fn show_payload_summary(&self, ui: &mut egui::Ui) {
        let Some(payload) = &self.payload else {
            ui.weak("Record your voice or load a file to begin.");
            return;
        };
        egui::Grid::new("payload_meta").num_columns(4).show(ui, |ui| {
            ui.label("Name");
            ui.label("MIME");
            ui.label("Duration");
            ui.label("Size");
            ui.end_row();
            ui.monospace(&payload.suggested_name);
            ui.monospace(&payload.mime);
            ui.monospace(format!("{:.2} s", payload.duration_seconds));
            ui.monospace(human_size(payload.size_bytes));
            ui.end_row();
        });
    }

    fn show_actions(&mut self, ui: &mut egui::Ui, submitting: bool) -> Option<ReadyPayload> {
        let mut submitted = None;
        ui.horizontal(|ui| {
            let ready = self.payload.is_some() && !submitting && !self.recorder.is_recording();
            if ui
                .add_enabled(self.payload.is_some() && !submitting, egui::Button::new("Reset"))
                .clicked()
            {
                self.payload = None;
                self.error = None;
            }
            if ui
                .add_enabled(ready, egui::Button::new("Analyze"))
                .clicked()
            {
                submitted = self.payload.clone();
            }
            if submitting {
                ui.spinner();
                ui.weak("Analyzing…");
            }
        });
        submitted
    }
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::human_size;

    #[test]
    fn sizes_render_in_the_right_unit() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.00 MB");
    }
}
