pub mod analyze;
pub mod results;

use eframe::egui;

use crate::analysis::session::AnalysisJob;
use crate::config::AppConfig;

use analyze::AnalyzeScreen;
use results::ResultsScreen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Analyze,
    Results,
}

/// Top-level application: two screens plus at most one analysis job in
/// flight. Re-submission stays disabled until the outstanding job reports.
pub struct TonalyzerApp {
    config: AppConfig,
    screen: Screen,
    analyze: AnalyzeScreen,
    results: ResultsScreen,
    job: Option<AnalysisJob>,
}

impl TonalyzerApp {
    pub fn new(config: AppConfig) -> Self {
        let meter_window = config.params.fft_size;
        Self {
            config,
            screen: Screen::Analyze,
            analyze: AnalyzeScreen::new(meter_window),
            results: ResultsScreen::new(),
            job: None,
        }
    }
}

impl eframe::App for TonalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.analyze.is_recording() || self.job.is_some() {
            ctx.request_repaint();
        }
        let finished = self.job.as_ref().and_then(|job| job.try_recv());
        if let Some(snapshot) = finished {
            self.results
                .set_snapshot(snapshot, self.analyze.payload_audio());
            self.job = None;
            self.screen = Screen::Results;
        }
        egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Tonalyzer");
                ui.separator();
                ui.selectable_value(&mut self.screen, Screen::Analyze, "Analyze");
                ui.selectable_value(&mut self.screen, Screen::Results, "Results");
            });
        });
        egui::CentralPanel::default().show(ctx, |ui| match self.screen {
            Screen::Analyze => {
                let submitting = self.job.is_some();
                if let Some(payload) = self.analyze.show(ui, submitting) {
                    if self.job.is_none() {
                        self.job = Some(AnalysisJob::spawn(self.config.clone(), payload));
                    }
                }
            }
            Screen::Results => self.results.show(ui),
        });
    }
}
