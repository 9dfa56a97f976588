pub mod components;
pub mod screens;

use anyhow::{anyhow, Result};
use eframe::NativeOptions;

use crate::config::AppConfig;

pub fn launch_ui(config: AppConfig) -> Result<()> {
    let app = screens::TonalyzerApp::new(config);
    let options = NativeOptions::default();
    eframe::run_native("Tonalyzer", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|err| anyhow!("failed to launch UI: {err}"))
}
