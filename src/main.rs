use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tonalyzer::analysis::client::BackendClient;
use tonalyzer::analysis::session;
use tonalyzer::audio::{capture, intake, normalizer};
use tonalyzer::chart::raster::{ChartStyle, ChartSurface};
use tonalyzer::config::{AppConfig, BackendMode};
use tonalyzer::types::{AnalysisResponse, ReadyPayload};
use tonalyzer::ui;

/// Tonalyzer - Speech intonation analyzer
///
/// Records or loads speech audio, normalizes it to canonical mono 16 kHz
/// PCM16 WAV, and shows an emotion/prosody analysis.
#[derive(Parser, Debug)]
#[command(name = "tonalyzer")]
#[command(version)]
#[command(about = "Speech intonation analyzer", long_about = None)]
struct Cli {
    /// Log filter, e.g. "info" or "tonalyzer=debug"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Use the deterministic synthetic engine instead of a remote backend
    #[arg(long, global = true)]
    demo: bool,

    /// Pin the synthetic engine seed (implies --demo)
    #[arg(long, global = true)]
    seed: Option<u32>,

    /// Perturb the derived seed so repeated demo runs differ
    #[arg(long, global = true)]
    vary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an audio file and print the canonical result JSON
    Analyze(AnalyzeArgs),
    /// Record from the default microphone, then analyze
    Record(RecordArgs),
    /// Launch the desktop UI
    Ui,
    /// Check that the configured backend is reachable
    Health,
}

#[derive(ClapArgs, Debug)]
struct AnalyzeArgs {
    /// Input audio file (wav, mp3, ogg, webm, m4a)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Export the pitch chart as a PNG
    #[arg(long, value_name = "PATH")]
    chart: Option<PathBuf>,

    /// Write the normalized canonical WAV next to the result
    #[arg(long, value_name = "PATH")]
    wav: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct RecordArgs {
    /// Seconds to record before analyzing
    #[arg(long, default_value_t = 5.0)]
    duration: f64,
}

impl AnalyzeArgs {
    fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            bail!("input file does not exist: {:?}", self.input);
        }
        if !self.input.is_file() {
            bail!("input path is not a file: {:?}", self.input);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    let config = AppConfig::from_env(cli.demo, cli.seed, cli.vary)?;
    match &cli.command {
        Command::Analyze(args) => handle_analyze(&config, args),
        Command::Record(args) => handle_record(&config, args),
        Command::Ui => ui::launch_ui(config),
        Command::Health => handle_health(&config),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn handle_analyze(config: &AppConfig, args: &AnalyzeArgs) -> Result<()> {
    args.validate()
        .context("failed to validate command-line arguments")?;
    let payload =
        intake::payload_from_file(&args.input).context("failed to accept input file")?;
    if let Some(path) = &args.wav {
        let canonical = normalizer::normalize(&payload, config.params.sampling_rate)
            .map_err(|err| anyhow!("normalization failed: {err}"))?;
        std::fs::write(path, &canonical.bytes)
            .with_context(|| format!("failed to write canonical WAV to {:?}", path))?;
        info!(path = %path.display(), frames = canonical.frame_count, "wrote canonical WAV");
    }
    report_analysis(config, &payload, args.chart.as_deref())
}

fn handle_record(config: &AppConfig, args: &RecordArgs) -> Result<()> {
    if args.duration <= 0.0 {
        bail!("recording duration must be positive, got: {}", args.duration);
    }
    let payload = capture::record_for(
        Duration::from_secs_f64(args.duration),
        config.params.fft_size,
    )
    .map_err(|err| anyhow!("capture failed: {err}"))?;
    info!(
        bytes = payload.size_bytes,
        duration_seconds = payload.duration_seconds,
        "recording finished"
    );
    report_analysis(config, &payload, None)
}

fn report_analysis(
    config: &AppConfig,
    payload: &ReadyPayload,
    chart: Option<&std::path::Path>,
) -> Result<()> {
    let snapshot = session::run_analysis(config, payload);
    if let Some(warning) = &snapshot.warning {
        warn!("{warning}");
    }
    let result = snapshot
        .result
        .ok_or_else(|| anyhow!(snapshot.error.unwrap_or_else(|| "analysis failed".to_string())))?;
    if let Some(path) = chart {
        let mut surface = ChartSurface::new(900, 360);
        surface.render(&result.pitch_series, &ChartStyle::pitch());
        surface.export_png(path)?;
        info!(path = %path.display(), "wrote chart image");
    }
    let response = AnalysisResponse {
        result,
        meta: None,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn handle_health(config: &AppConfig) -> Result<()> {
    match &config.backend {
        BackendMode::Remote { url } => {
            let client = BackendClient::new(url).map_err(|err| anyhow!(err.to_string()))?;
            let status = client.health().map_err(|err| anyhow!(err.to_string()))?;
            println!(
                "{}",
                serde_json::json!({ "ok": status.ok, "message": status.message })
            );
            if !status.ok {
                bail!("backend reported not ok");
            }
        }
        BackendMode::Synthetic { .. } => {
            println!("{}", serde_json::json!({ "ok": true, "message": "demo mode" }));
        }
    }
    Ok(())
}
