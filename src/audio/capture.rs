use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, info, warn};

use crate::audio::encoder;
use crate::audio::meter::Analyser;
use crate::types::ReadyPayload;

/// Chunk cadence the callback channel is sized for; bounds buffered memory
/// between polls on long recordings.
const FLUSH_INTERVAL_MS: u32 = 100;

/// Capture formats in descending preference order.
const FORMAT_PREFERENCE: [SampleFormat; 3] =
    [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no input device available; check that a microphone is connected")]
    NoInputDevice,
    #[error("microphone access refused by the host: {0}")]
    PermissionDenied(String),
    #[error("no supported capture format; tried {tried:?}")]
    UnsupportedFormat { tried: Vec<String> },
    #[error("capture stream failure: {0}")]
    Stream(String),
    #[error("a capture session is already active")]
    AlreadyRecording,
    #[error("recorder is not recording")]
    NotRecording,
}

/// Exclusive owner of the live input stream and its buffers while recording.
/// Created on start, consumed on stop or error; never shared.
struct CaptureSession {
    stream: Stream,
    receiver: Receiver<Vec<f32>>,
    finished: Arc<AtomicBool>,
    analyser: Analyser,
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    started: Instant,
}

/// Microphone recorder with an `Idle -> Recording -> Idle` lifecycle. At most
/// one session is active; stop always releases the stream and the meter.
pub struct Recorder {
    session: Option<CaptureSession>,
    meter_window: usize,
}

impl Recorder {
    pub fn new(meter_window: usize) -> Self {
        Self {
            session: None,
            meter_window,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Analyser feeding the level meter, while a session is active.
    pub fn analyser(&self) -> Option<Analyser> {
        self.session.as_ref().map(|s| s.analyser.clone())
    }

    pub fn elapsed(&self) -> Duration {
        self.session
            .as_ref()
            .map(|s| s.started.elapsed())
            .unwrap_or_default()
    }

    /// Open the default input device and start buffering audio.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        let device = default_input_device()?;
        let session = open_session(&device, self.meter_window)?;
        session
            .stream
            .play()
            .map_err(|err| CaptureError::Stream(err.to_string()))?;
        info!(
            channels = session.channels,
            sample_rate = session.sample_rate,
            "capture session opened"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Drain buffered chunks into the session. Call at UI cadence so the
    /// bounded callback channel never fills up.
    pub fn poll(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        loop {
            match session.receiver.try_recv() {
                Ok(chunk) => session.samples.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Stop recording, release the stream and meter, and emit exactly one
    /// payload tagged with the capture container type.
    pub fn stop(&mut self) -> Result<ReadyPayload, CaptureError> {
        let mut session = self.session.take().ok_or(CaptureError::NotRecording)?;
        session.finished.store(true, Ordering::SeqCst);
        let _ = session.stream.pause();
        while let Ok(chunk) = session.receiver.try_recv() {
            session.samples.extend_from_slice(&chunk);
        }
        // Wall-clock elapsed time, not decoded length; the codec does not
        // expose its duration cheaply and the payload value is advisory.
        let duration_seconds = session.started.elapsed().as_secs_f64().max(0.1);
        let bytes = encoder::encode_wav(&session.samples, session.channels, session.sample_rate)
            .map_err(|err| CaptureError::Stream(err.to_string()))?;
        session.analyser.clear();
        drop(session.stream);
        debug!(
            bytes = bytes.len(),
            duration_seconds, "capture session closed"
        );
        Ok(ReadyPayload {
            size_bytes: bytes.len() as u64,
            bytes,
            mime: "audio/wav".to_string(),
            duration_seconds,
            suggested_name: capture_file_name(),
        })
    }

    /// Abandon the session without emitting a payload.
    pub fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            session.finished.store(true, Ordering::SeqCst);
            let _ = session.stream.pause();
            session.analyser.clear();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Record from the default microphone for a fixed duration (headless path).
pub fn record_for(duration: Duration, meter_window: usize) -> Result<ReadyPayload, CaptureError> {
    let mut recorder = Recorder::new(meter_window);
    recorder.start()?;
    while recorder.elapsed() < duration {
        std::thread::sleep(Duration::from_millis(20));
        recorder.poll();
    }
    recorder.stop()
}

fn default_input_device() -> Result<Device, CaptureError> {
    cpal::default_host()
        .default_input_device()
        .ok_or(CaptureError::NoInputDevice)
}

fn open_session(device: &Device, meter_window: usize) -> Result<CaptureSession, CaptureError> {
    let supported = negotiate_format(device)?;
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: BufferSize::Default,
    };
    let capacity = channel_capacity(&stream_config);
    let (sender, receiver) = mpsc::sync_channel::<Vec<f32>>(capacity);
    let finished = Arc::new(AtomicBool::new(false));
    let analyser = Analyser::new(meter_window);
    let stream = build_input_stream(
        device,
        &stream_config,
        supported.sample_format(),
        Arc::new(sender),
        finished.clone(),
        analyser.clone(),
    )?;
    Ok(CaptureSession {
        stream,
        receiver,
        finished,
        analyser,
        samples: Vec::new(),
        channels: stream_config.channels,
        sample_rate: stream_config.sample_rate.0,
        started: Instant::now(),
    })
}

fn negotiate_format(device: &Device) -> Result<cpal::SupportedStreamConfig, CaptureError> {
    let default = device.default_input_config().map_err(|err| match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            CaptureError::PermissionDenied(err.to_string())
        }
        other => CaptureError::Stream(other.to_string()),
    })?;
    if FORMAT_PREFERENCE.contains(&default.sample_format()) {
        return Ok(default);
    }
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(|err| CaptureError::Stream(err.to_string()))?
        .collect();
    let available: Vec<SampleFormat> = ranges.iter().map(|r| r.sample_format()).collect();
    match select_preferred(&available) {
        Some(format) => {
            let range = ranges
                .into_iter()
                .find(|r| r.sample_format() == format)
                .expect("selected format comes from the range list");
            Ok(range.with_max_sample_rate())
        }
        None => {
            warn!(?available, "no preferred capture format supported");
            Err(CaptureError::UnsupportedFormat {
                tried: FORMAT_PREFERENCE
                    .iter()
                    .map(|f| format!("{f:?}"))
                    .collect(),
            })
        }
    }
}

/// First entry of the preference list the host supports.
fn select_preferred(available: &[SampleFormat]) -> Option<SampleFormat> {
    FORMAT_PREFERENCE
        .iter()
        .copied()
        .find(|wanted| available.contains(wanted))
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    sender: Arc<SyncSender<Vec<f32>>>,
    finished: Arc<AtomicBool>,
    analyser: Analyser,
) -> Result<Stream, CaptureError> {
    let err_fn = |err| warn!(error = %err, "audio input stream error");
    let channels = config.channels as usize;
    match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                let analyser = analyser.clone();
                move |data: &[f32], _| {
                    emit_chunk(data.to_vec(), channels, &sender, &finished, &analyser)
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                let analyser = analyser.clone();
                move |data: &[i16], _| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&sample| sample as f32 / i16::MAX as f32)
                        .collect();
                    emit_chunk(converted, channels, &sender, &finished, &analyser)
                }
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            {
                let sender = sender.clone();
                let finished = finished.clone();
                let analyser = analyser.clone();
                move |data: &[u16], _| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&sample| (sample as f32 / u16::MAX as f32) * 2.0 - 1.0)
                        .collect();
                    emit_chunk(converted, channels, &sender, &finished, &analyser)
                }
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::UnsupportedFormat {
                tried: vec![format!("{other:?}")],
            })
        }
    }
    .map_err(|err| match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::PermissionDenied(err.to_string())
        }
        other => CaptureError::Stream(other.to_string()),
    })
}

fn emit_chunk(
    interleaved: Vec<f32>,
    channels: usize,
    sender: &Arc<SyncSender<Vec<f32>>>,
    finished: &Arc<AtomicBool>,
    analyser: &Analyser,
) {
    // A stopped session must never see a late callback restart metering.
    if finished.load(Ordering::Relaxed) || channels == 0 {
        return;
    }
    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    analyser.push(&mono);
    let _ = sender.try_send(interleaved);
}

fn channel_capacity(config: &StreamConfig) -> usize {
    let frames_per_flush =
        (config.sample_rate.0 as u64 * FLUSH_INTERVAL_MS as u64) / 1000;
    let samples_per_flush = frames_per_flush * config.channels as u64;
    ((samples_per_flush / 1024).max(4)) as usize
}

fn capture_file_name() -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("capture_{stamp}.wav")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_list_descends_from_f32() {
        let available = [SampleFormat::U16, SampleFormat::I16, SampleFormat::F32];
        assert_eq!(select_preferred(&available), Some(SampleFormat::F32));
        let no_float = [SampleFormat::U16, SampleFormat::I16];
        assert_eq!(select_preferred(&no_float), Some(SampleFormat::I16));
        assert_eq!(select_preferred(&[]), None);
    }

    #[test]
    fn channel_capacity_scales_with_rate_and_channels() {
        let config = StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(48_000),
            buffer_size: BufferSize::Default,
        };
        let capacity = channel_capacity(&config);
        assert!(capacity >= 4);
        assert!(capacity <= 16);
    }

    #[test]
    fn stop_without_session_is_rejected() {
        let mut recorder = Recorder::new(1024);
        assert!(matches!(recorder.stop(), Err(CaptureError::NotRecording)));
    }
}
