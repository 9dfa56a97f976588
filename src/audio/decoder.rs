use std::io::Cursor;

use anyhow::{ensure, Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Planar decoded audio at its native sample rate; one buffer per channel.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frame_count(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Decode an in-memory audio buffer to planar f32 samples.
pub fn decode_bytes(bytes: &[u8], mime: &str) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_for_mime(mime) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("failed to probe audio container")?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("no audio track in input")?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder")?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .context("failed to decode audio packet")?;
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channel_count = spec.channels.count();
        let frames = decoded.frames();

        let needs_alloc = sample_buf
            .as_ref()
            .map(|buf| buf.capacity() < frames * channel_count)
            .unwrap_or(true);
        if needs_alloc {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let buf = sample_buf.as_mut().expect("sample buffer allocated");
        buf.copy_interleaved_ref(decoded);

        deinterleave(buf.samples(), channel_count, frames, &mut channels);
    }

    ensure!(sample_rate > 0, "sample rate not specified in input");
    ensure!(
        !channels.is_empty() && channels.iter().any(|c| !c.is_empty()),
        "decoded stream contained no samples"
    );
    Ok(DecodedAudio {
        channels,
        sample_rate,
    })
}

fn deinterleave(
    interleaved: &[f32],
    channel_count: usize,
    frames: usize,
    channels: &mut Vec<Vec<f32>>,
) {
    if channels.len() < channel_count {
        channels.resize_with(channel_count, Vec::new);
    }
    for frame in 0..frames {
        for (channel, sink) in channels.iter_mut().enumerate().take(channel_count) {
            sink.push(interleaved[frame * channel_count + channel]);
        }
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.split(';').next().unwrap_or("").trim() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" | "application/ogg" => Some("ogg"),
        "audio/webm" | "video/webm" => Some("webm"),
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some("m4a"),
        "audio/flac" => Some("flac"),
        _ => None,
    }
}
