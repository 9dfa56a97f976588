use std::io::Cursor;

use anyhow::{Context, Result};
use rodio::source::{Source, UniformSourceIterator};
use rodio::{Decoder, OutputStream, Sink};

/// Play an encoded audio buffer (WAV/MP3/OGG) to the default output device.
/// Blocks until playback finishes; call from a worker thread in the UI.
pub fn play_bytes(bytes: Vec<u8>) -> Result<()> {
    let decoder = Decoder::new(Cursor::new(bytes)).context("unsupported audio format")?;
    let converted = decoder.convert_samples::<f32>();
    play_source(converted)
}

fn play_source<S>(source: S) -> Result<()>
where
    S: Source<Item = f32> + Send + 'static,
{
    let (_stream, handle) = OutputStream::try_default().context("failed to open output stream")?;
    let sink = Sink::try_new(&handle).context("failed to create sink")?;
    let unified = ensure_stereo(source);
    sink.append(unified);
    sink.set_volume(1.0);
    sink.sleep_until_end();
    Ok(())
}

fn ensure_stereo<S>(source: S) -> Box<dyn Source<Item = f32> + Send>
where
    S: Source<Item = f32> + Send + 'static,
{
    if source.channels() == 2 {
        Box::new(source)
    } else {
        let sample_rate = source.sample_rate();
        Box::new(UniformSourceIterator::new(source, 2, sample_rate))
    }
}

