//! Tonalyzer — speech intonation analysis pipeline.
//!
//! Captures or loads speech audio, normalizes it to canonical mono 16 kHz
//! PCM16 WAV, analyzes it through a remote backend or the deterministic
//! synthetic engine, and charts the resulting pitch/energy series.

pub mod analysis;
pub mod audio;
pub mod chart;
pub mod config;
pub mod types;
pub mod ui;
