//! Audio Engine Module
//!
//! Core buffer types shared by the bus graph and the compositor:
//! - Audio buffer management and resampling
//! - WAV file I/O

pub mod buffer;
pub mod io;

pub use buffer::{
    db_to_linear, AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE, MAX_CHANNELS,
};
pub use io::{export_wav, import_wav, wav_duration_secs, ExportFormat};
