//! Dubmix - Audio Mixing and Timeline Compositing for Dubbing
//!
//! Dubmix provides two independent tools for dubbing audio:
//! 1. Bus Graph - five fixed buses (voice, music, sfx, environment, master)
//!    with volume, pan, mute/solo and ordered effect chains, mixed down with
//!    anti-clip normalization
//! 2. Timeline Compositor - surgical dialogue replacement that mutes only the
//!    replaced intervals of a background track and lays new clips over them
//!
//! # Architecture
//!
//! - `dsp`: effect primitives and chains
//! - `mixer`: the bus graph, driven through [`mixer::Command`]s
//! - `state`: saving and restoring bus configuration documents
//! - `compositor`: render plans plus ffmpeg and in-memory renderers

pub mod cli;
pub mod compositor;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod mixer;
pub mod state;

pub use compositor::{ClipDescriptor, MediaSource, OverlapPolicy, TimelineCompositor};
pub use config::{CompositorConfig, MixerConfig};
pub use engine::AudioBuffer;
pub use error::{DubmixError, Result};
pub use mixer::{BusGraph, BusId, Command, SharedBusGraph};
