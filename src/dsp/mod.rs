//! DSP Effects Library
//!
//! Effect primitives applied by bus chains. Every effect is a pure
//! transform over an [`AudioBuffer`](crate::engine::AudioBuffer) driven by
//! clamped [`EffectParameter`]s.

mod chain;
mod compressor;
mod delay;
mod effect;
mod eq;
mod filter;
mod gain;
mod pan;
mod param;
mod reverb;

pub use chain::{EffectChain, EffectOutcome};
pub use compressor::Compressor;
pub use delay::Delay;
pub use effect::{AudioEffect, Effect, EffectKind, ProcessContext};
pub use eq::{ShelfEq, HIGH_SHELF_HZ, LOW_SHELF_HZ};
pub use filter::{Filter, FilterMode};
pub use gain::Gain;
pub use pan::{apply_pan, pan_gains};
pub use param::EffectParameter;
pub use reverb::Reverb;
