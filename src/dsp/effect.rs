//! Effect definitions
//!
//! An [`AudioEffect`] is the configuration stored on a bus: its kind, enable
//! flag, chain position and bounded parameters. At render time it is turned
//! into a boxed [`Effect`] processor once, so kind dispatch happens per
//! effect rather than per sample.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::compressor::Compressor;
use super::delay::Delay;
use super::eq::ShelfEq;
use super::filter::{Filter, FilterMode};
use super::gain::Gain;
use super::param::EffectParameter;
use super::reverb::Reverb;
use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

/// The effect kinds a bus chain can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    #[serde(rename = "equalizer")]
    Eq,
    #[serde(rename = "compressor")]
    Compressor,
    #[serde(rename = "reverb")]
    Reverb,
    #[serde(rename = "delay")]
    Delay,
    #[serde(rename = "filter")]
    Filter,
    #[serde(rename = "gain")]
    Gain,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Eq,
        EffectKind::Compressor,
        EffectKind::Reverb,
        EffectKind::Delay,
        EffectKind::Filter,
        EffectKind::Gain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Eq => "equalizer",
            EffectKind::Compressor => "compressor",
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::Filter => "filter",
            EffectKind::Gain => "gain",
        }
    }

    /// Parameter set (names, defaults, bounds) a fresh effect of this kind carries
    pub fn default_parameters(&self) -> Vec<EffectParameter> {
        match self {
            EffectKind::Gain => vec![EffectParameter::new("gain", 0.0, -12.0, 12.0, "dB")],
            EffectKind::Eq => vec![
                EffectParameter::new("low_gain", 0.0, -12.0, 12.0, "dB")
                    .with_description("Low shelf below 1 kHz"),
                EffectParameter::new("mid_gain", 0.0, -12.0, 12.0, "dB"),
                EffectParameter::new("high_gain", 0.0, -12.0, 12.0, "dB")
                    .with_description("High shelf above 4 kHz"),
            ],
            EffectKind::Compressor => vec![
                EffectParameter::new("threshold", -12.0, -60.0, 0.0, "dB"),
                EffectParameter::new("ratio", 4.0, 1.0, 20.0, ":1"),
            ],
            EffectKind::Reverb => vec![
                EffectParameter::new("room_size", 0.5, 0.0, 1.0, ""),
                EffectParameter::new("damping", 0.5, 0.0, 1.0, ""),
            ],
            EffectKind::Delay => vec![
                EffectParameter::new("delay_time", 0.25, 0.0, 2.0, "s"),
                EffectParameter::new("feedback", 0.3, 0.0, 0.9, ""),
                EffectParameter::new("mix", 0.5, 0.0, 1.0, ""),
            ],
            EffectKind::Filter => vec![
                EffectParameter::new("cutoff", 1000.0, 20.0, 20000.0, "Hz"),
                EffectParameter::new("filter_type", 0.0, 0.0, 2.0, "")
                    .with_description("0 = low-pass, 1 = high-pass, 2 = band-pass"),
            ],
        }
    }

    fn default_value(&self, name: &str) -> f32 {
        self.default_parameters()
            .into_iter()
            .find(|p| p.name() == name)
            .map(|p| p.value())
            .unwrap_or(0.0)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = DubmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equalizer" | "eq" => Ok(EffectKind::Eq),
            "compressor" => Ok(EffectKind::Compressor),
            "reverb" => Ok(EffectKind::Reverb),
            "delay" => Ok(EffectKind::Delay),
            "filter" => Ok(EffectKind::Filter),
            "gain" => Ok(EffectKind::Gain),
            _ => Err(DubmixError::UnknownEffectKind {
                name: s.to_string(),
            }),
        }
    }
}

/// Effect configuration owned by a bus chain
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEffect {
    kind: EffectKind,
    /// Disabled effects stay in the chain but are skipped
    pub enabled: bool,
    order: usize,
    parameters: BTreeMap<String, EffectParameter>,
}

impl AudioEffect {
    /// New enabled effect with the kind's default parameters
    pub fn new(kind: EffectKind) -> Self {
        Self::with_parameters(kind, kind.default_parameters())
    }

    /// New enabled effect with an explicit parameter set
    pub fn with_parameters(kind: EffectKind, parameters: Vec<EffectParameter>) -> Self {
        Self {
            kind,
            enabled: true,
            order: 0,
            parameters: parameters
                .into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
        }
    }

    /// Builder-style parameter override, clamped into the parameter's bounds
    pub fn with(mut self, name: &str, value: f32) -> Result<Self> {
        self.set_parameter(name, value)?;
        Ok(self)
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Position in the owning chain
    pub fn order(&self) -> usize {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: usize) {
        self.order = order;
    }

    pub fn parameter(&self, name: &str) -> Option<&EffectParameter> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &EffectParameter> {
        self.parameters.values()
    }

    /// Clamp-and-store a parameter value, returning the stored value
    pub fn set_parameter(&mut self, name: &str, value: f32) -> Result<f32> {
        let param = self
            .parameters
            .get_mut(name)
            .ok_or_else(|| DubmixError::UnknownParameter {
                effect: self.kind.to_string(),
                name: name.to_string(),
            })?;
        Ok(param.set_value(value))
    }

    /// Parameter value, falling back to the kind default when absent
    pub fn value(&self, name: &str) -> f32 {
        self.parameters
            .get(name)
            .map(|p| p.value())
            .unwrap_or_else(|| self.kind.default_value(name))
    }

    /// Resolve this configuration into a processor for one render
    pub fn build(&self, ctx: &ProcessContext) -> Box<dyn Effect> {
        match self.kind {
            EffectKind::Gain => Box::new(Gain::new(self.value("gain"))),
            EffectKind::Eq => Box::new(ShelfEq::new(
                self.value("low_gain"),
                self.value("high_gain"),
                ctx.sample_rate,
            )),
            EffectKind::Compressor => Box::new(Compressor::new(
                self.value("threshold"),
                self.value("ratio"),
            )),
            EffectKind::Reverb => Box::new(Reverb::new(
                self.value("room_size"),
                self.value("damping"),
                ctx,
            )),
            EffectKind::Delay => Box::new(Delay::new(
                self.value("delay_time"),
                self.value("feedback"),
                self.value("mix"),
                ctx.sample_rate,
            )),
            EffectKind::Filter => Box::new(Filter::new(
                FilterMode::from_parameter(self.value("filter_type")),
                self.value("cutoff"),
                ctx.sample_rate,
            )),
        }
    }
}

/// Graph-wide settings an effect needs at render time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: u32,
    pub reverb_seed: Option<u64>,
    pub fft_convolution_threshold: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            reverb_seed: None,
            fft_convolution_threshold: 1 << 20,
        }
    }
}

/// A resolved buffer -> buffer transform
///
/// `process` may leave the buffer in any state when it returns an error;
/// the chain always hands it a scratch copy and keeps the input on failure.
pub trait Effect: Send + Sync {
    /// Process audio buffer in-place
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()>;

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;
}
