//! Bus graph
//!
//! Owns the five buses as a fixed arena indexed by [`BusId`]. All mutation
//! goes through [`BusGraph::apply`], which takes `&mut self`; rendering only
//! needs `&self`, so a render can never observe a half-applied command.

use chrono::Utc;
use log::{debug, info};

use super::bus::{BusConfiguration, BusId, BusState, BusStatus};
use super::command::Command;
use crate::config::MixerConfig;
use crate::dsp::{apply_pan, AudioEffect, EffectOutcome, ProcessContext};
use crate::engine::{AudioBuffer, MAX_CHANNELS};
use crate::error::{DubmixError, Result};

/// Summary of one render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixReport {
    /// Buses that contributed audio, in arena order
    pub contributing: Vec<BusId>,
    /// Pre-normalization peak of the summed signal
    pub peak: f32,
    /// Whether the anti-clip stage scaled the sum
    pub normalized: bool,
    /// Effects that failed and were passed through: (bus, index, reason)
    pub bypassed: Vec<(BusId, usize, String)>,
}

/// Multi-bus mixer
#[derive(Debug, Clone)]
pub struct BusGraph {
    config: MixerConfig,
    buses: [BusState; 5],
}

impl Default for BusGraph {
    fn default() -> Self {
        Self {
            config: MixerConfig::default(),
            buses: BusId::ALL.map(BusState::new),
        }
    }
}

impl BusGraph {
    pub fn new(config: MixerConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Bus graph created at {} Hz with {} buses",
            config.sample_rate,
            BusId::ALL.len()
        );
        Ok(Self {
            config,
            buses: BusId::ALL.map(BusState::new),
        })
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn bus(&self, id: BusId) -> &BusState {
        &self.buses[id.index()]
    }

    pub fn buses(&self) -> impl Iterator<Item = &BusState> {
        self.buses.iter()
    }

    /// Per-bus status snapshot in arena order
    pub fn status(&self) -> Vec<BusStatus> {
        self.buses.iter().map(BusStatus::from).collect()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Apply one command
    ///
    /// Validation happens before anything is written: a rejected command
    /// leaves the graph exactly as it was.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        debug!("Applying {} to {}", command.name(), command.bus());
        match command {
            Command::LoadAudio { bus, buffer } => self.load(bus, buffer),
            Command::SetVolume { bus, volume } => {
                let state = self.state_mut(bus);
                if !volume.is_nan() {
                    state.config.volume = volume.clamp(0.0, 1.0);
                }
                info!("Set {} volume to {:.2}", bus, state.config.volume);
                Ok(())
            }
            Command::SetPan { bus, pan } => {
                let state = self.state_mut(bus);
                if !pan.is_nan() {
                    state.config.pan = pan.clamp(-1.0, 1.0);
                }
                info!("Set {} pan to {:.2}", bus, state.config.pan);
                Ok(())
            }
            Command::SetMute { bus, mute } => {
                self.state_mut(bus).config.mute = mute;
                info!("{} {}", if mute { "Muted" } else { "Unmuted" }, bus);
                Ok(())
            }
            Command::SetSolo { bus, solo } => {
                self.state_mut(bus).config.solo = solo;
                if solo {
                    for other in self.buses.iter_mut() {
                        let id = other.id();
                        if id != bus && !id.is_master() {
                            other.config.mute = true;
                        }
                    }
                }
                info!("{} {}", if solo { "Soloed" } else { "Unsoloed" }, bus);
                Ok(())
            }
            Command::AddEffect { bus, effect } => {
                let kind = effect.kind();
                let index = self.state_mut(bus).config.effects.push(effect);
                info!("Added {} effect to {} at #{}", kind, bus, index);
                Ok(())
            }
            Command::RemoveEffect { bus, index } => {
                let effects = &mut self.state_mut(bus).config.effects;
                let len = effects.len();
                let removed = effects
                    .remove(index)
                    .ok_or_else(|| out_of_range(bus, index, len))?;
                info!("Removed {} effect #{} from {}", removed.kind(), index, bus);
                Ok(())
            }
            Command::UpdateEffectParameter {
                bus,
                index,
                name,
                value,
            } => {
                let stored = self.effect_mut(bus, index)?.set_parameter(&name, value)?;
                info!("Set {} effect #{} {} to {}", bus, index, name, stored);
                Ok(())
            }
            Command::SetEffectEnabled {
                bus,
                index,
                enabled,
            } => {
                self.effect_mut(bus, index)?.enabled = enabled;
                info!(
                    "{} {} effect #{}",
                    if enabled { "Enabled" } else { "Disabled" },
                    bus,
                    index
                );
                Ok(())
            }
            Command::SetRouting { bus, targets } => {
                BusConfiguration::validate_routing(bus, &targets)?;
                info!("Routed {} to {:?}", bus, targets);
                self.state_mut(bus).config.routing = targets;
                Ok(())
            }
            Command::ReplaceConfiguration { config } => {
                BusConfiguration::validate_routing(config.bus_id, &config.routing)?;
                let bus = config.bus_id;
                let mut config = config;
                config.volume = clamp_or(config.volume, 0.0, 1.0, 1.0);
                config.pan = clamp_or(config.pan, -1.0, 1.0, 0.0);
                self.state_mut(bus).config = config;
                info!("Replaced {} configuration", bus);
                Ok(())
            }
        }
    }

    pub fn load_audio(&mut self, bus: BusId, buffer: AudioBuffer) -> Result<()> {
        self.apply(Command::LoadAudio { bus, buffer })
    }

    pub fn set_volume(&mut self, bus: BusId, volume: f32) -> Result<()> {
        self.apply(Command::SetVolume { bus, volume })
    }

    pub fn set_pan(&mut self, bus: BusId, pan: f32) -> Result<()> {
        self.apply(Command::SetPan { bus, pan })
    }

    pub fn set_mute(&mut self, bus: BusId, mute: bool) -> Result<()> {
        self.apply(Command::SetMute { bus, mute })
    }

    pub fn set_solo(&mut self, bus: BusId, solo: bool) -> Result<()> {
        self.apply(Command::SetSolo { bus, solo })
    }

    pub fn add_effect(&mut self, bus: BusId, effect: AudioEffect) -> Result<()> {
        self.apply(Command::AddEffect { bus, effect })
    }

    pub fn remove_effect(&mut self, bus: BusId, index: usize) -> Result<()> {
        self.apply(Command::RemoveEffect { bus, index })
    }

    pub fn update_effect_parameter(
        &mut self,
        bus: BusId,
        index: usize,
        name: &str,
        value: f32,
    ) -> Result<()> {
        self.apply(Command::UpdateEffectParameter {
            bus,
            index,
            name: name.to_string(),
            value,
        })
    }

    fn load(&mut self, bus: BusId, buffer: AudioBuffer) -> Result<()> {
        if buffer.channels() == 0 || buffer.is_empty() {
            return Err(DubmixError::InvalidAudio {
                reason: format!("empty buffer loaded into {}", bus),
            });
        }
        if buffer.channels() > MAX_CHANNELS {
            return Err(DubmixError::InvalidAudio {
                reason: format!(
                    "{} channels loaded into {}, at most {} supported",
                    buffer.channels(),
                    bus,
                    MAX_CHANNELS
                ),
            });
        }
        if buffer.sample_rate == 0 {
            return Err(DubmixError::InvalidAudio {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let source_rate = buffer.sample_rate;
        let buffer = buffer.resampled(self.config.sample_rate).into_stereo();
        info!(
            "Loaded {:.2}s into {} ({} Hz -> {} Hz)",
            buffer.duration_secs(),
            bus,
            source_rate,
            self.config.sample_rate
        );

        let state = self.state_mut(bus);
        state.buffer = Some(buffer);
        state.is_active = true;
        state.last_update = Some(Utc::now());
        Ok(())
    }

    fn state_mut(&mut self, bus: BusId) -> &mut BusState {
        &mut self.buses[bus.index()]
    }

    fn effect_mut(&mut self, bus: BusId, index: usize) -> Result<&mut AudioEffect> {
        let effects = &mut self.state_mut(bus).config.effects;
        let len = effects.len();
        effects
            .get_mut(index)
            .ok_or_else(|| out_of_range(bus, index, len))
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Mix every audible bus down to one buffer
    pub fn render(&self) -> AudioBuffer {
        self.render_with_report().0
    }

    /// Mix every audible bus down to one buffer and report what happened
    ///
    /// Each audible bus runs its chain, then volume, then pan. The sum is
    /// scaled down to `normalize_peak` when its peak exceeds `clip_ceiling`,
    /// and the master chain, volume and pan are applied afterwards only when
    /// master carries effects.
    pub fn render_with_report(&self) -> (AudioBuffer, MixReport) {
        let ctx = self.process_context();
        let mut report = MixReport::default();
        let mut rendered = Vec::new();

        for state in self.buses.iter().filter(|s| s.is_audible()) {
            if let Some(buffer) = &state.buffer {
                let id = state.id();
                rendered.push(self.process_bus(id, &state.config, buffer.clone(), &ctx, &mut report));
                report.contributing.push(id);
            }
        }

        let Some(first) = rendered.first() else {
            debug!("No audible buses, rendering silence");
            return (self.silence(), report);
        };

        let (channels, len) = first.shape();
        let mut mix = AudioBuffer::silence(channels, len, self.config.sample_rate);
        for buffer in &rendered {
            if buffer.shape() == (channels, len) {
                mix.mix_in(buffer, 0);
            } else {
                mix.mix_in(&buffer.fit_to(channels, len), 0);
            }
        }

        report.peak = mix.peak();
        if report.peak > self.config.clip_ceiling {
            mix.scale(self.config.normalize_peak / report.peak);
            report.normalized = true;
            debug!(
                "Normalized mix peak {:.3} -> {:.3}",
                report.peak, self.config.normalize_peak
            );
        }

        let master = self.bus(BusId::Master);
        if !master.config.effects.is_empty() {
            mix = self.process_bus(BusId::Master, &master.config, mix, &ctx, &mut report);
        }

        debug!(
            "Rendered {} samples from {} buses",
            mix.len(),
            report.contributing.len()
        );
        (mix, report)
    }

    fn process_bus(
        &self,
        id: BusId,
        config: &BusConfiguration,
        mut buffer: AudioBuffer,
        ctx: &ProcessContext,
        report: &mut MixReport,
    ) -> AudioBuffer {
        let outcomes = config.effects.process(&mut buffer, ctx);
        for (index, outcome) in outcomes.into_iter().enumerate() {
            if let EffectOutcome::Bypassed(reason) = outcome {
                report.bypassed.push((id, index, reason));
            }
        }
        buffer.scale(config.volume);
        if config.pan != 0.0 {
            apply_pan(&mut buffer, config.pan);
        }
        buffer
    }

    fn process_context(&self) -> ProcessContext {
        ProcessContext {
            sample_rate: self.config.sample_rate,
            reverb_seed: self.config.reverb_seed,
            fft_convolution_threshold: self.config.fft_convolution_threshold,
        }
    }

    fn silence(&self) -> AudioBuffer {
        AudioBuffer::silence(MAX_CHANNELS, self.config.buffer_size, self.config.sample_rate)
    }
}

fn out_of_range(bus: BusId, index: usize, len: usize) -> DubmixError {
    DubmixError::EffectIndexOutOfRange {
        bus: bus.to_string(),
        index,
        len,
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
