//! Mutations accepted by a bus graph
//!
//! Every configuration change reaches a graph as one of these commands
//! through [`BusGraph::apply`](crate::mixer::BusGraph::apply).

use super::bus::{BusConfiguration, BusId};
use crate::dsp::AudioEffect;
use crate::engine::AudioBuffer;

#[derive(Debug, Clone)]
pub enum Command {
    /// Resample to the graph rate, promote to stereo and mark active
    LoadAudio { bus: BusId, buffer: AudioBuffer },
    /// Stored clamped to [0, 1]
    SetVolume { bus: BusId, volume: f32 },
    /// Stored clamped to [-1, 1]
    SetPan { bus: BusId, pan: f32 },
    SetMute { bus: BusId, mute: bool },
    /// Soloing mutes every other non-master bus; unsoloing restores nothing
    SetSolo { bus: BusId, solo: bool },
    AddEffect { bus: BusId, effect: AudioEffect },
    RemoveEffect { bus: BusId, index: usize },
    UpdateEffectParameter {
        bus: BusId,
        index: usize,
        name: String,
        value: f32,
    },
    SetEffectEnabled { bus: BusId, index: usize, enabled: bool },
    SetRouting { bus: BusId, targets: Vec<BusId> },
    /// Swap in a whole configuration at once (used when restoring)
    ReplaceConfiguration { config: BusConfiguration },
}

impl Command {
    /// Bus the command targets
    pub fn bus(&self) -> BusId {
        match self {
            Command::LoadAudio { bus, .. }
            | Command::SetVolume { bus, .. }
            | Command::SetPan { bus, .. }
            | Command::SetMute { bus, .. }
            | Command::SetSolo { bus, .. }
            | Command::AddEffect { bus, .. }
            | Command::RemoveEffect { bus, .. }
            | Command::UpdateEffectParameter { bus, .. }
            | Command::SetEffectEnabled { bus, .. }
            | Command::SetRouting { bus, .. } => *bus,
            Command::ReplaceConfiguration { config } => config.bus_id,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadAudio { .. } => "load_audio",
            Command::SetVolume { .. } => "set_volume",
            Command::SetPan { .. } => "set_pan",
            Command::SetMute { .. } => "set_mute",
            Command::SetSolo { .. } => "set_solo",
            Command::AddEffect { .. } => "add_effect",
            Command::RemoveEffect { .. } => "remove_effect",
            Command::UpdateEffectParameter { .. } => "update_effect_parameter",
            Command::SetEffectEnabled { .. } => "set_effect_enabled",
            Command::SetRouting { .. } => "set_routing",
            Command::ReplaceConfiguration { .. } => "replace_configuration",
        }
    }
}
