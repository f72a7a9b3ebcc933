//! Bus identifiers, configuration and live state

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dsp::EffectChain;
use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

/// The five fixed buses of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusId {
    #[serde(rename = "voice_bus")]
    Voice,
    #[serde(rename = "music_bus")]
    Music,
    #[serde(rename = "sfx_bus")]
    Sfx,
    #[serde(rename = "env_bus")]
    Environment,
    #[serde(rename = "master_bus")]
    Master,
}

impl BusId {
    /// All buses in arena order
    pub const ALL: [BusId; 5] = [
        BusId::Voice,
        BusId::Music,
        BusId::Sfx,
        BusId::Environment,
        BusId::Master,
    ];

    /// Slot of this bus in the graph arena
    pub fn index(self) -> usize {
        match self {
            BusId::Voice => 0,
            BusId::Music => 1,
            BusId::Sfx => 2,
            BusId::Environment => 3,
            BusId::Master => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BusId::Voice => "voice_bus",
            BusId::Music => "music_bus",
            BusId::Sfx => "sfx_bus",
            BusId::Environment => "env_bus",
            BusId::Master => "master_bus",
        }
    }

    pub fn is_master(self) -> bool {
        self == BusId::Master
    }

    /// Routing a freshly built bus starts with
    pub fn default_routing(self) -> Vec<BusId> {
        if self.is_master() {
            Vec::new()
        } else {
            vec![BusId::Master]
        }
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusId {
    type Err = DubmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voice_bus" | "voice" => Ok(BusId::Voice),
            "music_bus" | "music" => Ok(BusId::Music),
            "sfx_bus" | "sfx" => Ok(BusId::Sfx),
            "env_bus" | "env" | "environment" => Ok(BusId::Environment),
            "master_bus" | "master" => Ok(BusId::Master),
            _ => Err(DubmixError::UnknownBus {
                name: s.to_string(),
            }),
        }
    }
}

/// Mix settings of one bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfiguration {
    pub bus_id: BusId,
    /// Linear gain in [0, 1]
    pub volume: f32,
    /// Stereo position in [-1, 1]
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub effects: EffectChain,
    /// Destination buses
    pub routing: Vec<BusId>,
}

impl BusConfiguration {
    pub fn new(bus_id: BusId) -> Self {
        Self {
            bus_id,
            volume: 1.0,
            pan: 0.0,
            mute: false,
            solo: false,
            effects: EffectChain::new(),
            routing: bus_id.default_routing(),
        }
    }

    /// Reject routings that target the bus itself or name a bus twice
    pub fn validate_routing(bus_id: BusId, routing: &[BusId]) -> Result<()> {
        if routing.contains(&bus_id) {
            return Err(DubmixError::InvalidRouting {
                bus: bus_id.to_string(),
                reason: "a bus cannot route to itself".to_string(),
            });
        }
        for (i, target) in routing.iter().enumerate() {
            if routing[..i].contains(target) {
                return Err(DubmixError::InvalidRouting {
                    bus: bus_id.to_string(),
                    reason: format!("{} listed twice", target),
                });
            }
        }
        Ok(())
    }
}

/// Arena slot: configuration plus the live buffer
#[derive(Debug, Clone)]
pub struct BusState {
    pub config: BusConfiguration,
    pub buffer: Option<AudioBuffer>,
    pub is_active: bool,
    pub last_update: Option<DateTime<Utc>>,
}

impl BusState {
    pub fn new(bus_id: BusId) -> Self {
        Self {
            config: BusConfiguration::new(bus_id),
            buffer: None,
            is_active: false,
            last_update: None,
        }
    }

    pub fn id(&self) -> BusId {
        self.config.bus_id
    }

    /// Active, unmuted and holding audio
    pub fn is_audible(&self) -> bool {
        self.is_active && !self.config.mute && self.buffer.is_some()
    }
}

/// Snapshot of one bus for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStatus {
    pub bus_id: BusId,
    pub is_active: bool,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub effects_count: usize,
    pub last_update: Option<DateTime<Utc>>,
}

impl From<&BusState> for BusStatus {
    fn from(state: &BusState) -> Self {
        Self {
            bus_id: state.id(),
            is_active: state.is_active,
            volume: state.config.volume,
            pan: state.config.pan,
            mute: state.config.mute,
            solo: state.config.solo,
            effects_count: state.config.effects.len(),
            last_update: state.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, bus) in BusId::ALL.iter().enumerate() {
            assert_eq!(bus.index(), i);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("voice_bus".parse::<BusId>().unwrap(), BusId::Voice);
        assert_eq!("ENV".parse::<BusId>().unwrap(), BusId::Environment);
        let err = "drums_bus".parse::<BusId>().unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_BUS");
    }

    #[test]
    fn test_default_routing() {
        assert_eq!(BusConfiguration::new(BusId::Sfx).routing, vec![BusId::Master]);
        assert!(BusConfiguration::new(BusId::Master).routing.is_empty());
    }

    #[test]
    fn test_routing_validation() {
        assert!(BusConfiguration::validate_routing(BusId::Master, &[BusId::Master]).is_err());
        assert!(
            BusConfiguration::validate_routing(BusId::Voice, &[BusId::Music, BusId::Music]).is_err()
        );
        assert!(BusConfiguration::validate_routing(BusId::Voice, &[BusId::Master]).is_ok());
    }
}
