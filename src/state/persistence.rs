//! Bus configuration documents
//!
//! A document is a JSON object keyed by bus name (`voice_bus`, ...). Each
//! section carries volume, pan, mute, solo, routing and every effect with
//! its full parameter bounds. Loading is all-or-nothing per bus: a section
//! that fails to parse or validate is skipped and that bus keeps its
//! current configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsp::{AudioEffect, EffectChain, EffectKind, EffectParameter};
use crate::error::{DubmixError, Result};
use crate::mixer::{BusConfiguration, BusGraph, BusId, Command};

/// One effect parameter with its bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSection {
    pub value: f32,
    pub min_value: f32,
    pub max_value: f32,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

/// One effect of a bus chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSection {
    pub effect_type: EffectKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSection>,
}

/// Saved configuration of one bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSection {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub pan: f32,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub effects: Vec<EffectSection>,
    #[serde(default)]
    pub routing: Vec<BusId>,
}

/// Whole document, ordered by bus
pub type ConfigDocument = BTreeMap<BusId, BusSection>;

/// Outcome of restoring a document into a graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Buses whose configuration was replaced
    pub applied: Vec<BusId>,
    /// Sections left out: (document key, reason)
    pub skipped: Vec<(String, String)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&EffectParameter> for ParameterSection {
    fn from(param: &EffectParameter) -> Self {
        Self {
            value: param.value(),
            min_value: param.min_value(),
            max_value: param.max_value(),
            unit: param.unit().to_string(),
            description: param.description().to_string(),
        }
    }
}

impl From<&AudioEffect> for EffectSection {
    fn from(effect: &AudioEffect) -> Self {
        Self {
            effect_type: effect.kind(),
            enabled: effect.enabled,
            order: effect.order(),
            parameters: effect
                .parameters()
                .map(|p| (p.name().to_string(), ParameterSection::from(p)))
                .collect(),
        }
    }
}

impl EffectSection {
    pub fn to_effect(&self) -> AudioEffect {
        let parameters = self
            .parameters
            .iter()
            .map(|(name, p)| {
                EffectParameter::new(name, p.value, p.min_value, p.max_value, &p.unit)
                    .with_description(&p.description)
            })
            .collect();
        let mut effect = AudioEffect::with_parameters(self.effect_type, parameters);
        effect.enabled = self.enabled;
        effect.set_order(self.order);
        effect
    }
}

impl From<&BusConfiguration> for BusSection {
    fn from(config: &BusConfiguration) -> Self {
        Self {
            volume: config.volume,
            pan: config.pan,
            mute: config.mute,
            solo: config.solo,
            effects: config.effects.iter().map(EffectSection::from).collect(),
            routing: config.routing.clone(),
        }
    }
}

impl BusSection {
    pub fn to_configuration(&self, bus_id: BusId) -> Result<BusConfiguration> {
        if !self.volume.is_finite() || !self.pan.is_finite() {
            return Err(DubmixError::MalformedDocument {
                reason: format!("{} volume and pan must be finite", bus_id),
            });
        }
        BusConfiguration::validate_routing(bus_id, &self.routing)?;
        Ok(BusConfiguration {
            bus_id,
            volume: self.volume.clamp(0.0, 1.0),
            pan: self.pan.clamp(-1.0, 1.0),
            mute: self.mute,
            solo: self.solo,
            effects: EffectChain::from_effects(
                self.effects.iter().map(EffectSection::to_effect).collect(),
            ),
            routing: self.routing.clone(),
        })
    }
}

// ============================================================================
// Document I/O
// ============================================================================

/// Snapshot every bus of `graph`
pub fn to_document(graph: &BusGraph) -> ConfigDocument {
    graph
        .buses()
        .map(|state| (state.id(), BusSection::from(&state.config)))
        .collect()
}

/// Restore a parsed JSON document into `graph`, bus by bus
pub fn apply_document(graph: &mut BusGraph, document: &Value) -> Result<LoadReport> {
    let sections = document
        .as_object()
        .ok_or_else(|| DubmixError::MalformedDocument {
            reason: "top level must be an object keyed by bus".to_string(),
        })?;

    let mut report = LoadReport::default();
    for (key, section) in sections {
        match restore_section(graph, key, section) {
            Ok(bus) => report.applied.push(bus),
            Err(e) => {
                warn!("Skipping configuration section '{}': {}", key, e);
                report.skipped.push((key.clone(), e.to_string()));
            }
        }
    }
    Ok(report)
}

fn restore_section(graph: &mut BusGraph, key: &str, section: &Value) -> Result<BusId> {
    let bus: BusId = key.parse()?;
    let section: BusSection = serde_json::from_value(section.clone())?;
    let config = section.to_configuration(bus)?;
    graph.apply(Command::ReplaceConfiguration { config })?;
    Ok(bus)
}

/// Write the configuration of every bus to `path` as pretty JSON
pub fn save_configuration(graph: &BusGraph, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&to_document(graph))?;
    fs::write(path, content).map_err(|e| DubmixError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Saved bus configuration to {}", path.display());
    Ok(())
}

/// Restore a configuration written by [`save_configuration`]
///
/// Unreadable files and invalid JSON fail the whole load; bad sections
/// inside a valid document are reported in the returned [`LoadReport`].
pub fn load_configuration(graph: &mut BusGraph, path: &Path) -> Result<LoadReport> {
    let content = fs::read_to_string(path).map_err(|e| DubmixError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document: Value = serde_json::from_str(&content)?;
    let report = apply_document(graph, &document)?;
    info!(
        "Loaded bus configuration from {} ({} applied, {} skipped)",
        path.display(),
        report.applied.len(),
        report.skipped.len()
    );
    Ok(report)
}
