//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::compositor::{ClipDescriptor, MediaSource, TimelineCompositor};
use crate::config::{CompositorConfig, MixerConfig};
use crate::engine::{export_wav, import_wav, ExportFormat};
use crate::error::{DubmixError, Result};
use crate::mixer::{BusGraph, BusId, BusStatus};
use crate::state::{load_configuration, save_configuration};

/// Write the configuration of a fresh graph to `path`.
pub fn init_config(path: &Path) -> Result<()> {
    let graph = BusGraph::default();
    save_configuration(&graph, path)?;
    println!("Configuration written: {}", path.display());
    Ok(())
}

/// Print per-bus status after applying a configuration document.
pub fn status(config: &Path) -> Result<()> {
    let mut graph = BusGraph::default();
    let report = load_configuration(&mut graph, config)?;
    for (key, reason) in &report.skipped {
        println!("Skipped {}: {}", key, reason);
    }
    print_status(&graph.status());
    Ok(())
}

fn print_status(status: &[BusStatus]) {
    println!(
        "{:<12} {:>6} {:>6} {:>6} {:>5} {:>5} {:>7}",
        "bus", "active", "volume", "pan", "mute", "solo", "effects"
    );
    println!("{:-<54}", "");
    for bus in status {
        println!(
            "{:<12} {:>6} {:>6.2} {:>6.2} {:>5} {:>5} {:>7}",
            bus.bus_id.as_str(),
            bus.is_active,
            bus.volume,
            bus.pan,
            bus.mute,
            bus.solo,
            bus.effects_count
        );
    }
}

/// Stems handed to `mix`, by bus
#[derive(Debug, Default)]
pub struct Stems {
    pub voice: Option<PathBuf>,
    pub music: Option<PathBuf>,
    pub sfx: Option<PathBuf>,
    pub env: Option<PathBuf>,
}

impl Stems {
    fn iter(&self) -> impl Iterator<Item = (BusId, &Path)> {
        [
            (BusId::Voice, self.voice.as_deref()),
            (BusId::Music, self.music.as_deref()),
            (BusId::Sfx, self.sfx.as_deref()),
            (BusId::Environment, self.env.as_deref()),
        ]
        .into_iter()
        .filter_map(|(bus, path)| path.map(|p| (bus, p)))
    }
}

/// Load stems into the bus graph, render and write the mix.
pub fn mix(
    config: Option<&Path>,
    settings: Option<&Path>,
    stems: &Stems,
    output: &Path,
    bit_depth: u16,
) -> Result<()> {
    let settings = match settings {
        Some(path) => MixerConfig::from_file(path)?,
        None => MixerConfig::default(),
    };
    let mut graph = BusGraph::new(settings)?;

    if let Some(path) = config {
        let report = load_configuration(&mut graph, path)?;
        for (key, reason) in &report.skipped {
            warn!("Configuration section {} skipped: {}", key, reason);
        }
    }

    let mut loaded = 0;
    for (bus, path) in stems.iter() {
        info!("Loading {} into {}", path.display(), bus);
        graph.load_audio(bus, import_wav(path)?)?;
        loaded += 1;
    }
    if loaded == 0 {
        warn!("No stems given, the mix will be silent");
    }

    let (buffer, report) = graph.render_with_report();
    for (bus, index, reason) in &report.bypassed {
        println!("Bypassed {} effect #{}: {}", bus, index, reason);
    }
    export_wav(&buffer, output, ExportFormat::new(bit_depth))?;

    println!(
        "Mixed {} buses into {} ({:.2}s{})",
        report.contributing.len(),
        output.display(),
        buffer.duration_secs(),
        if report.normalized { ", normalized" } else { "" }
    );
    Ok(())
}

/// Options for `surgery` beyond the inputs
#[derive(Debug, Default)]
pub struct SurgeryOptions {
    pub config: Option<PathBuf>,
    pub no_duck: bool,
    pub duck_attenuation: Option<f32>,
    pub offline: bool,
}

/// Replace dialogue in a background track with the given clips.
pub fn surgery(
    background: &Path,
    clips: Vec<ClipDescriptor>,
    output: &Path,
    options: &SurgeryOptions,
) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => CompositorConfig::from_file(path)?,
        None => CompositorConfig::default(),
    };
    if options.no_duck {
        config.ducking = false;
    }
    if let Some(attenuation) = options.duck_attenuation {
        config.duck_attenuation = attenuation;
    }

    let background = MediaSource::File(background.to_path_buf());
    let count = clips.len();

    let result = if options.offline {
        let compositor = TimelineCompositor::offline(config)?;
        match compositor.render(&background, clips)? {
            MediaSource::Buffer(buffer) => {
                export_wav(&buffer, output, ExportFormat::default())?;
            }
            MediaSource::File(path) => {
                std::fs::copy(&path, output).map_err(|e| DubmixError::FileWriteError {
                    path: output.to_path_buf(),
                    source: e,
                })?;
            }
        }
        output.to_path_buf()
    } else {
        let compositor = TimelineCompositor::external(config, output)?;
        match compositor.render(&background, clips)? {
            MediaSource::File(path) => path,
            MediaSource::Buffer(_) => output.to_path_buf(),
        }
    };

    println!("Replaced {} segments: {}", count, result.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;
    use tempfile::tempdir;

    #[test]
    fn test_init_config_then_status() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.json");
        init_config(&path).unwrap();
        assert!(path.exists());
        status(&path).unwrap();
    }

    #[test]
    fn test_mix_writes_output() {
        let dir = tempdir().unwrap();
        let voice = dir.path().join("voice.wav");
        let output = dir.path().join("mix.wav");
        export_wav(
            &AudioBuffer::from_mono(vec![0.25; 4410], 44100),
            &voice,
            ExportFormat::float(),
        )
        .unwrap();

        let stems = Stems {
            voice: Some(voice),
            ..Stems::default()
        };
        mix(None, None, &stems, &output, 16).unwrap();

        let mixed = import_wav(&output).unwrap();
        assert_eq!(mixed.channels(), 2);
        assert_eq!(mixed.len(), 4410);
    }

    #[test]
    fn test_offline_surgery() {
        let dir = tempdir().unwrap();
        let background = dir.path().join("bg.wav");
        let line = dir.path().join("line.wav");
        let output = dir.path().join("out.wav");
        export_wav(
            &AudioBuffer::from_mono(vec![0.5; 8000], 8000),
            &background,
            ExportFormat::float(),
        )
        .unwrap();
        export_wav(
            &AudioBuffer::from_mono(vec![0.1; 800], 8000),
            &line,
            ExportFormat::float(),
        )
        .unwrap();

        let options = SurgeryOptions {
            offline: true,
            ..SurgeryOptions::default()
        };
        surgery(
            &background,
            vec![ClipDescriptor::new(line, 0.5)],
            &output,
            &options,
        )
        .unwrap();

        let out = import_wav(&output).unwrap();
        assert_eq!(out.len(), 8000);
        assert!((out.samples[0][4200] - 0.1).abs() < 1e-3);
        assert!((out.samples[0][100] - 0.5).abs() < 1e-3);
    }
}
