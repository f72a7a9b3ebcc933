//! Runtime configuration
//!
//! Both configurations are plain serde structs; every field has a default
//! so partial JSON documents are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compositor::OverlapPolicy;
use crate::engine::DEFAULT_SAMPLE_RATE;
use crate::error::{DubmixError, Result};

/// Settings for one bus graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Graph sample rate; loaded audio is resampled to it
    pub sample_rate: u32,
    /// Length of the silent buffer returned when nothing is audible
    pub buffer_size: usize,
    /// Peak above which the summed mix is normalized
    pub clip_ceiling: f32,
    /// Peak the summed mix is scaled to when it exceeds `clip_ceiling`
    pub normalize_peak: f32,
    /// Signal x impulse length above which reverb switches to FFT convolution
    pub fft_convolution_threshold: usize,
    /// Fixed seed for reverb impulse responses (random when unset)
    pub reverb_seed: Option<u64>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: 1024,
            clip_ceiling: 1.0,
            normalize_peak: 0.95,
            fft_convolution_threshold: 1 << 20,
            reverb_seed: None,
        }
    }
}

impl MixerConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_reverb_seed(mut self, seed: u64) -> Self {
        self.reverb_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        if !(self.clip_ceiling > 0.0) {
            return Err(invalid("clip_ceiling must be positive"));
        }
        if !(self.normalize_peak > 0.0 && self.normalize_peak <= self.clip_ceiling) {
            return Err(invalid("normalize_peak must be in (0, clip_ceiling]"));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings for the timeline compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Attenuate the background across clip windows
    pub ducking: bool,
    /// Fraction removed from the background while ducked (0.2 keeps 80%)
    pub duck_attenuation: f32,
    /// What to do when two clip windows overlap
    pub overlap_policy: OverlapPolicy,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Where in-memory clips are written before an external render
    pub scratch_dir: Option<PathBuf>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            ducking: true,
            duck_attenuation: 0.2,
            overlap_policy: OverlapPolicy::Reject,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            scratch_dir: None,
        }
    }
}

impl CompositorConfig {
    /// Gain applied to the background inside duck windows
    pub fn duck_gain(&self) -> f32 {
        1.0 - self.duck_attenuation
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.duck_attenuation) {
            return Err(invalid("duck_attenuation must be in [0, 1]"));
        }
        if self.audio_codec.trim().is_empty() {
            return Err(invalid("audio_codec must not be empty"));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(reason: &str) -> DubmixError {
    DubmixError::InvalidConfig {
        reason: reason.to_string(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| DubmixError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MixerConfig::default().validate().is_ok());
        assert!(CompositorConfig::default().validate().is_ok());
        assert!((CompositorConfig::default().duck_gain() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sample_rate": 48000, "reverb_seed": 7}}"#).unwrap();

        let config = MixerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.reverb_seed, Some(7));
        assert_eq!(config.buffer_size, 1024);
    }

    #[test]
    fn test_rejects_bad_duck_attenuation() {
        let config = CompositorConfig {
            duck_attenuation: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_overlap_policy_parses_snake_case() {
        let config: CompositorConfig = serde_json::from_str(r#"{"overlap_policy": "mix"}"#).unwrap();
        assert_eq!(config.overlap_policy, OverlapPolicy::Mix);
    }
}
