//! Compositor inputs

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

/// A track handed to the compositor: a file on disk or samples in memory
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    File(PathBuf),
    Buffer(AudioBuffer),
}

impl MediaSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaSource::File(path) => Some(path),
            MediaSource::Buffer(_) => None,
        }
    }

    pub fn buffer(&self) -> Option<&AudioBuffer> {
        match self {
            MediaSource::File(_) => None,
            MediaSource::Buffer(buffer) => Some(buffer),
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            MediaSource::File(path) => path.display().to_string(),
            MediaSource::Buffer(buffer) => format!(
                "<{} ch, {:.3}s buffer>",
                buffer.channels(),
                buffer.duration_secs()
            ),
        }
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        MediaSource::File(path)
    }
}

impl From<AudioBuffer> for MediaSource {
    fn from(buffer: AudioBuffer) -> Self {
        MediaSource::Buffer(buffer)
    }
}

/// One replacement dialogue clip and where it lands on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDescriptor {
    pub source: MediaSource,
    /// Seconds from the start of the background
    pub start_time: f64,
}

impl ClipDescriptor {
    pub fn new(source: impl Into<MediaSource>, start_time: f64) -> Self {
        Self {
            source: source.into(),
            start_time,
        }
    }

    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(DubmixError::InvalidClip {
                index,
                reason: format!("start time {} must be finite and non-negative", self.start_time),
            });
        }
        if let MediaSource::Buffer(buffer) = &self.source {
            if buffer.sample_rate == 0 {
                return Err(DubmixError::InvalidClip {
                    index,
                    reason: "buffer sample rate must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Parses `path@seconds`, e.g. `line_03.wav@12.5`
impl FromStr for ClipDescriptor {
    type Err = DubmixError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| DubmixError::InvalidClip {
            index: 0,
            reason: format!("'{}': {}", s, reason),
        };
        let (path, start) = s
            .rsplit_once('@')
            .ok_or_else(|| invalid("expected <path>@<seconds>"))?;
        if path.is_empty() {
            return Err(invalid("missing path"));
        }
        let start_time: f64 = start
            .trim()
            .parse()
            .map_err(|_| invalid("start time is not a number"))?;
        let clip = ClipDescriptor::new(PathBuf::from(path), start_time);
        clip.validate(0)?;
        Ok(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clip_argument() {
        let clip: ClipDescriptor = "dub/line@01.wav@12.5".parse().unwrap();
        assert_eq!(clip.source.path(), Some(Path::new("dub/line@01.wav")));
        assert_eq!(clip.start_time, 12.5);
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert!("line.wav".parse::<ClipDescriptor>().is_err());
        assert!("line.wav@soon".parse::<ClipDescriptor>().is_err());
        assert!("line.wav@-1".parse::<ClipDescriptor>().is_err());
        assert!("@3".parse::<ClipDescriptor>().is_err());
    }

    #[test]
    fn test_validate_start_time() {
        let clip = ClipDescriptor::new(AudioBuffer::from_mono(vec![0.0; 4], 8000), f64::NAN);
        let err = clip.validate(3).unwrap_err();
        assert!(matches!(err, DubmixError::InvalidClip { index: 3, .. }));
    }
}
