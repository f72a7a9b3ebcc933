//! Duration probes

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use super::clip::MediaSource;
use crate::engine::wav_duration_secs;
use crate::error::{DubmixError, Result};

/// Looks up how long a source plays, in seconds
pub trait DurationProbe {
    fn duration_secs(&self, source: &MediaSource) -> Result<f64>;
}

/// Reads buffer lengths directly and WAV headers through hound
#[derive(Debug, Clone, Copy, Default)]
pub struct WavProbe;

impl DurationProbe for WavProbe {
    fn duration_secs(&self, source: &MediaSource) -> Result<f64> {
        match source {
            MediaSource::Buffer(buffer) => Ok(buffer.duration_secs()),
            MediaSource::File(path) => wav_duration_secs(path),
        }
    }
}

/// Asks `ffprobe` for the container duration of file sources
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn probe_file(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.program)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .output()
            .map_err(|e| tool_error(&self.program, e))?;

        if !output.status.success() {
            return Err(DubmixError::render(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = stdout.trim().parse::<f64>().map_err(|_| {
            DubmixError::render(format!(
                "ffprobe returned no duration for {}: '{}'",
                path.display(),
                stdout.trim()
            ))
        })?;
        debug!("Probed {}: {:.3}s", path.display(), duration);
        Ok(duration)
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl DurationProbe for FfprobeProbe {
    fn duration_secs(&self, source: &MediaSource) -> Result<f64> {
        match source {
            MediaSource::Buffer(buffer) => Ok(buffer.duration_secs()),
            MediaSource::File(path) => self.probe_file(path),
        }
    }
}

/// Map a spawn failure: a missing binary is reported as such
pub(crate) fn tool_error(program: &Path, error: std::io::Error) -> DubmixError {
    if error.kind() == ErrorKind::NotFound {
        DubmixError::ToolNotFound {
            tool: program.display().to_string(),
            source: error,
        }
    } else {
        DubmixError::Io(error)
    }
}
