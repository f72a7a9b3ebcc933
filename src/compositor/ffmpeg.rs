//! ffmpeg-backed renderer
//!
//! Input 0 is the background (a video file or audio); inputs 1..=N are the
//! clips. The filtergraph mutes the background inside every clip window,
//! ducks it across the same windows, delays each clip to its start and
//! sums everything with `amix`. Video, when present, is copied untouched.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};

use super::clip::{ClipDescriptor, MediaSource};
use super::plan::{RenderPlan, TimeWindow};
use super::probe::tool_error;
use super::Renderer;
use crate::config::CompositorConfig;
use crate::engine::{export_wav, ExportFormat};
use crate::error::{DubmixError, Result};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Label of the mixed audio stream
const OUTPUT_LABEL: &str = "out_a";

/// `between(t,a,b)` terms joined with `+`
fn window_expression<'a>(windows: impl Iterator<Item = &'a TimeWindow>) -> String {
    windows
        .map(|w| format!("between(t,{:.3},{:.3})", w.start, w.end))
        .collect::<Vec<_>>()
        .join("+")
}

/// Build the `-filter_complex` description for `plan`
pub fn filtergraph(plan: &RenderPlan) -> String {
    let mut chains = Vec::new();

    // Background lane
    let mutes: Vec<String> = plan
        .mute_windows()
        .map(|w| {
            format!(
                "volume=enable='between(t,{:.3},{:.3})':volume=0",
                w.start, w.end
            )
        })
        .collect();
    if mutes.is_empty() {
        chains.push("[0:a]anull[bg]".to_string());
    } else {
        chains.push(format!("[0:a]{}[bg]", mutes.join(",")));
    }

    // Clip lanes
    for (i, lane) in plan.lanes.iter().enumerate() {
        chains.push(format!(
            "[{}:a]adelay=delays={}:all=1[d{}]",
            i + 1,
            lane.delay_ms(),
            i
        ));
    }

    let duck = window_expression(plan.duck_windows());
    let background = if duck.is_empty() {
        "[bg]"
    } else {
        chains.push(format!(
            "[bg]volume=enable='{}':volume={:.3}[ducked]",
            duck, plan.duck_gain
        ));
        "[ducked]"
    };

    // Background first so `duration=first` follows its length
    let mut mix = background.to_string();
    for i in 0..plan.lanes.len() {
        let _ = write!(mix, "[d{}]", i);
    }
    let _ = write!(
        mix,
        "amix=inputs={}:duration=first:dropout_transition=0:normalize=0[{}]",
        plan.lanes.len() + 1,
        OUTPUT_LABEL
    );
    chains.push(mix);

    chains.join(";")
}

/// Renders through an external `ffmpeg` process into one output file
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    config: CompositorConfig,
    output: PathBuf,
}

impl FfmpegRenderer {
    pub fn new(config: CompositorConfig, output: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Check if the configured ffmpeg binary runs
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .is_ok()
    }

    /// Full argument list for one render
    pub fn arguments(&self, inputs: &[PathBuf], plan: &RenderPlan) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for input in inputs {
            args.push("-i".to_string());
            args.push(input.display().to_string());
        }
        args.extend([
            "-filter_complex".to_string(),
            filtergraph(plan),
            "-map".to_string(),
            "0:v?".to_string(),
            "-map".to_string(),
            format!("[{}]", OUTPUT_LABEL),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
            self.output.display().to_string(),
        ]);
        args
    }

    /// Resolve a source to a path, writing buffers to scratch WAVs
    fn materialize(&self, source: &MediaSource, scratch: &mut ScratchFiles) -> Result<PathBuf> {
        match source {
            MediaSource::File(path) => Ok(path.clone()),
            MediaSource::Buffer(buffer) => {
                let path = self.config.scratch_dir().join(format!(
                    "dubmix_{}_{}.wav",
                    process::id(),
                    SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed)
                ));
                scratch.paths.push(path.clone());
                export_wav(buffer, &path, ExportFormat::float())?;
                Ok(path)
            }
        }
    }
}

impl Renderer for FfmpegRenderer {
    fn render(
        &self,
        background: &MediaSource,
        clips: &[ClipDescriptor],
        plan: &RenderPlan,
    ) -> Result<MediaSource> {
        let mut scratch = ScratchFiles::default();
        let mut inputs = Vec::with_capacity(clips.len() + 1);
        inputs.push(self.materialize(background, &mut scratch)?);
        for clip in clips {
            inputs.push(self.materialize(&clip.source, &mut scratch)?);
        }

        let args = self.arguments(&inputs, plan);
        debug!("ffmpeg {}", args.join(" "));
        info!(
            "Executing ffmpeg surgery for {} segments into {}",
            clips.len(),
            self.output.display()
        );

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .output()
            .map_err(|e| tool_error(&self.config.ffmpeg_path, e))?;

        if !output.status.success() {
            return Err(DubmixError::render(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !self.output.exists() {
            return Err(DubmixError::render(format!(
                "ffmpeg produced no output at {}",
                self.output.display()
            )));
        }
        Ok(MediaSource::File(self.output.clone()))
    }
}

/// Scratch WAVs removed when the render finishes, successfully or not
#[derive(Default)]
struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove scratch file {}: {}", path.display(), e);
            }
        }
    }
}
