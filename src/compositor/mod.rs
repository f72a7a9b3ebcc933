//! Timeline compositor (surgical dialogue replacement)
//!
//! Lays replacement dialogue clips over a continuous background track. The
//! background is silenced only inside the clip windows, each clip is
//! delayed onto its window, and the lanes are summed by a [`Renderer`].
//!
//! The compositor is independent of the bus graph. Every call builds a
//! fresh [`RenderPlan`], renders it and drops it.

mod clip;
mod ffmpeg;
mod offline;
mod plan;
mod probe;

pub use clip::{ClipDescriptor, MediaSource};
pub use ffmpeg::{filtergraph, FfmpegRenderer};
pub use offline::OfflineRenderer;
pub use plan::{ClipLane, OverlapPolicy, RenderPlan, TimeWindow};
pub use probe::{DurationProbe, FfprobeProbe, WavProbe};

use std::path::PathBuf;

use log::{info, warn};

use crate::config::CompositorConfig;
use crate::error::Result;

/// Turns a background, its clips and a plan into one output
///
/// A render either completes or fails as a whole; nothing is retried.
pub trait Renderer {
    fn render(
        &self,
        background: &MediaSource,
        clips: &[ClipDescriptor],
        plan: &RenderPlan,
    ) -> Result<MediaSource>;
}

pub struct TimelineCompositor<P, R> {
    config: CompositorConfig,
    probe: P,
    renderer: R,
}

impl<P: DurationProbe, R: Renderer> TimelineCompositor<P, R> {
    pub fn new(config: CompositorConfig, probe: P, renderer: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            probe,
            renderer,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Clip duration in seconds; a failed probe counts as 0.0
    pub fn clip_duration(&self, clip: &ClipDescriptor) -> f64 {
        match self.probe.duration_secs(&clip.source) {
            Ok(duration) => duration,
            Err(e) => {
                warn!(
                    "Could not probe {}, treating it as 0.0s: {}",
                    clip.source.describe(),
                    e
                );
                0.0
            }
        }
    }

    /// Probe every clip and build the plan without rendering
    pub fn plan(&self, clips: &[ClipDescriptor]) -> Result<RenderPlan> {
        let durations: Vec<f64> = clips.iter().map(|c| self.clip_duration(c)).collect();
        RenderPlan::build(clips, &durations, &self.config)
    }

    /// Replace dialogue in `background` with `clips`
    ///
    /// With no clips the background is returned unchanged and nothing
    /// external runs.
    pub fn render(
        &self,
        background: &MediaSource,
        clips: Vec<ClipDescriptor>,
    ) -> Result<MediaSource> {
        if clips.is_empty() {
            warn!("No clips to mix, returning the background unchanged");
            return Ok(background.clone());
        }

        let plan = self.plan(&clips)?;
        info!(
            "Compositing {} clips over {}",
            clips.len(),
            background.describe()
        );
        self.renderer.render(background, &clips, &plan)
    }
}

impl TimelineCompositor<FfprobeProbe, FfmpegRenderer> {
    /// Compositor driving ffprobe and ffmpeg, writing to `output`
    pub fn external(config: CompositorConfig, output: impl Into<PathBuf>) -> Result<Self> {
        let probe = FfprobeProbe::new(config.ffprobe_path.clone());
        let renderer = FfmpegRenderer::new(config.clone(), output);
        Self::new(config, probe, renderer)
    }
}

impl TimelineCompositor<WavProbe, OfflineRenderer> {
    /// Compositor working on buffers and WAV files in memory
    pub fn offline(config: CompositorConfig) -> Result<Self> {
        Self::new(config, WavProbe, OfflineRenderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;
    use crate::error::DubmixError;
    use std::cell::Cell;

    /// Renderer that counts calls and echoes the background
    #[derive(Default)]
    struct CountingRenderer {
        calls: Cell<usize>,
    }

    impl Renderer for CountingRenderer {
        fn render(
            &self,
            background: &MediaSource,
            _clips: &[ClipDescriptor],
            _plan: &RenderPlan,
        ) -> Result<MediaSource> {
            self.calls.set(self.calls.get() + 1);
            Ok(background.clone())
        }
    }

    struct FailingProbe;

    impl DurationProbe for FailingProbe {
        fn duration_secs(&self, _source: &MediaSource) -> Result<f64> {
            Err(DubmixError::render("probe exploded"))
        }
    }

    fn tone(len: usize) -> AudioBuffer {
        AudioBuffer::from_mono((0..len).map(|i| (i as f32 * 0.1).sin()).collect(), 1000)
    }

    #[test]
    fn test_zero_clips_skip_rendering() {
        let compositor = TimelineCompositor::new(
            CompositorConfig::default(),
            WavProbe,
            CountingRenderer::default(),
        )
        .unwrap();
        let background = MediaSource::Buffer(tone(500));

        let out = compositor.render(&background, Vec::new()).unwrap();
        assert_eq!(out, background);
        assert_eq!(compositor.renderer.calls.get(), 0);
    }

    #[test]
    fn test_probe_failure_counts_as_zero_duration() {
        let compositor = TimelineCompositor::new(
            CompositorConfig::default(),
            FailingProbe,
            OfflineRenderer,
        )
        .unwrap();
        let clip = ClipDescriptor::new(AudioBuffer::from_mono(vec![0.0; 100], 1000), 0.1);

        let plan = compositor.plan(std::slice::from_ref(&clip)).unwrap();
        assert!(plan.lanes[0].window.is_empty());

        // Nothing is muted, the silent clip adds nothing
        let background = MediaSource::Buffer(tone(500));
        let out = compositor.render(&background, vec![clip]).unwrap();
        assert_eq!(out, background);
    }

    #[test]
    fn test_overlap_rejected_before_render() {
        let compositor = TimelineCompositor::new(
            CompositorConfig::default(),
            WavProbe,
            CountingRenderer::default(),
        )
        .unwrap();
        let clips = vec![
            ClipDescriptor::new(tone(200), 0.0),
            ClipDescriptor::new(tone(200), 0.1),
        ];
        let err = compositor
            .render(&MediaSource::Buffer(tone(500)), clips)
            .unwrap_err();
        assert_eq!(err.error_code(), "OVERLAPPING_CLIPS");
        assert_eq!(compositor.renderer.calls.get(), 0);
    }

    #[test]
    fn test_negative_start_rejected_before_render() {
        let compositor = TimelineCompositor::new(
            CompositorConfig::default(),
            WavProbe,
            CountingRenderer::default(),
        )
        .unwrap();
        let clips = vec![
            ClipDescriptor::new(tone(100), 0.0),
            ClipDescriptor::new(tone(100), -0.5),
        ];
        let err = compositor
            .render(&MediaSource::Buffer(tone(500)), clips)
            .unwrap_err();
        assert!(matches!(err, DubmixError::InvalidClip { index: 1, .. }));
        assert_eq!(compositor.renderer.calls.get(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CompositorConfig {
            duck_attenuation: 1.5,
            ..CompositorConfig::default()
        };
        assert!(TimelineCompositor::offline(config).is_err());
    }
}
