//! In-memory renderer
//!
//! Applies a plan directly to sample buffers. File sources are read as WAV.

use log::debug;

use super::clip::{ClipDescriptor, MediaSource};
use super::plan::RenderPlan;
use super::Renderer;
use crate::engine::{import_wav, AudioBuffer};
use crate::error::Result;

/// Renders the background and clips into one [`AudioBuffer`]
///
/// Output length and layout follow the background; clip audio past its end
/// is dropped and the sum is not normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRenderer;

impl OfflineRenderer {
    fn load(source: &MediaSource) -> Result<AudioBuffer> {
        match source {
            MediaSource::Buffer(buffer) => Ok(buffer.clone()),
            MediaSource::File(path) => import_wav(path),
        }
    }
}

impl Renderer for OfflineRenderer {
    fn render(
        &self,
        background: &MediaSource,
        clips: &[ClipDescriptor],
        plan: &RenderPlan,
    ) -> Result<MediaSource> {
        let mut mix = Self::load(background)?;
        let sample_rate = mix.sample_rate;
        let channels = mix.channels();

        // Mute (and duck) the background lane
        let rate = sample_rate as f64;
        for channel in mix.samples.iter_mut() {
            for (n, sample) in channel.iter_mut().enumerate() {
                let gain = plan.background_gain(n as f64 / rate);
                if gain != 1.0 {
                    *sample *= gain;
                }
            }
        }

        for lane in &plan.lanes {
            let Some(clip) = clips.get(lane.index) else {
                continue;
            };
            let audio = Self::load(&clip.source)?.resampled(sample_rate);
            let audio = audio.fit_to(channels, audio.len());
            let offset = lane.delay_samples(sample_rate);
            debug!(
                "Placing clip #{} at sample {} ({} samples)",
                lane.index,
                offset,
                audio.len()
            );
            mix.mix_in(&audio, offset);
        }

        Ok(MediaSource::Buffer(mix))
    }
}
