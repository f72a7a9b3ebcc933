//! Audio Buffer Management
//!
//! Provides the core audio buffer type used by the bus graph and the
//! compositor. Samples are stored per channel as 32-bit floats.

use crate::error::{DubmixError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default graph sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Maximum number of channels accepted on input
pub const MAX_CHANNELS: usize = 2;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Linear interpolation resampling
///
/// Linear interpolation introduces aliasing when downsampling; it is only
/// used to bring stems onto the graph rate.
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved multichannel sample buffer
///
/// The outer `Vec` holds channels, every inner `Vec` holds the same number
/// of samples.
///
/// # Example
/// ```
/// use dubmix::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with the given length, layout and rate
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self::silence(layout.num_channels(), num_samples, sample_rate)
    }

    /// Create a silent buffer with an arbitrary channel count
    pub fn silence(channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; channels],
            sample_rate,
        }
    }

    /// Wrap a single channel of samples
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// Fails when there are no channels or the channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let Some(first) = samples.first() else {
            return Err(DubmixError::InvalidAudio {
                reason: "buffer has no channels".to_string(),
            });
        };
        let len = first.len();
        if let Some(bad) = samples.iter().position(|ch| ch.len() != len) {
            return Err(DubmixError::InvalidAudio {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    bad,
                    samples[bad].len(),
                    len
                ),
            });
        }
        if sample_rate == 0 {
            return Err(DubmixError::InvalidAudio {
                reason: "sample rate must be positive".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(num_channels * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(channels, samples)` pair used when shapes are compared
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.channels(), self.len())
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get a single sample
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples.get(channel).and_then(|ch| ch.get(index)).copied()
    }

    /// Set a single sample; out-of-range writes are ignored
    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) {
        if let Some(sample) = self.samples.get_mut(channel).and_then(|ch| ch.get_mut(index)) {
            *sample = value;
        }
    }

    /// Duplicate a mono buffer into two identical channels
    ///
    /// Buffers that already have two or more channels are left as they are.
    pub fn promote_to_stereo(&mut self) {
        if self.channels() == 1 {
            let mono = self.samples[0].clone();
            self.samples.push(mono);
        }
    }

    /// Consuming variant of [`AudioBuffer::promote_to_stereo`]
    pub fn into_stereo(mut self) -> Self {
        self.promote_to_stereo();
        self
    }

    /// Resample every channel to `target_rate` with linear interpolation
    pub fn resampled(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || self.sample_rate == 0 {
            return self.clone();
        }
        let ratio = target_rate as f64 / self.sample_rate as f64;
        Self {
            samples: self
                .samples
                .iter()
                .map(|channel| resample_linear(channel, ratio))
                .collect(),
            sample_rate: target_rate,
        }
    }

    /// Fit this buffer to `(channels, len)`
    ///
    /// Extra samples are dropped and missing samples are zero. Missing
    /// channels repeat the last existing channel.
    pub fn fit_to(&self, channels: usize, len: usize) -> Self {
        let mut samples = Vec::with_capacity(channels);
        for ch in 0..channels {
            let source = self
                .samples
                .get(ch)
                .or_else(|| self.samples.last())
                .map(|c| c.as_slice())
                .unwrap_or(&[]);
            let mut out = vec![0.0_f32; len];
            let n = source.len().min(len);
            out[..n].copy_from_slice(&source[..n]);
            samples.push(out);
        }
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Multiply every sample by `factor`
    pub fn scale(&mut self, factor: f32) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= factor;
            }
        }
    }

    /// Add `other` sample-by-sample starting at `offset`
    ///
    /// Samples of `other` that fall beyond the end of this buffer are
    /// discarded. Channels are paired by index.
    pub fn mix_in(&mut self, other: &AudioBuffer, offset: usize) {
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            if offset >= dst.len() {
                continue;
            }
            for (d, s) in dst[offset..].iter_mut().zip(src.iter()) {
                *d += *s;
            }
        }
    }

    /// Absolute peak over all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Check if every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|&s| s == 0.0)
    }

    /// Check buffer contains only finite samples
    pub fn is_valid(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|s| s.is_finite())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_buffer() {
        let buf = AudioBuffer::new(1000, ChannelLayout::Stereo, 44100);
        assert_eq!(buf.shape(), (2, 1000));
        assert!(buf.is_silent());
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 9]], 44100);
        assert!(result.is_err());
        assert!(AudioBuffer::from_channels(Vec::new(), 44100).is_err());
    }

    #[test]
    fn test_to_interleaved_alternates_channels() {
        let buf =
            AudioBuffer::from_channels(vec![vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3]], 48000)
                .unwrap();
        assert_eq!(buf.to_interleaved(), vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn test_promote_to_stereo_duplicates() {
        let buf = AudioBuffer::from_mono(vec![0.25, -0.5], 44100).into_stereo();
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.samples[0], buf.samples[1]);
    }

    #[test]
    fn test_resample_doubles_length() {
        let buf = AudioBuffer::from_mono(vec![0.0, 1.0, 0.0, -1.0], 22050);
        let up = buf.resampled(44100);
        assert_eq!(up.sample_rate, 44100);
        assert_eq!(up.len(), 8);
        assert_relative_eq!(up.samples[0][1], 0.5);
    }

    #[test]
    fn test_fit_to_pads_and_truncates() {
        let buf = AudioBuffer::from_mono(vec![1.0, 2.0, 3.0], 44100);
        let longer = buf.fit_to(2, 5);
        assert_eq!(longer.samples[0], vec![1.0, 2.0, 3.0, 0.0, 0.0]);
        assert_eq!(longer.samples[1], vec![1.0, 2.0, 3.0, 0.0, 0.0]);
        let shorter = buf.fit_to(1, 2);
        assert_eq!(shorter.samples[0], vec![1.0, 2.0]);
    }

    #[test]
    fn test_mix_in_with_offset() {
        let mut dst = AudioBuffer::silence(1, 4, 44100);
        let src = AudioBuffer::from_mono(vec![1.0, 1.0, 1.0], 44100);
        dst.mix_in(&src, 2);
        assert_eq!(dst.samples[0], vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_peak_and_validity() {
        let mut buf = AudioBuffer::from_mono(vec![0.2, -0.7, 0.5], 44100);
        assert_relative_eq!(buf.peak(), 0.7);
        assert!(buf.is_valid());
        buf.set_sample(0, 1, f32::NAN);
        assert!(!buf.is_valid());
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(db_to_linear(-12.0), 0.251_188_64, epsilon = 1e-6);
    }
}
