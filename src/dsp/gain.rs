//! Gain Effect
//!
//! Static gain in dB: `out = in * 10^(gain_db / 20)`.

use crate::dsp::effect::Effect;
use crate::engine::{db_to_linear, AudioBuffer};
use crate::error::Result;

/// Simple gain adjustment effect
#[derive(Debug, Clone)]
pub struct Gain {
    gain_db: f32,
    gain_linear: f32,
}

impl Gain {
    pub fn new(gain_db: f32) -> Self {
        Self {
            gain_db,
            gain_linear: db_to_linear(gain_db),
        }
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn gain_linear(&self) -> f32 {
        self.gain_linear
    }
}

impl Effect for Gain {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        // Unity gain optimization
        if (self.gain_linear - 1.0).abs() < f32::EPSILON {
            return Ok(());
        }
        buffer.scale(self.gain_linear);
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "gain"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;

    /// Helper to create a test buffer with known values
    fn create_test_buffer(value: f32, num_samples: usize) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Stereo, 44100);
        for ch in 0..buffer.channels() {
            for i in 0..num_samples {
                buffer.set_sample(ch, i, value);
            }
        }
        buffer
    }

    #[test]
    fn test_gain_new() {
        let gain = Gain::new(-6.0);
        // -6 dB ~= 0.501187
        assert!((gain.gain_linear() - 0.501187).abs() < 0.001);
    }

    #[test]
    fn test_zero_db_is_identity() {
        let gain = Gain::new(0.0);
        let original = create_test_buffer(0.37, 64);
        let mut buffer = original.clone();

        gain.process(&mut buffer).unwrap();

        assert_eq!(buffer, original);
    }

    #[test]
    fn test_gain_process() {
        let gain = Gain::new(-6.0);
        let mut buffer = create_test_buffer(1.0, 100);

        gain.process(&mut buffer).unwrap();

        for ch in 0..buffer.channels() {
            for i in 0..buffer.len() {
                let sample = buffer.get_sample(ch, i).unwrap();
                assert!((sample - 0.501187).abs() < 0.001);
            }
        }
    }

    #[test]
    fn test_gain_positive() {
        let gain = Gain::new(6.0);
        let mut buffer = create_test_buffer(0.5, 10);

        gain.process(&mut buffer).unwrap();

        // 0.5 * 1.995262 ~= 0.997631
        assert!((buffer.samples[1][9] - 0.997631).abs() < 0.01);
    }
}
