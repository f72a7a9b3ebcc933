//! Compressor effect
//!
//! Static hard-knee downward compression applied per sample. There is no
//! envelope follower: any sample whose magnitude exceeds the threshold is
//! pulled towards it by the ratio.

use crate::dsp::effect::Effect;
use crate::engine::{db_to_linear, AudioBuffer};
use crate::error::{DubmixError, Result};

#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    threshold_linear: f32,
    ratio: f32,
}

impl Compressor {
    /// Threshold in dBFS, ratio as N for N:1
    pub fn new(threshold_db: f32, ratio: f32) -> Self {
        Self {
            threshold_db,
            threshold_linear: db_to_linear(threshold_db),
            ratio,
        }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Transfer curve for one sample
    #[inline]
    pub fn compress_sample(&self, x: f32) -> f32 {
        let magnitude = x.abs();
        if magnitude > self.threshold_linear {
            x.signum() * (self.threshold_linear + (magnitude - self.threshold_linear) / self.ratio)
        } else {
            x
        }
    }
}

impl Effect for Compressor {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        if !(self.ratio >= 1.0) {
            return Err(DubmixError::effect(
                "compressor",
                format!("ratio {} is below 1:1", self.ratio),
            ));
        }
        for channel in &mut buffer.samples {
            for sample in channel.iter_mut() {
                *sample = self.compress_sample(*sample);
            }
        }
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "compressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_peak_above_threshold_is_reduced() {
        // -12 dB ~= 0.2512; 0.2512 + (0.501 - 0.2512) / 4 ~= 0.3136
        let comp = Compressor::new(-12.0, 4.0);
        let mut buffer = AudioBuffer::from_mono(vec![0.0, 0.501, -0.501, 0.1], 44100);

        comp.process(&mut buffer).unwrap();

        let threshold = db_to_linear(-12.0);
        let expected = threshold + (0.501 - threshold) / 4.0;
        assert_abs_diff_eq!(buffer.samples[0][1], expected, epsilon = 1e-6);
        assert_abs_diff_eq!(buffer.samples[0][1], 0.3135, epsilon = 1e-3);
        assert_abs_diff_eq!(buffer.samples[0][2], -expected, epsilon = 1e-6);
    }

    #[test]
    fn test_below_threshold_passthrough() {
        let comp = Compressor::new(-12.0, 4.0);
        let mut buffer = AudioBuffer::from_mono(vec![0.1, -0.2, 0.25], 44100);
        comp.process(&mut buffer).unwrap();
        assert_eq!(buffer.samples[0], vec![0.1, -0.2, 0.25]);
    }

    #[test]
    fn test_unity_ratio_is_identity() {
        let comp = Compressor::new(-30.0, 1.0);
        assert_abs_diff_eq!(comp.compress_sample(0.9), 0.9, epsilon = 1e-6);
    }
}
