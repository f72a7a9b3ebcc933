//! Butterworth filters
//!
//! Second-order Butterworth sections computed with the bilinear transform
//! (Audio EQ Cookbook form with Q = 1/sqrt(2)). Band-pass cascades a
//! high-pass at `cutoff * 0.5` with a low-pass at `cutoff * 1.5`.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::dsp::effect::Effect;
use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

/// Filter response selected by the `filter_type` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
    BandPass,
}

impl FilterMode {
    /// Exactly 0 = low-pass, exactly 1 = high-pass, anything else = band-pass
    pub fn from_parameter(value: f32) -> Self {
        if value == 0.0 {
            FilterMode::LowPass
        } else if value == 1.0 {
            FilterMode::HighPass
        } else {
            FilterMode::BandPass
        }
    }
}

/// Normalized biquad coefficients
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Butterworth low-pass; fails when `cutoff` is not inside (0, Nyquist)
    pub(crate) fn low_pass(cutoff: f64, sample_rate: u32) -> Result<Self> {
        let (cos_w0, alpha) = Self::prewarp(cutoff, sample_rate)?;
        Ok(Self::normalize(
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ))
    }

    /// Butterworth high-pass; fails when `cutoff` is not inside (0, Nyquist)
    pub(crate) fn high_pass(cutoff: f64, sample_rate: u32) -> Result<Self> {
        let (cos_w0, alpha) = Self::prewarp(cutoff, sample_rate)?;
        Ok(Self::normalize(
            (1.0 + cos_w0) / 2.0,
            -(1.0 + cos_w0),
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ))
    }

    fn prewarp(cutoff: f64, sample_rate: u32) -> Result<(f64, f64)> {
        let nyquist = sample_rate as f64 / 2.0;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(DubmixError::effect(
                "filter",
                format!("cutoff {:.1} Hz outside (0, {:.1}) Hz", cutoff, nyquist),
            ));
        }
        let w0 = 2.0 * PI * cutoff / sample_rate as f64;
        let alpha = w0.sin() / (2.0 * FRAC_1_SQRT_2);
        Ok((w0.cos(), alpha))
    }

    fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Run one channel through this section from zero initial state
    pub(crate) fn filter(&self, input: &[f32]) -> Vec<f32> {
        // Transposed direct form II
        let (mut z1, mut z2) = (0.0_f64, 0.0_f64);
        input
            .iter()
            .map(|&x| {
                let x = x as f64;
                let y = self.b0 * x + z1;
                z1 = self.b1 * x - self.a1 * y + z2;
                z2 = self.b2 * x - self.a2 * y;
                y as f32
            })
            .collect()
    }
}

/// Low/high/band-pass filter effect
#[derive(Debug, Clone)]
pub struct Filter {
    mode: FilterMode,
    cutoff_hz: f32,
    sample_rate: u32,
}

impl Filter {
    pub fn new(mode: FilterMode, cutoff_hz: f32, sample_rate: u32) -> Self {
        Self {
            mode,
            cutoff_hz,
            sample_rate,
        }
    }

    fn sections(&self) -> Result<Vec<BiquadCoeffs>> {
        let cutoff = self.cutoff_hz as f64;
        match self.mode {
            FilterMode::LowPass => Ok(vec![BiquadCoeffs::low_pass(cutoff, self.sample_rate)?]),
            FilterMode::HighPass => Ok(vec![BiquadCoeffs::high_pass(cutoff, self.sample_rate)?]),
            FilterMode::BandPass => Ok(vec![
                BiquadCoeffs::high_pass(cutoff * 0.5, self.sample_rate)?,
                BiquadCoeffs::low_pass(cutoff * 1.5, self.sample_rate)?,
            ]),
        }
    }
}

impl Effect for Filter {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        let sections = self.sections()?;
        for channel in &mut buffer.samples {
            for section in &sections {
                *channel = section.filter(channel);
            }
        }
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64, sample_rate: u32, len: usize) -> AudioBuffer {
        let samples = (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate as f64).sin() as f32)
            .collect();
        AudioBuffer::from_mono(samples, sample_rate)
    }

    fn rms(samples: &[f32]) -> f64 {
        let tail = &samples[samples.len() / 2..];
        (tail.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / tail.len() as f64).sqrt()
    }

    #[test]
    fn test_mode_from_parameter() {
        assert_eq!(FilterMode::from_parameter(0.0), FilterMode::LowPass);
        assert_eq!(FilterMode::from_parameter(1.0), FilterMode::HighPass);
        assert_eq!(FilterMode::from_parameter(2.0), FilterMode::BandPass);
        assert_eq!(FilterMode::from_parameter(0.4), FilterMode::BandPass);
        assert_eq!(FilterMode::from_parameter(0.99), FilterMode::BandPass);
    }

    #[test]
    fn test_fractional_type_removes_dc() {
        let filter = Filter::new(FilterMode::from_parameter(0.4), 200.0, 44100);
        let mut dc = AudioBuffer::from_mono(vec![1.0; 8820], 44100);
        filter.process(&mut dc).unwrap();
        assert!(dc.samples[0][8819].abs() < 1e-3);
    }

    #[test]
    fn test_low_pass_attenuates_highs() {
        let filter = Filter::new(FilterMode::LowPass, 500.0, 44100);
        let mut low = sine(100.0, 44100, 8820);
        let mut high = sine(8000.0, 44100, 8820);
        filter.process(&mut low).unwrap();
        filter.process(&mut high).unwrap();

        assert!(rms(&low.samples[0]) > 0.65);
        assert!(rms(&high.samples[0]) < 0.02);
    }

    #[test]
    fn test_high_pass_attenuates_lows() {
        let filter = Filter::new(FilterMode::HighPass, 2000.0, 44100);
        let mut low = sine(100.0, 44100, 8820);
        filter.process(&mut low).unwrap();
        assert!(rms(&low.samples[0]) < 0.01);
    }

    #[test]
    fn test_cutoff_at_corner_is_minus_3db() {
        let filter = Filter::new(FilterMode::LowPass, 1000.0, 44100);
        let mut corner = sine(1000.0, 44100, 44100);
        filter.process(&mut corner).unwrap();
        let expected = std::f64::consts::FRAC_1_SQRT_2 * std::f64::consts::FRAC_1_SQRT_2;
        assert!((rms(&corner.samples[0]) - expected).abs() < 0.01);
    }

    #[test]
    fn test_band_pass_above_nyquist_fails() {
        // 1.5 * 16 kHz is above the 22.05 kHz Nyquist limit
        let filter = Filter::new(FilterMode::BandPass, 16000.0, 44100);
        let mut buffer = sine(440.0, 44100, 128);
        assert!(filter.process(&mut buffer).is_err());
    }
}
