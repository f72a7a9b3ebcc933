//! Shelf EQ Effect
//!
//! Approximate two-band shelving EQ. Each enabled band isolates its region
//! with a Butterworth section and adds it back scaled by `gain_db / 12`:
//!
//! ```text
//! out = in + band(in) * (gain_db / 12)
//! ```
//!
//! The low band (below 1 kHz) is applied first, the high band (above 4 kHz)
//! works on the result.

use crate::dsp::effect::Effect;
use crate::dsp::filter::BiquadCoeffs;
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Low shelf corner frequency in Hz
pub const LOW_SHELF_HZ: f64 = 1000.0;

/// High shelf corner frequency in Hz
pub const HIGH_SHELF_HZ: f64 = 4000.0;

/// Gain in dB that doubles the band (adds it once at full scale)
const FULL_SCALE_DB: f32 = 12.0;

#[derive(Debug, Clone)]
pub struct ShelfEq {
    low_gain_db: f32,
    high_gain_db: f32,
    sample_rate: u32,
}

impl ShelfEq {
    pub fn new(low_gain_db: f32, high_gain_db: f32, sample_rate: u32) -> Self {
        Self {
            low_gain_db,
            high_gain_db,
            sample_rate,
        }
    }

    fn apply_band(buffer: &mut AudioBuffer, coeffs: &BiquadCoeffs, gain_db: f32) {
        let amount = gain_db / FULL_SCALE_DB;
        for channel in &mut buffer.samples {
            let band = coeffs.filter(channel);
            for (sample, filtered) in channel.iter_mut().zip(band) {
                *sample += filtered * amount;
            }
        }
    }
}

impl Effect for ShelfEq {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        if self.low_gain_db != 0.0 {
            let coeffs = BiquadCoeffs::low_pass(LOW_SHELF_HZ, self.sample_rate)?;
            Self::apply_band(buffer, &coeffs, self.low_gain_db);
        }
        if self.high_gain_db != 0.0 {
            let coeffs = BiquadCoeffs::high_pass(HIGH_SHELF_HZ, self.sample_rate)?;
            Self::apply_band(buffer, &coeffs, self.high_gain_db);
        }
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "equalizer"
    }
}
