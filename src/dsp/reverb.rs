//! Reverb effect
//!
//! Convolution with a synthetic impulse response:
//!
//! - length `L = floor(sample_rate * room_size * 0.5)` samples
//! - `h[k] = g[k] * (1 - damping) * exp(-k / (L * 0.5))`, `g` standard normal
//!
//! The result keeps the input length ("same" mode): the full convolution is
//! cropped starting at `(L - 1) / 2`. Long signals switch from direct to
//! FFT convolution; both produce the same samples up to rounding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::dsp::effect::{Effect, ProcessContext};
use crate::engine::AudioBuffer;
use crate::error::{DubmixError, Result};

#[derive(Debug, Clone)]
pub struct Reverb {
    room_size: f32,
    damping: f32,
    sample_rate: u32,
    seed: Option<u64>,
    fft_threshold: usize,
}

impl Reverb {
    pub fn new(room_size: f32, damping: f32, ctx: &ProcessContext) -> Self {
        Self {
            room_size,
            damping,
            sample_rate: ctx.sample_rate,
            seed: ctx.reverb_seed,
            fft_threshold: ctx.fft_convolution_threshold,
        }
    }

    pub fn impulse_length(&self) -> usize {
        (self.sample_rate as f64 * self.room_size as f64 * 0.5).floor() as usize
    }

    /// Build the decaying noise impulse response
    pub fn impulse_response(&self) -> Vec<f64> {
        let length = self.impulse_length();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let amplitude = 1.0 - self.damping as f64;
        let tau = length as f64 * 0.5;
        (0..length)
            .map(|k| standard_normal(&mut rng) * amplitude * (-(k as f64) / tau).exp())
            .collect()
    }
}

impl Effect for Reverb {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        let impulse = self.impulse_response();
        if impulse.is_empty() {
            return Err(DubmixError::effect("reverb", "room size yields an empty impulse"));
        }
        for channel in &mut buffer.samples {
            let input: Vec<f64> = channel.iter().map(|&s| s as f64).collect();
            let full = if input.len().saturating_mul(impulse.len()) > self.fft_threshold {
                convolve_fft(&input, &impulse)
            } else {
                convolve_direct(&input, &impulse)
            };
            let offset = (impulse.len() - 1) / 2;
            for (i, sample) in channel.iter_mut().enumerate() {
                *sample = full.get(offset + i).copied().unwrap_or(0.0) as f32;
            }
        }
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "reverb"
    }
}

/// Box-Muller draw from N(0, 1)
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Full linear convolution, length `x.len() + h.len() - 1`
pub(crate) fn convolve_direct(x: &[f64], h: &[f64]) -> Vec<f64> {
    if x.is_empty() || h.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; x.len() + h.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        if xi == 0.0 {
            continue;
        }
        for (j, &hj) in h.iter().enumerate() {
            out[i + j] += xi * hj;
        }
    }
    out
}

/// Full linear convolution through zero-padded FFTs
pub(crate) fn convolve_fft(x: &[f64], h: &[f64]) -> Vec<f64> {
    if x.is_empty() || h.is_empty() {
        return Vec::new();
    }
    let out_len = x.len() + h.len() - 1;
    let n = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let pad = |src: &[f64]| {
        let mut buf: Vec<Complex<f64>> = src.iter().map(|&v| Complex::new(v, 0.0)).collect();
        buf.resize(n, Complex::new(0.0, 0.0));
        buf
    };
    let mut xs = pad(x);
    let mut hs = pad(h);
    forward.process(&mut xs);
    forward.process(&mut hs);

    for (a, b) in xs.iter_mut().zip(hs.iter()) {
        *a *= *b;
    }
    inverse.process(&mut xs);

    let scale = 1.0 / n as f64;
    xs.iter().take(out_len).map(|c| c.re * scale).collect()
}
