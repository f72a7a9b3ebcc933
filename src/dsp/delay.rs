//! Delay effect
//!
//! Single causal echo: `out[n] = in[n] + in[n - d] * feedback * mix` for
//! `n >= d`, where `d = floor(delay_time * sample_rate)`. Samples before
//! `d` are untouched and nothing wraps around.

use crate::dsp::effect::Effect;
use crate::engine::AudioBuffer;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Delay {
    delay_samples: usize,
    echo_gain: f32,
}

impl Delay {
    pub fn new(delay_time_secs: f32, feedback: f32, mix: f32, sample_rate: u32) -> Self {
        let delay_samples = (delay_time_secs.max(0.0) as f64 * sample_rate as f64).floor() as usize;
        Self {
            delay_samples,
            echo_gain: feedback * mix,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }
}

impl Effect for Delay {
    fn process(&self, buffer: &mut AudioBuffer) -> Result<()> {
        let d = self.delay_samples;
        // A zero delay would fold the echo onto the dry signal; treat as no echo
        if d == 0 {
            return Ok(());
        }
        for channel in &mut buffer.samples {
            if d >= channel.len() {
                continue;
            }
            let dry = channel.clone();
            for (out, delayed) in channel[d..].iter_mut().zip(dry.iter()) {
                *out += delayed * self.echo_gain;
            }
        }
        Ok(())
    }

    fn effect_type(&self) -> &'static str {
        "delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_impulse_echo_position_and_level() {
        let delay = Delay::new(0.25, 0.3, 0.5, 44100);
        assert_eq!(delay.delay_samples(), 11025);

        let mut samples = vec![0.0; 22050];
        samples[0] = 1.0;
        let mut buffer = AudioBuffer::from_mono(samples, 44100);

        delay.process(&mut buffer).unwrap();

        let out = &buffer.samples[0];
        assert_eq!(out[0], 1.0);
        assert_abs_diff_eq!(out[11025], 0.15, epsilon = 1e-6);
        let others: f32 = out
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 0 && *i != 11025)
            .map(|(_, s)| s.abs())
            .sum();
        assert_eq!(others, 0.0);
    }

    #[test]
    fn test_echo_is_not_recirculated() {
        let delay = Delay::new(0.001, 0.9, 1.0, 1000);
        let mut buffer = AudioBuffer::from_mono(vec![1.0, 0.0, 0.0], 1000);
        delay.process(&mut buffer).unwrap();
        assert_abs_diff_eq!(buffer.samples[0][1], 0.9, epsilon = 1e-6);
        assert_eq!(buffer.samples[0][2], 0.0);
    }

    #[test]
    fn test_delay_longer_than_buffer_is_passthrough() {
        let delay = Delay::new(2.0, 0.5, 0.5, 100);
        let mut buffer = AudioBuffer::from_mono(vec![0.5; 50], 100);
        delay.process(&mut buffer).unwrap();
        assert_eq!(buffer.samples[0], vec![0.5; 50]);
    }
}
