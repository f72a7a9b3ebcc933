//! Equal-power stereo panning

use crate::engine::AudioBuffer;

/// Left/right gains for `pan` in [-1, 1] under the equal-power law
///
/// `left = sqrt(0.5 * (1 - pan))`, `right = sqrt(0.5 * (1 + pan))`, so
/// `left^2 + right^2 == 1` across the whole range.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((0.5 * (1.0 - pan)).sqrt(), (0.5 * (1.0 + pan)).sqrt())
}

/// Pan a buffer in place; mono input is duplicated to stereo first
///
/// Buffers with more than two channels are left untouched.
pub fn apply_pan(buffer: &mut AudioBuffer, pan: f32) {
    buffer.promote_to_stereo();
    if buffer.channels() != 2 {
        return;
    }
    let (left, right) = pan_gains(pan);
    for sample in buffer.samples[0].iter_mut() {
        *sample *= left;
    }
    for sample in buffer.samples[1].iter_mut() {
        *sample *= right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_center_is_equal_power() {
        let (left, right) = pan_gains(0.0);
        assert_eq!(left, right);
        assert_abs_diff_eq!(left, 0.5_f32.sqrt(), epsilon = 1e-7);
    }

    #[test_case(-1.0, 1.0, 0.0 ; "hard left")]
    #[test_case(1.0, 0.0, 1.0 ; "hard right")]
    fn test_extremes(pan: f32, left: f32, right: f32) {
        let (l, r) = pan_gains(pan);
        assert_abs_diff_eq!(l, left, epsilon = 1e-7);
        assert_abs_diff_eq!(r, right, epsilon = 1e-7);
    }

    #[test]
    fn test_constant_power() {
        for step in -10..=10 {
            let (l, r) = pan_gains(step as f32 / 10.0);
            assert_abs_diff_eq!(l * l + r * r, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mono_is_promoted() {
        let mut buffer = AudioBuffer::from_mono(vec![1.0, 1.0], 44100);
        apply_pan(&mut buffer, 1.0);
        assert_eq!(buffer.channels(), 2);
        assert_abs_diff_eq!(buffer.samples[0][0], 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(buffer.samples[1][0], 1.0, epsilon = 1e-7);
    }
}
