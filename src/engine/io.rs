//! WAV file I/O for Dubmix
//!
//! The mixing core works on in-memory buffers; these helpers exist for the
//! CLI and for the compositor backends that need to move buffers through
//! files. Audio keeps its native sample rate on import.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, MAX_CHANNELS};
use crate::error::{DubmixError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (32 writes IEEE float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    /// 16-bit integer PCM
    pub fn cd_quality() -> Self {
        ExportFormat { bit_depth: 16 }
    }

    /// 32-bit float, lossless for the internal sample format
    pub fn float() -> Self {
        ExportFormat { bit_depth: 32 }
    }
}

/// Read a mono or stereo WAV file
///
/// # Errors
/// * `FileReadError` - If the file does not exist
/// * `Wav` - If the file is not a readable WAV file
/// * `InvalidAudio` - If the file has more than two channels or no samples
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(DubmixError::FileReadError {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    if channels == 0 || channels > MAX_CHANNELS {
        return Err(DubmixError::InvalidAudio {
            reason: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let samples = deinterleave(&interleaved, channels);
    let buffer = AudioBuffer::from_channels(samples, spec.sample_rate)?;

    if buffer.is_empty() {
        return Err(DubmixError::InvalidAudio {
            reason: format!("{} contains no samples", path.display()),
        });
    }

    log::debug!(
        "Imported {}: {} ch, {} samples @ {} Hz",
        path.display(),
        buffer.channels(),
        buffer.len(),
        buffer.sample_rate
    );
    Ok(buffer)
}

/// Duration of a WAV file read from its header, without decoding samples
pub fn wav_duration_secs(path: &Path) -> Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(DubmixError::InvalidAudio {
            reason: format!("{} declares a zero sample rate", path.display()),
        });
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Write an AudioBuffer to a WAV file at its own sample rate
pub fn export_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    if !matches!(format.bit_depth, 16 | 24 | 32) {
        return Err(DubmixError::InvalidConfig {
            reason: format!(
                "{}-bit audio (only 16, 24, 32 supported)",
                format.bit_depth
            ),
        });
    }

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = buffer.to_interleaved();
    let mut writer = WavWriter::create(path, spec)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<_, _>>()?,
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<_, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<_, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<_, _>>()?,
            other => {
                return Err(DubmixError::InvalidAudio {
                    reason: format!("{}-bit integer audio", other),
                })
            }
        },
    };
    Ok(samples)
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for (i, sample) in samples.iter().enumerate() {
        result[i % channels].push(*sample);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    fn stereo_ramp(len: usize) -> AudioBuffer {
        let left: Vec<f32> = (0..len).map(|i| i as f32 / len as f32 - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        AudioBuffer::from_channels(vec![left, right], 22050).unwrap()
    }

    #[test]
    fn test_float_roundtrip_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let original = stereo_ramp(512);

        export_wav(&original, &path, ExportFormat::float()).unwrap();
        let restored = import_wav(&path).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_16_bit_roundtrip_is_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp16.wav");
        let original = stereo_ramp(256);

        export_wav(&original, &path, ExportFormat::cd_quality()).unwrap();
        let restored = import_wav(&path).unwrap();

        assert_eq!(restored.shape(), original.shape());
        for (a, b) in restored.samples[0].iter().zip(&original.samples[0]) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_wav_duration_from_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("half_second.wav");
        let buffer = AudioBuffer::silence(1, 11025, 22050);
        export_wav(&buffer, &path, ExportFormat::default()).unwrap();

        assert_abs_diff_eq!(wav_duration_secs(&path).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_unsupported_bit_depth_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("eight_bit.wav");
        let err = export_wav(&stereo_ramp(64), &path, ExportFormat::new(8)).unwrap_err();

        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(!path.exists());
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }

    #[test]
    fn test_deinterleave() {
        let channels = deinterleave(&[1.0, 5.0, 2.0, 6.0], 2);
        assert_eq!(channels[0], vec![1.0, 2.0]);
        assert_eq!(channels[1], vec![5.0, 6.0]);
    }
}
