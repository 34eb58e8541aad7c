//! Sample rate conversion to the canonical analysis rate
//!
//! Uses rubato's FFT resampler with fixed input chunks. The resampler's
//! group delay is removed and the output trimmed to exactly
//! `ceil(len * to_rate / from_rate)` samples, so a tone keeps its position
//! in time across rates.

use crate::error::ComparisonError;
use rubato::{FftFixedIn, Resampler};

/// Input chunk size fed to the resampler
const CHUNK_SIZE: usize = 1024;

/// Resample a mono signal
///
/// # Arguments
///
/// * `samples` - Mono input samples
/// * `from_rate` - Input sample rate in Hz
/// * `to_rate` - Output sample rate in Hz
///
/// # Errors
///
/// Returns `ComparisonError::InvalidInput` for zero rates and
/// `ComparisonError::Computation` if the resampler fails.
pub fn resample_mono(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, ComparisonError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ComparisonError::InvalidInput(format!(
            "Invalid resampling rates: {} -> {}",
            from_rate, to_rate
        )));
    }

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        samples.len(),
        from_rate,
        to_rate
    );

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1).map_err(
            |e| ComparisonError::Computation(format!("Failed to build resampler: {}", e)),
        )?;

    let expected_len =
        ((samples.len() as u64 * to_rate as u64 + from_rate as u64 - 1) / from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let needed = expected_len + delay;

    let mut output = Vec::with_capacity(needed + CHUNK_SIZE);
    let mut position = 0;

    // Feed the signal, then zero chunks until the delayed tail has been flushed.
    while output.len() < needed {
        let frames_next = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; frames_next];
        if position < samples.len() {
            let end = (position + frames_next).min(samples.len());
            chunk[..end - position].copy_from_slice(&samples[position..end]);
            position = end;
        }

        let processed = resampler
            .process(&[chunk], None)
            .map_err(|e| ComparisonError::Computation(format!("Resampling failed: {}", e)))?;

        match processed.into_iter().next() {
            Some(channel) if !channel.is_empty() => output.extend_from_slice(&channel),
            _ => {
                return Err(ComparisonError::Computation(
                    "Resampler produced no output".to_string(),
                ))
            }
        }
    }

    Ok(output[delay..needed].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let samples = sine(440.0, 22050, 1000);
        assert_eq!(resample_mono(&samples, 22050, 22050).unwrap(), samples);
    }

    #[test]
    fn test_downsample_length() {
        let samples = sine(440.0, 44100, 44100);
        let out = resample_mono(&samples, 44100, 22050).unwrap();
        assert_eq!(out.len(), 22050);
    }

    #[test]
    fn test_odd_ratio_length() {
        let samples = sine(300.0, 48000, 12345);
        let out = resample_mono(&samples, 48000, 22050).unwrap();
        // ceil(12345 * 22050 / 48000)
        assert_eq!(out.len(), 5671);
    }

    #[test]
    fn test_preserves_amplitude() {
        let samples = sine(440.0, 44100, 44100);
        let out = resample_mono(&samples, 44100, 22050).unwrap();
        let mid = &out[5000..15000];
        let peak = mid.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
        assert!((peak - 0.5).abs() < 0.05, "Peak after resampling was {}", peak);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(resample_mono(&[0.0; 10], 0, 22050).is_err());
    }
}
