//! Loudness normalization
//!
//! Scales the mono analysis buffer so that the silence gate and voicing
//! decisions do not depend on how loud the recording was made:
//! - Peak normalization (scales the maximum absolute sample to 0 dBFS)
//! - RMS normalization (scales to a target RMS level, never clipping)
//!
//! # Example
//!
//! ```
//! use stratum_melody::preprocessing::normalization::{normalize, NormalizationMethod};
//!
//! let mut samples = vec![0.25f32, -0.5, 0.125];
//! let metadata = normalize(&mut samples, NormalizationMethod::Peak)?;
//! assert!((samples[1] + 1.0).abs() < 1e-6);
//! assert!(metadata.gain_db > 5.9);
//! # Ok::<(), stratum_melody::ComparisonError>(())
//! ```

use crate::error::ComparisonError;
use serde::{Deserialize, Serialize};

/// Normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMethod {
    /// Scale so the loudest sample reaches full scale
    Peak,
    /// Scale to [`RMS_TARGET_DB`], limited so the peak never exceeds full scale
    Rms,
    /// Leave the samples untouched
    None,
}

/// Loudness metadata returned from normalization
#[derive(Debug, Clone)]
pub struct LoudnessMetadata {
    /// Peak level in dB (before normalization)
    pub peak_db: f32,
    /// RMS level in dB (before normalization)
    pub rms_db: f32,
    /// Gain applied in dB
    pub gain_db: f32,
}

/// Numerical stability epsilon for divisions
const EPSILON: f32 = 1e-10;

/// Target level for RMS normalization in dBFS
pub const RMS_TARGET_DB: f32 = -20.0;

/// Convert a linear amplitude to dB, mapping zero to negative infinity
pub(crate) fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude > EPSILON {
        20.0 * amplitude.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn peak_and_rms(samples: &[f32]) -> (f32, f32) {
    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt() as f32;
    (peak, rms)
}

/// Normalize samples in place
///
/// Silent or near-silent buffers are returned unchanged (gain 0 dB) so that
/// silence stays silence and is later reported as lacking melodic content.
///
/// # Errors
///
/// Returns `ComparisonError::InvalidInput` for an empty buffer and
/// `ComparisonError::Computation` if the buffer contains non-finite samples.
pub fn normalize(
    samples: &mut [f32],
    method: NormalizationMethod,
) -> Result<LoudnessMetadata, ComparisonError> {
    if samples.is_empty() {
        return Err(ComparisonError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    if samples.iter().any(|x| !x.is_finite()) {
        return Err(ComparisonError::Computation(
            "Non-finite sample in decoded audio".to_string(),
        ));
    }

    let (peak, rms) = peak_and_rms(samples);
    let peak_db = amplitude_to_db(peak);
    let rms_db = amplitude_to_db(rms);

    if peak <= EPSILON || method == NormalizationMethod::None {
        log::debug!("Skipping normalization: peak={:.2} dB, method={:?}", peak_db, method);
        return Ok(LoudnessMetadata {
            peak_db,
            rms_db,
            gain_db: 0.0,
        });
    }

    let gain_linear = match method {
        NormalizationMethod::Peak => 1.0 / peak,
        NormalizationMethod::Rms => {
            let target_rms = 10.0_f32.powf(RMS_TARGET_DB / 20.0);
            (target_rms / rms.max(EPSILON)).min(1.0 / peak)
        }
        NormalizationMethod::None => 1.0,
    };

    for sample in samples.iter_mut() {
        *sample *= gain_linear;
    }

    let gain_db = 20.0 * gain_linear.log10();

    log::debug!(
        "{:?} normalization: peak={:.2} dB, rms={:.2} dB, gain={:.2} dB",
        method,
        peak_db,
        rms_db,
        gain_db
    );

    Ok(LoudnessMetadata {
        peak_db,
        rms_db,
        gain_db,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_test_signal(length: usize, amplitude: f32) -> Vec<f32> {
        (0..length)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin())
            .collect()
    }

    #[test]
    fn test_peak_normalization() {
        let mut samples = generate_test_signal(22050, 0.1);
        let metadata = normalize(&mut samples, NormalizationMethod::Peak).unwrap();

        let peak = samples.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-5, "Peak should be 1.0, got {}", peak);
        assert!((metadata.gain_db - 20.0).abs() < 0.1);
    }

    #[test]
    fn test_rms_normalization_never_clips() {
        let mut samples = generate_test_signal(22050, 0.001);
        normalize(&mut samples, NormalizationMethod::Rms).unwrap();

        let peak = samples.iter().map(|x| x.abs()).fold(0.0f32, f32::max);
        assert!(peak <= 1.0 + 1e-6);

        let (_, rms) = peak_and_rms(&samples);
        assert!((amplitude_to_db(rms) - RMS_TARGET_DB).abs() < 0.1);
    }

    #[test]
    fn test_loudness_invariance() {
        let mut quiet = generate_test_signal(4096, 0.05);
        let mut loud = generate_test_signal(4096, 0.8);
        normalize(&mut quiet, NormalizationMethod::Peak).unwrap();
        normalize(&mut loud, NormalizationMethod::Peak).unwrap();

        for (a, b) in quiet.iter().zip(loud.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_silent_audio_untouched() {
        let mut samples = vec![0.0f32; 1000];
        let metadata = normalize(&mut samples, NormalizationMethod::Peak).unwrap();
        assert_eq!(metadata.gain_db, 0.0);
        assert_eq!(metadata.peak_db, f32::NEG_INFINITY);
        assert!(samples.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_empty_samples() {
        let mut samples: Vec<f32> = vec![];
        assert!(normalize(&mut samples, NormalizationMethod::Peak).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut samples = vec![0.1, f32::NAN, 0.2];
        assert!(matches!(
            normalize(&mut samples, NormalizationMethod::Peak),
            Err(ComparisonError::Computation(_))
        ));
    }
}
