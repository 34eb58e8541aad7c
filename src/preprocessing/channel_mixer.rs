//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::ComparisonError;

/// Mix interleaved multi-channel samples down to mono
///
/// Each output sample is the average of one interleaved frame. A trailing
/// partial frame (truncated stream) is dropped.
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (`L R L R ...` for stereo)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// Mono samples
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, ComparisonError> {
    if channels == 0 {
        return Err(ComparisonError::Decode("Stream reports zero channels".to_string()));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    log::debug!(
        "Mixing {} interleaved samples from {} channels to mono",
        interleaved.len(),
        channels
    );

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1).unwrap(), samples);
    }

    #[test]
    fn test_stereo_average() {
        let samples = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&samples, 2).unwrap(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let samples = vec![1.0, 1.0, 1.0];
        assert_eq!(downmix_to_mono(&samples, 2).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(matches!(
            downmix_to_mono(&[0.0], 0),
            Err(ComparisonError::Decode(_))
        ));
    }
}
