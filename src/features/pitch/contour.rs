//! Pitch contour assembly
//!
//! Slides a fixed window with a fixed hop across a mono buffer. Per frame:
//! 1. Silence gate (frame RMS below threshold → unvoiced, confidence 0)
//! 2. YIN estimate of the dominant period
//! 3. Voicing decision: confidence at or above the floor and frequency in range
//!
//! Identical input always produces an identical contour.

use super::yin::YinEstimator;
use super::{PitchContour, PitchFrame};
use crate::config::ComparisonConfig;
use crate::error::ComparisonError;
use crate::io::AudioBuffer;
use crate::preprocessing::silence::SilenceGate;

/// Extract the pitch contour of a mono buffer
///
/// Window and hop lengths are derived from `config.window_ms` and
/// `config.hop_ms` at the buffer's own sample rate.
///
/// # Errors
///
/// - `ComparisonError::InvalidInput` for multi-channel buffers or unusable parameters
/// - `ComparisonError::EmptyAudio` when no frame is voiced (silence, noise,
///   or audio shorter than one window)
/// - `ComparisonError::Computation` on non-finite estimates
pub fn extract(
    buffer: &AudioBuffer,
    config: &ComparisonConfig,
) -> Result<PitchContour, ComparisonError> {
    if buffer.channels() != 1 {
        return Err(ComparisonError::InvalidInput(format!(
            "Pitch extraction expects mono audio, got {} channels",
            buffer.channels()
        )));
    }

    let sample_rate = buffer.sample_rate();
    let window_size = config.window_samples_at(sample_rate);
    let hop_size = config.hop_samples_at(sample_rate);
    if hop_size == 0 {
        return Err(ComparisonError::InvalidInput(format!(
            "Hop of {} ms is shorter than one sample at {} Hz",
            config.hop_ms, sample_rate
        )));
    }

    let mut yin = YinEstimator::new(
        sample_rate,
        window_size,
        config.min_frequency_hz,
        config.max_frequency_hz,
    )?;
    let gate = SilenceGate::new(config.silence_threshold_db);
    let threshold = 1.0 - config.voicing_confidence_floor;

    log::debug!(
        "Extracting pitch contour: {} samples at {} Hz, window={}, hop={}",
        buffer.frame_count(),
        sample_rate,
        window_size,
        hop_size
    );

    let mut frames = Vec::with_capacity(buffer.window_count(window_size, hop_size));
    let mut silent_frames = 0usize;

    for (start, window) in buffer.windows(window_size, hop_size) {
        let time_seconds = start as f32 / sample_rate as f32;

        if gate.is_silent(window) {
            silent_frames += 1;
            frames.push(PitchFrame {
                time_seconds,
                frequency_hz: None,
                confidence: 0.0,
            });
            continue;
        }

        let frame = match yin.estimate(window, threshold)? {
            Some(estimate) => {
                let in_range = estimate.frequency_hz >= config.min_frequency_hz * 0.97
                    && estimate.frequency_hz <= config.max_frequency_hz * 1.03;
                let voiced = in_range && estimate.confidence >= config.voicing_confidence_floor;
                PitchFrame {
                    time_seconds,
                    frequency_hz: voiced.then_some(estimate.frequency_hz),
                    confidence: estimate.confidence,
                }
            }
            None => PitchFrame {
                time_seconds,
                frequency_hz: None,
                confidence: 0.0,
            },
        };
        frames.push(frame);
    }

    let contour = PitchContour {
        frames,
        hop_seconds: hop_size as f32 / sample_rate as f32,
    };

    let voiced = contour.voiced_frames().count();
    log::debug!(
        "Pitch contour: {} frames, {} silent, {} voiced ({:.1}%)",
        contour.len(),
        silent_frames,
        voiced,
        contour.voiced_ratio() * 100.0
    );

    if voiced == 0 {
        return Err(ComparisonError::EmptyAudio(format!(
            "No voiced frames in {:.2} s of audio",
            buffer.duration_seconds()
        )));
    }

    Ok(contour)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;

    fn tone_sequence(notes: &[(f32, f32)]) -> AudioBuffer {
        let mut samples = Vec::new();
        for &(freq, seconds) in notes {
            let len = (seconds * SR as f32) as usize;
            samples.extend((0..len).map(|i| {
                if freq > 0.0 {
                    0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin()
                } else {
                    0.0
                }
            }));
        }
        AudioBuffer::mono(samples, SR).unwrap()
    }

    #[test]
    fn test_frame_count_and_hop() {
        let buffer = tone_sequence(&[(440.0, 1.0)]);
        let contour = extract(&buffer, &ComparisonConfig::default()).unwrap();

        // (22050 - 882) / 221 + 1
        assert_eq!(contour.len(), 96);
        assert!((contour.hop_seconds - 0.01).abs() < 1e-3);
        assert!((contour.frames[1].time_seconds - contour.hop_seconds).abs() < 1e-6);
    }

    #[test]
    fn test_framing_follows_buffer_rate() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let buffer = AudioBuffer::mono(samples, 44100).unwrap();
        let config = ComparisonConfig::default();
        let contour = extract(&buffer, &config).unwrap();

        let expected =
            buffer.window_count(config.window_samples_at(44100), config.hop_samples_at(44100));
        assert_eq!(contour.len(), expected);
        assert_eq!(contour.len(), 97);
        assert!((contour.hop_seconds - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_steady_tone_is_voiced() {
        let buffer = tone_sequence(&[(261.63, 0.5)]);
        let contour = extract(&buffer, &ComparisonConfig::default()).unwrap();

        assert!(contour.voiced_ratio() > 0.95);
        for frame in contour.voiced_frames() {
            let f = frame.frequency_hz.unwrap();
            assert!((f - 261.63).abs() < 2.0, "Frame estimated at {:.2} Hz", f);
            assert!(frame.confidence >= 0.8);
        }
    }

    #[test]
    fn test_silence_gap_is_unvoiced() {
        let buffer = tone_sequence(&[(330.0, 0.3), (0.0, 0.3), (330.0, 0.3)]);
        let contour = extract(&buffer, &ComparisonConfig::default()).unwrap();

        let middle = contour
            .frames
            .iter()
            .filter(|f| f.time_seconds > 0.35 && f.time_seconds < 0.5);
        for frame in middle {
            assert!(!frame.is_voiced());
            assert_eq!(frame.confidence, 0.0);
        }
    }

    #[test]
    fn test_all_silent_is_empty_audio() {
        let buffer = tone_sequence(&[(0.0, 1.0)]);
        assert!(matches!(
            extract(&buffer, &ComparisonConfig::default()),
            Err(ComparisonError::EmptyAudio(_))
        ));
    }

    #[test]
    fn test_shorter_than_window_is_empty_audio() {
        let buffer = tone_sequence(&[(440.0, 0.01)]);
        assert!(matches!(
            extract(&buffer, &ComparisonConfig::default()),
            Err(ComparisonError::EmptyAudio(_))
        ));
    }

    #[test]
    fn test_stereo_rejected() {
        let buffer = AudioBuffer::new(vec![0.0; 4000], SR, 2).unwrap();
        assert!(matches!(
            extract(&buffer, &ComparisonConfig::default()),
            Err(ComparisonError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let buffer = tone_sequence(&[(220.0, 0.2), (277.18, 0.2), (329.63, 0.2)]);
        let config = ComparisonConfig::default();
        assert_eq!(extract(&buffer, &config).unwrap(), extract(&buffer, &config).unwrap());
    }
}
