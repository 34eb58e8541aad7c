//! Melody normalization
//!
//! Algorithm:
//! 1. Segment the contour into notes (see [`segment_notes`])
//! 2. Quantize each note to the nearest semitone
//! 3. Replace absolute pitch with the signed interval from the preceding
//!    note (the first note keeps interval 0), so transposing the whole input
//!    leaves the sequence unchanged
//! 4. Express each duration as a multiple of the median note duration, so
//!    a uniform tempo change leaves the sequence unchanged

use super::segmentation::{segment_notes, PitchedNote};
use super::{MelodyNote, MelodySequence};
use crate::config::ComparisonConfig;
use crate::error::ComparisonError;
use crate::features::pitch::PitchContour;

/// Normalize a pitch contour into a melody sequence
///
/// # Errors
///
/// Returns `ComparisonError::EmptyAudio` when fewer than two notes survive
/// segmentation (no interval can be formed).
pub fn normalize(
    contour: &PitchContour,
    config: &ComparisonConfig,
) -> Result<MelodySequence, ComparisonError> {
    let notes = segment_notes(contour, config);
    let melody = MelodySequence::from_pitched_notes(&notes)?;

    log::debug!(
        "Normalized melody: {} notes, intervals {:?}",
        melody.len(),
        melody.intervals()
    );

    Ok(melody)
}

pub(crate) fn encode_notes(notes: &[PitchedNote]) -> Result<Vec<MelodyNote>, ComparisonError> {
    if notes.len() < 2 {
        return Err(ComparisonError::EmptyAudio(format!(
            "Melody needs at least 2 notes, found {}",
            notes.len()
        )));
    }

    for note in notes {
        if !note.midi_pitch.is_finite() {
            return Err(ComparisonError::InvalidInput(format!(
                "Non-finite pitch {}",
                note.midi_pitch
            )));
        }
        if !(note.duration_seconds > 0.0) || !note.duration_seconds.is_finite() {
            return Err(ComparisonError::InvalidInput(format!(
                "Note duration must be positive, got {}",
                note.duration_seconds
            )));
        }
    }

    let median_duration = median_duration(notes);

    let mut previous: Option<i32> = None;
    let encoded = notes
        .iter()
        .map(|note| {
            let semitone = note.midi_pitch.round() as i32;
            let interval = previous.map_or(0, |p| semitone - p);
            previous = Some(semitone);
            MelodyNote {
                interval_semitones: interval,
                duration_beats: note.duration_seconds / median_duration,
            }
        })
        .collect();

    Ok(encoded)
}

fn median_duration(notes: &[PitchedNote]) -> f32 {
    let mut durations: Vec<f32> = notes.iter().map(|n| n.duration_seconds).collect();
    durations.sort_by(|a, b| a.total_cmp(b));
    let mid = durations.len() / 2;
    if durations.len() % 2 == 0 {
        (durations[mid - 1] + durations[mid]) / 2.0
    } else {
        durations[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pitch::PitchFrame;

    #[test]
    fn test_intervals_from_midi() {
        let melody = MelodySequence::from_midi_notes(&[(60, 0.5), (62, 0.5), (64, 0.5), (65, 0.5)])
            .unwrap();
        assert_eq!(melody.intervals(), vec![0, 2, 2, 1]);
        assert!(melody.notes().iter().all(|n| n.duration_beats == 1.0));
    }

    #[test]
    fn test_transposition_invariance() {
        let original = [(60, 0.25), (67, 0.5), (65, 0.25), (64, 1.0)];
        let shifted: Vec<(u8, f32)> = original.iter().map(|&(p, d)| (p + 5, d)).collect();

        assert_eq!(
            MelodySequence::from_midi_notes(&original).unwrap(),
            MelodySequence::from_midi_notes(&shifted).unwrap()
        );
    }

    #[test]
    fn test_uniform_tempo_change_invariance() {
        let original = [(60, 0.25), (62, 0.25), (64, 0.5), (60, 1.0)];
        let slower: Vec<(u8, f32)> = original.iter().map(|&(p, d)| (p, d * 2.0)).collect();

        assert_eq!(
            MelodySequence::from_midi_notes(&original).unwrap(),
            MelodySequence::from_midi_notes(&slower).unwrap()
        );
    }

    #[test]
    fn test_quantizes_to_nearest_semitone() {
        let notes = [
            PitchedNote { midi_pitch: 59.8, onset_seconds: 0.0, duration_seconds: 0.3 },
            PitchedNote { midi_pitch: 62.3, onset_seconds: 0.3, duration_seconds: 0.3 },
            PitchedNote { midi_pitch: 63.6, onset_seconds: 0.6, duration_seconds: 0.6 },
        ];
        let melody = MelodySequence::from_pitched_notes(&notes).unwrap();
        assert_eq!(melody.intervals(), vec![0, 2, 2]);
        assert_eq!(melody.notes()[2].duration_beats, 2.0);
    }

    #[test]
    fn test_median_of_even_count() {
        let melody =
            MelodySequence::from_midi_notes(&[(60, 0.2), (61, 0.4), (62, 0.6), (63, 0.8)]).unwrap();
        // Median is 0.5
        assert!((melody.notes()[0].duration_beats - 0.4).abs() < 1e-6);
        assert!((melody.notes()[3].duration_beats - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_single_note_is_empty_audio() {
        assert!(matches!(
            MelodySequence::from_midi_notes(&[(60, 1.0)]),
            Err(ComparisonError::EmptyAudio(_))
        ));
        assert!(matches!(
            MelodySequence::from_midi_notes(&[]),
            Err(ComparisonError::EmptyAudio(_))
        ));
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(matches!(
            MelodySequence::from_midi_notes(&[(60, 0.5), (62, 0.0)]),
            Err(ComparisonError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_normalize_contour() {
        let hz = |midi: f32| 440.0 * 2.0f32.powf((midi - 69.0) / 12.0);
        let mut frames = Vec::new();
        for (pitch, count) in [(Some(57.0), 25), (None, 10), (Some(60.0), 25), (Some(55.0), 50)] {
            for _ in 0..count {
                frames.push(PitchFrame {
                    time_seconds: frames.len() as f32 * 0.01,
                    frequency_hz: pitch.map(hz),
                    confidence: 0.9,
                });
            }
        }
        let contour = PitchContour { frames, hop_seconds: 0.01 };

        let melody = normalize(&contour, &ComparisonConfig::default()).unwrap();
        assert_eq!(melody.intervals(), vec![0, 3, -5]);
        assert!((melody.notes()[2].duration_beats - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_one_note_contour_is_empty_audio() {
        let frames = (0..100)
            .map(|i| PitchFrame {
                time_seconds: i as f32 * 0.01,
                frequency_hz: Some(440.0),
                confidence: 0.95,
            })
            .collect();
        let contour = PitchContour { frames, hop_seconds: 0.01 };

        assert!(matches!(
            normalize(&contour, &ComparisonConfig::default()),
            Err(ComparisonError::EmptyAudio(_))
        ));
    }
}
