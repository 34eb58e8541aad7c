//! Melody normalization
//!
//! Converts an absolute pitch contour into a transposition-invariant,
//! duration-aware note sequence:
//! - Segmentation of stable voiced runs into notes
//! - Semitone quantization, interval encoding and median-relative durations

pub mod normalizer;
pub mod segmentation;

pub use normalizer::normalize;
pub use segmentation::{segment_notes, PitchedNote};

use crate::error::ComparisonError;
use serde::{Deserialize, Serialize};

/// One note of a normalized melody
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelodyNote {
    /// Signed semitone interval from the previous note (0 for the first note)
    pub interval_semitones: i32,

    /// Duration in beats, where one beat is the melody's median note duration
    pub duration_beats: f32,
}

/// Transposition-invariant note sequence
///
/// Always holds at least two notes; the first note's absolute pitch is
/// discarded and it carries interval 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodySequence {
    notes: Vec<MelodyNote>,
}

impl MelodySequence {
    /// Build a sequence from absolute-pitch notes
    ///
    /// Quantizes each pitch to the nearest semitone, re-expresses it as the
    /// interval from the preceding note and divides each duration by the
    /// median duration.
    ///
    /// # Errors
    ///
    /// - `ComparisonError::EmptyAudio` for fewer than two notes
    /// - `ComparisonError::InvalidInput` for non-finite pitches or non-positive durations
    pub fn from_pitched_notes(notes: &[PitchedNote]) -> Result<Self, ComparisonError> {
        normalizer::encode_notes(notes).map(|notes| Self { notes })
    }

    /// Build a sequence from symbolic `(midi_pitch, duration_seconds)` notes
    ///
    /// Runs the same quantization and duration normalization as audio input.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_melody::MelodySequence;
    ///
    /// let melody = MelodySequence::from_midi_notes(&[(60, 0.5), (62, 0.5), (59, 1.0)])?;
    /// assert_eq!(melody.intervals(), vec![0, 2, -3]);
    /// assert_eq!(melody.notes()[2].duration_beats, 2.0);
    /// # Ok::<(), stratum_melody::ComparisonError>(())
    /// ```
    pub fn from_midi_notes(notes: &[(u8, f32)]) -> Result<Self, ComparisonError> {
        let mut onset = 0.0f32;
        let pitched: Vec<PitchedNote> = notes
            .iter()
            .map(|&(pitch, duration_seconds)| {
                let note = PitchedNote {
                    midi_pitch: pitch as f32,
                    onset_seconds: onset,
                    duration_seconds,
                };
                onset += duration_seconds.max(0.0);
                note
            })
            .collect();
        Self::from_pitched_notes(&pitched)
    }

    /// Notes in order
    pub fn notes(&self) -> &[MelodyNote] {
        &self.notes
    }

    /// Interval of every note (the first is always 0)
    pub fn intervals(&self) -> Vec<i32> {
        self.notes.iter().map(|n| n.interval_semitones).collect()
    }

    /// Number of notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false for a constructed sequence; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
