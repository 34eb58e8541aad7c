//! Note segmentation
//!
//! Collapses consecutive voiced frames whose pitch stays within a band around
//! the running mean of the current note into a single note. Unvoiced gaps up
//! to `max_gap_ms` are bridged when the pitch resumes inside the band; longer
//! gaps, and gaps followed by a different pitch, end the note. Runs shorter
//! than `min_note_ms` are dropped, so silence and short glitches never become
//! notes.

use crate::config::ComparisonConfig;
use crate::features::pitch::PitchContour;
use serde::{Deserialize, Serialize};

/// A note with absolute pitch, before interval encoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchedNote {
    /// Pitch on the MIDI scale (69.0 = A4 = 440 Hz), not yet quantized
    pub midi_pitch: f32,

    /// Onset in seconds
    pub onset_seconds: f32,

    /// Duration in seconds (frame count × hop)
    pub duration_seconds: f32,
}

/// Convert a frequency to a fractional MIDI pitch
pub fn hz_to_midi(frequency_hz: f32) -> f32 {
    69.0 + 12.0 * (frequency_hz / 440.0).log2()
}

struct OpenNote {
    start_frame: usize,
    last_voiced_frame: usize,
    pitches: Vec<f32>,
    pitch_sum: f64,
}

impl OpenNote {
    fn new(frame: usize, pitch: f32) -> Self {
        Self {
            start_frame: frame,
            last_voiced_frame: frame,
            pitches: vec![pitch],
            pitch_sum: pitch as f64,
        }
    }

    fn mean(&self) -> f32 {
        (self.pitch_sum / self.pitches.len() as f64) as f32
    }

    fn push(&mut self, frame: usize, pitch: f32) {
        self.last_voiced_frame = frame;
        self.pitches.push(pitch);
        self.pitch_sum += pitch as f64;
    }
}

/// Segment a pitch contour into notes
pub fn segment_notes(contour: &PitchContour, config: &ComparisonConfig) -> Vec<PitchedNote> {
    let hop = contour.hop_seconds;
    if contour.is_empty() || !(hop > 0.0) {
        return Vec::new();
    }

    let max_gap_frames = ms_to_frames(config.max_gap_ms, hop).round() as usize;
    // Tolerance keeps an exact multiple of the hop from rounding up a frame
    let min_note_frames = ((ms_to_frames(config.min_note_ms, hop) - 1e-3).ceil() as usize).max(1);
    let band = config.pitch_stability_semitones;

    let mut notes = Vec::new();
    let mut dropped = 0usize;
    let mut current: Option<OpenNote> = None;

    let mut close = |note: OpenNote, notes: &mut Vec<PitchedNote>| {
        let frame_count = note.last_voiced_frame - note.start_frame + 1;
        if frame_count < min_note_frames {
            dropped += 1;
            return;
        }
        notes.push(PitchedNote {
            midi_pitch: median(note.pitches),
            onset_seconds: contour.frames[note.start_frame].time_seconds,
            duration_seconds: frame_count as f32 * hop,
        });
    };

    for (index, frame) in contour.frames.iter().enumerate() {
        match frame.frequency_hz {
            Some(frequency) => {
                let pitch = hz_to_midi(frequency);
                if let Some(mut open) = current.take() {
                    let gap = index - open.last_voiced_frame - 1;
                    if gap <= max_gap_frames && (pitch - open.mean()).abs() <= band {
                        open.push(index, pitch);
                        current = Some(open);
                        continue;
                    }
                    close(open, &mut notes);
                }
                current = Some(OpenNote::new(index, pitch));
            }
            None => {
                if let Some(open) = current.take() {
                    if index - open.last_voiced_frame > max_gap_frames {
                        close(open, &mut notes);
                    } else {
                        current = Some(open);
                    }
                }
            }
        }
    }
    if let Some(open) = current.take() {
        close(open, &mut notes);
    }

    log::debug!(
        "Segmented {} notes ({} runs shorter than {} frames dropped)",
        notes.len(),
        dropped,
        min_note_frames
    );

    notes
}

fn ms_to_frames(ms: f32, hop_seconds: f32) -> f32 {
    ms / (hop_seconds * 1000.0)
}

fn median(mut values: Vec<f32>) -> f32 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
