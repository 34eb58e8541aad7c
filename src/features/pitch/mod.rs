//! Pitch contour extraction
//!
//! Frames the mono PCM stream and estimates, per frame, the fundamental
//! frequency and a voicing confidence:
//! - YIN estimator with FFT-accelerated difference function
//! - Frame-level silence gating
//! - Contour assembly

pub mod contour;
pub mod yin;

pub use contour::extract;
pub use yin::{PitchEstimate, YinEstimator};

use serde::{Deserialize, Serialize};

/// One analysis frame of a pitch contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchFrame {
    /// Start of the analysis window, in seconds from the beginning of the buffer
    pub time_seconds: f32,

    /// Estimated fundamental frequency, `None` when the frame is unvoiced
    pub frequency_hz: Option<f32>,

    /// Voicing confidence (0.0-1.0)
    ///
    /// `1 - d'(τ)` where `d'` is the cumulative mean normalized difference at
    /// the selected lag; 0.0 for frames rejected by the silence gate.
    pub confidence: f32,
}

impl PitchFrame {
    /// Whether a frequency was assigned to this frame
    pub fn is_voiced(&self) -> bool {
        self.frequency_hz.is_some()
    }
}

/// Time-ordered pitch contour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchContour {
    /// Frames in time order, one per hop
    pub frames: Vec<PitchFrame>,

    /// Hop between consecutive frames in seconds
    pub hop_seconds: f32,
}

impl PitchContour {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the contour has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterator over voiced frames
    pub fn voiced_frames(&self) -> impl Iterator<Item = &PitchFrame> {
        self.frames.iter().filter(|f| f.is_voiced())
    }

    /// Fraction of frames that are voiced (0.0 for an empty contour)
    pub fn voiced_ratio(&self) -> f32 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.voiced_frames().count() as f32 / self.frames.len() as f32
    }
}
