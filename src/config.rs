//! Configuration parameters for melody comparison

use crate::error::ComparisonError;
use crate::preprocessing::normalization::NormalizationMethod;
use serde::{Deserialize, Serialize};

/// Largest accepted value for any alignment cost
pub const MAX_COST: f32 = 1.0e6;

/// Comparison configuration parameters
///
/// All values are tunable defaults consistent with common melody-matching
/// practice. Use [`ComparisonConfig::validate`] before handing a hand-built
/// configuration to the engine (the public entry points do this themselves).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    // Decoding
    /// Canonical sample rate every input is resampled to (default: 22050)
    pub target_sample_rate: u32,

    /// Largest accepted input payload in bytes (default: 10 MiB)
    pub max_input_bytes: usize,

    // Preprocessing
    /// Loudness normalization applied before pitch extraction (default: Peak)
    pub normalization: NormalizationMethod,

    /// Frames with RMS below this level (dB relative to full scale, after
    /// normalization) are treated as silent (default: -40.0)
    pub silence_threshold_db: f32,

    // Pitch contour
    /// Analysis window length in milliseconds (default: 40.0)
    pub window_ms: f32,

    /// Hop between consecutive frames in milliseconds (default: 10.0)
    pub hop_ms: f32,

    /// Lowest fundamental frequency searched, in Hz (default: 70.0)
    pub min_frequency_hz: f32,

    /// Highest fundamental frequency searched, in Hz (default: 1000.0)
    pub max_frequency_hz: f32,

    /// Frames whose voicing confidence falls below this floor are unvoiced (default: 0.8)
    pub voicing_confidence_floor: f32,

    // Melody normalization
    /// Half-width of the band (in semitones) within which consecutive frames
    /// belong to the same note (default: 0.5)
    pub pitch_stability_semitones: f32,

    /// Unvoiced gaps up to this length are bridged inside a note (default: 30.0)
    pub max_gap_ms: f32,

    /// Voiced runs shorter than this are dropped rather than encoded as notes (default: 60.0)
    pub min_note_ms: f32,

    // Alignment
    /// Substitution cost per semitone of interval difference (default: 0.5)
    pub semitone_cost: f32,

    /// Cap on the interval part of the substitution cost (default: 2.0)
    pub max_interval_cost: f32,

    /// Cost of an extra or missing note (default: 1.0)
    pub gap_penalty: f32,

    /// Weight of the duration mismatch term (default: 0.5)
    pub duration_weight: f32,

    /// Duration ratio mismatch (in octaves, i.e. log2 units) that costs nothing (default: 0.5)
    pub duration_tolerance: f32,

    /// Warping band half-width as a fraction of the longer sequence (default: 0.3)
    pub band_ratio: f32,

    /// Score at or above which two melodies are considered a match (default: 0.8)
    pub match_threshold: f32,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 22_050,
            max_input_bytes: 10 * 1024 * 1024,
            normalization: NormalizationMethod::Peak,
            silence_threshold_db: -40.0,
            window_ms: 40.0,
            hop_ms: 10.0,
            min_frequency_hz: 70.0,
            max_frequency_hz: 1000.0,
            voicing_confidence_floor: 0.8,
            pitch_stability_semitones: 0.5,
            max_gap_ms: 30.0,
            min_note_ms: 60.0,
            semitone_cost: 0.5,
            max_interval_cost: 2.0,
            gap_penalty: 1.0,
            duration_weight: 0.5,
            duration_tolerance: 0.5,
            band_ratio: 0.3,
            match_threshold: 0.8,
        }
    }
}

impl ComparisonConfig {
    /// Override the match threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Window length in samples at the canonical rate
    pub fn window_samples(&self) -> usize {
        self.window_samples_at(self.target_sample_rate)
    }

    /// Hop length in samples at the canonical rate
    pub fn hop_samples(&self) -> usize {
        self.hop_samples_at(self.target_sample_rate)
    }

    /// Window length in samples at `sample_rate`
    pub fn window_samples_at(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.window_ms, sample_rate)
    }

    /// Hop length in samples at `sample_rate`
    pub fn hop_samples_at(&self, sample_rate: u32) -> usize {
        ms_to_samples(self.hop_ms, sample_rate)
    }

    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), ComparisonError> {
        let invalid = |msg: String| Err(ComparisonError::InvalidInput(msg));

        if self.target_sample_rate == 0 {
            return invalid("target_sample_rate must be > 0".to_string());
        }
        if self.max_input_bytes == 0 {
            return invalid("max_input_bytes must be > 0".to_string());
        }
        if self.hop_samples() == 0 || self.window_samples() < 2 {
            return invalid(format!(
                "window ({} ms) and hop ({} ms) too short for {} Hz",
                self.window_ms, self.hop_ms, self.target_sample_rate
            ));
        }
        if !(self.min_frequency_hz > 0.0 && self.min_frequency_hz < self.max_frequency_hz) {
            return invalid(format!(
                "Invalid frequency range: [{:.1}, {:.1}] Hz",
                self.min_frequency_hz, self.max_frequency_hz
            ));
        }
        if self.max_frequency_hz * 2.0 > self.target_sample_rate as f32 {
            return invalid(format!(
                "max_frequency_hz {:.1} exceeds Nyquist for {} Hz",
                self.max_frequency_hz, self.target_sample_rate
            ));
        }
        // The longest period must fit twice into the window for the difference function.
        let max_period = (self.target_sample_rate as f32 / self.min_frequency_hz).ceil() as usize;
        if max_period * 2 > self.window_samples() {
            return invalid(format!(
                "window of {} samples cannot resolve {:.1} Hz (period {} samples)",
                self.window_samples(),
                self.min_frequency_hz,
                max_period
            ));
        }
        if !(0.0..=1.0).contains(&self.voicing_confidence_floor) {
            return invalid("voicing_confidence_floor must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return invalid("match_threshold must be in [0, 1]".to_string());
        }
        if !(self.pitch_stability_semitones > 0.0) {
            return invalid("pitch_stability_semitones must be > 0".to_string());
        }
        if !(self.gap_penalty > 0.0) {
            return invalid("gap_penalty must be > 0".to_string());
        }
        let non_negative = [
            ("max_gap_ms", self.max_gap_ms),
            ("min_note_ms", self.min_note_ms),
            ("semitone_cost", self.semitone_cost),
            ("max_interval_cost", self.max_interval_cost),
            ("duration_weight", self.duration_weight),
            ("duration_tolerance", self.duration_tolerance),
            ("band_ratio", self.band_ratio),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return invalid(format!("{} must be a finite value >= 0", name));
            }
        }
        let costs = [
            ("semitone_cost", self.semitone_cost),
            ("max_interval_cost", self.max_interval_cost),
            ("gap_penalty", self.gap_penalty),
            ("duration_weight", self.duration_weight),
        ];
        for (name, value) in costs {
            if value > MAX_COST {
                return invalid(format!("{} must be <= {}", name, MAX_COST));
            }
        }
        if !self.silence_threshold_db.is_finite() {
            return invalid("silence_threshold_db must be finite".to_string());
        }

        Ok(())
    }
}

fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    if !(ms > 0.0) {
        return 0;
    }
    (ms * sample_rate as f32 / 1000.0).round() as usize
}
