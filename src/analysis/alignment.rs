//! Tempo-tolerant melody alignment
//!
//! Banded edit distance between two interval sequences, in the spirit of
//! dynamic time warping:
//!
//! - **Substitution**: grows with the semitone difference between the two
//!   intervals (capped), plus a duration term when the two notes' relative
//!   lengths differ by more than a tolerance
//! - **Insertion / deletion**: fixed penalty for an extra or missing note
//! - **Band**: only cells with `|i - j| <= w` are evaluated, where `w` is a
//!   fraction of the longer sequence (never narrower than the length
//!   difference), so work is `O(n * w)` instead of `O(n * m)`
//!
//! # Algorithm
//!
//! All costs are converted to integer cost units (1/1000 of a configured
//! unit) before the DP runs. Comparing integers keeps the minimum exact, so
//! `align(a, b)` and `align(b, a)` reach bit-identical distances. The DP keeps
//! two rolling rows of `(cost, indels, steps)` cells; among equal-cost
//! predecessors the one with fewer insertions/deletions wins, and remaining
//! ties fall back to the order diagonal, deletion, insertion.
//!
//! `normalized_score = 1 - raw / max_possible(n, m)` where
//! `max_possible = min(min(n,m) * max_sub + |n-m| * gap, (n+m) * gap)`.
//! Both terms are paths that stay inside the band, so the optimal distance
//! never exceeds it.
//!
//! # Example
//!
//! ```
//! use stratum_melody::{analysis::align, ComparisonConfig, MelodySequence};
//!
//! let a = MelodySequence::from_midi_notes(&[(60, 0.5), (62, 0.5), (64, 0.5), (65, 0.5)])?;
//! let b = MelodySequence::from_midi_notes(&[(67, 0.4), (69, 0.4), (71, 0.4), (72, 0.4)])?;
//!
//! let result = align(&a, &b, &ComparisonConfig::default())?;
//! assert_eq!(result.normalized_score, 1.0);
//! # Ok::<(), stratum_melody::ComparisonError>(())
//! ```

use super::result::AlignmentResult;
use crate::config::ComparisonConfig;
use crate::error::ComparisonError;
use crate::features::melody::{MelodyNote, MelodySequence};

/// Integer cost units per configured cost unit
const COST_SCALE: f64 = 1000.0;

/// Alignment costs in integer cost units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentCosts {
    /// Cost per semitone of interval difference
    pub semitone: u64,
    /// Cap on the interval part of a substitution
    pub max_interval: u64,
    /// Insertion / deletion penalty
    pub gap: u64,
    /// Largest duration part of a substitution
    pub duration_weight: u64,
    /// Free duration mismatch, in octaves of duration ratio
    pub duration_tolerance: f64,
}

impl AlignmentCosts {
    /// Convert configured costs to cost units
    pub fn from_config(config: &ComparisonConfig) -> Self {
        Self {
            semitone: to_units(config.semitone_cost),
            max_interval: to_units(config.max_interval_cost),
            gap: to_units(config.gap_penalty),
            duration_weight: to_units(config.duration_weight),
            duration_tolerance: config.duration_tolerance as f64,
        }
    }

    /// Most expensive possible substitution
    pub fn max_substitution(&self) -> u64 {
        self.max_interval + self.duration_weight
    }

    /// Cost of aligning note `a` with note `b`
    ///
    /// Symmetric in its arguments. Durations must be positive and finite.
    pub fn substitution(&self, a: &MelodyNote, b: &MelodyNote) -> u64 {
        let interval_diff = (a.interval_semitones as i64 - b.interval_semitones as i64).unsigned_abs();
        let interval_cost = interval_diff
            .saturating_mul(self.semitone)
            .min(self.max_interval);

        let log_ratio = ((a.duration_beats as f64).log2() - (b.duration_beats as f64).log2()).abs();
        let excess = (log_ratio - self.duration_tolerance).clamp(0.0, 1.0);
        let duration_cost = (self.duration_weight as f64 * excess).round() as u64;

        interval_cost + duration_cost
    }

    /// Upper bound on the distance between sequences of length `n` and `m`
    pub fn max_distance(&self, n: usize, m: usize) -> u64 {
        let (n, m) = (n as u64, m as u64);
        let mixed = n
            .min(m)
            .saturating_mul(self.max_substitution())
            .saturating_add(n.abs_diff(m).saturating_mul(self.gap));
        let all_gaps = (n + m).saturating_mul(self.gap);
        mixed.min(all_gaps)
    }
}

fn to_units(value: f32) -> u64 {
    (value as f64 * COST_SCALE).round().max(0.0) as u64
}

/// Half-width of the warping band
fn band_width(n: usize, m: usize, band_ratio: f32) -> usize {
    // Tolerance keeps an exact product (0.3 * 10) from rounding up a cell
    let proportional = (band_ratio as f64 * n.max(m) as f64 - 1e-4).ceil().max(0.0) as usize;
    proportional.max(n.abs_diff(m)).max(1)
}

/// One DP cell: best cost so far and the shape of the path reaching it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    cost: u64,
    indels: u32,
    steps: u32,
}

impl Cell {
    const ORIGIN: Cell = Cell { cost: 0, indels: 0, steps: 0 };
    const UNREACHABLE: Cell = Cell { cost: u64::MAX, indels: 0, steps: 0 };

    /// `count` consecutive gap moves from the origin
    fn gap_run(count: usize, gap: u64) -> Cell {
        Cell {
            cost: (count as u64).saturating_mul(gap),
            indels: count as u32,
            steps: count as u32,
        }
    }

    fn step(self, cost: u64, is_indel: bool) -> Cell {
        if self.cost == u64::MAX {
            return Cell::UNREACHABLE;
        }
        Cell {
            cost: self.cost.saturating_add(cost),
            indels: self.indels + is_indel as u32,
            steps: self.steps + 1,
        }
    }

    /// Keep `self` unless `other` is strictly better
    fn better(self, other: Cell) -> Cell {
        if (other.cost, other.indels) < (self.cost, self.indels) {
            other
        } else {
            self
        }
    }
}

fn check_durations(melody: &MelodySequence, label: &str) -> Result<(), ComparisonError> {
    match melody
        .notes()
        .iter()
        .find(|n| !(n.duration_beats > 0.0 && n.duration_beats.is_finite()))
    {
        Some(note) => Err(ComparisonError::InvalidInput(format!(
            "{} melody has invalid duration {}",
            label, note.duration_beats
        ))),
        None => Ok(()),
    }
}

/// Align two melody sequences
///
/// # Arguments
///
/// * `a`, `b` - Normalized melodies
/// * `config` - Supplies costs and band ratio
///
/// # Returns
///
/// `AlignmentResult` with the raw distance (in configured cost units), the
/// normalized score in `[0, 1]` and the number of steps on the chosen path
///
/// # Errors
///
/// - `ComparisonError::EmptyAudio` if either sequence has no notes
/// - `ComparisonError::InvalidInput` for non-positive or non-finite durations
/// - `ComparisonError::Computation` if the score is not finite
pub fn align(
    a: &MelodySequence,
    b: &MelodySequence,
    config: &ComparisonConfig,
) -> Result<AlignmentResult, ComparisonError> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return Err(ComparisonError::EmptyAudio(format!(
            "Cannot align empty melody ({} vs {} notes)",
            n, m
        )));
    }
    check_durations(a, "First")?;
    check_durations(b, "Second")?;

    let costs = AlignmentCosts::from_config(config);
    let band = band_width(n, m, config.band_ratio);
    let a_notes = a.notes();
    let b_notes = b.notes();

    log::debug!("Aligning {} x {} notes, band half-width {}", n, m, band);

    let mut prev = vec![Cell::UNREACHABLE; m + 1];
    let mut curr = vec![Cell::UNREACHABLE; m + 1];

    prev[0] = Cell::ORIGIN;
    for j in 1..=band.min(m) {
        prev[j] = Cell::gap_run(j, costs.gap);
    }

    for i in 1..=n {
        let j_lo = i.saturating_sub(band);
        let j_hi = (i + band).min(m);

        // Cells left of the band still hold values from two rows ago
        if j_lo == 0 {
            curr[0] = Cell::gap_run(i, costs.gap);
        } else {
            curr[j_lo - 1] = Cell::UNREACHABLE;
        }

        let note_a = &a_notes[i - 1];
        for j in j_lo.max(1)..=j_hi {
            let substitution = costs.substitution(note_a, &b_notes[j - 1]);

            let diagonal = prev[j - 1].step(substitution, false);
            let deletion = prev[j].step(costs.gap, true);
            let insertion = curr[j - 1].step(costs.gap, true);

            curr[j] = diagonal.better(deletion).better(insertion);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    let end = prev[m];
    if end.cost == u64::MAX {
        return Err(ComparisonError::Computation(
            "Alignment band does not reach the final cell".to_string(),
        ));
    }

    let max_distance = costs.max_distance(n, m);
    let score = 1.0 - end.cost as f64 / max_distance as f64;
    if !score.is_finite() {
        return Err(ComparisonError::Computation(format!(
            "Non-finite similarity score (distance {}, max {})",
            end.cost, max_distance
        )));
    }

    let result = AlignmentResult {
        raw_distance: (end.cost as f64 / COST_SCALE) as f32,
        normalized_score: score.clamp(0.0, 1.0) as f32,
        aligned_length: end.steps as usize,
    };

    log::debug!(
        "Alignment cost {:.3} of max {:.3} ({} steps, {} indels), score {:.4}",
        result.raw_distance,
        max_distance as f64 / COST_SCALE,
        end.steps,
        end.indels,
        result.normalized_score
    );

    Ok(result)
}
