//! Comparison result types

use serde::{Deserialize, Serialize};

/// Outcome of aligning two melody sequences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Cost of the optimal alignment, in configured cost units
    pub raw_distance: f32,

    /// `1 - raw_distance / max_possible_distance`, clamped to [0, 1]
    pub normalized_score: f32,

    /// Number of steps (substitutions, insertions and deletions) on the chosen path
    pub aligned_length: usize,
}

/// Result of comparing two recordings
///
/// Immutable value; identical inputs and configuration always produce a
/// bit-identical result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Melodic similarity (0.0-1.0)
    pub score: f32,

    /// Whether `score` reached `threshold`
    pub is_match: bool,

    /// Threshold the decision used
    pub threshold: f32,
}

impl ComparisonResult {
    /// Build a result, deciding the match against `threshold`
    pub fn from_score(score: f32, threshold: f32) -> Self {
        Self {
            score,
            is_match: score >= threshold,
            threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(ComparisonResult::from_score(0.8, 0.8).is_match);
        assert!(!ComparisonResult::from_score(0.79, 0.8).is_match);
        assert!(ComparisonResult::from_score(1.0, 0.8).is_match);
    }

    #[test]
    fn test_serializes_with_field_names() {
        let result = ComparisonResult::from_score(0.9, 0.8);
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["is_match"], serde_json::Value::Bool(true));
        assert!(json.get("score").is_some());
        assert!(json.get("threshold").is_some());
    }
}
