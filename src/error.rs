//! Error types for the melody comparison engine

use std::fmt;

/// Errors that can occur while comparing two recordings
///
/// Every variant aborts the whole comparison; the engine never returns a
/// score computed from partial data.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonError {
    /// Malformed, truncated or unsupported audio payload
    Decode(String),

    /// Decodable audio without usable melodic content (silence, noise, fewer than two notes)
    EmptyAudio(String),

    /// Internal invariant violation (unexpected numeric state)
    Computation(String),

    /// Invalid configuration or input parameters
    InvalidInput(String),
}

impl ComparisonError {
    /// Whether retrying the same call could succeed
    ///
    /// All failures are deterministic functions of the input, so this is
    /// always `false`; callers need different input or configuration.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl fmt::Display for ComparisonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonError::Decode(msg) => write!(f, "Decoding error: {}", msg),
            ComparisonError::EmptyAudio(msg) => write!(f, "No melodic content: {}", msg),
            ComparisonError::Computation(msg) => write!(f, "Computation error: {}", msg),
            ComparisonError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ComparisonError {}
