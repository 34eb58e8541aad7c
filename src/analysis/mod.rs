//! Alignment, scoring and result types
//!
//! Compares two normalized melodies:
//! - Banded, tempo-tolerant edit distance between interval sequences
//! - Bounded similarity score and match decision

pub mod alignment;
pub mod result;

pub use alignment::{align, AlignmentCosts};
pub use result::{AlignmentResult, ComparisonResult};
