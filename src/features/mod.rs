//! Feature extraction modules
//!
//! This module contains the melody feature pipeline:
//! - Pitch contour extraction (YIN fundamental frequency + voicing confidence)
//! - Melody normalization (note segmentation, semitone intervals, relative durations)

pub mod melody;
pub mod pitch;
