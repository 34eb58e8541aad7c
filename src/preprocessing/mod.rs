//! Audio preprocessing modules
//!
//! This module contains utilities for preparing decoded audio for pitch analysis:
//! - Channel mixing (interleaved multi-channel to mono)
//! - Resampling to the canonical analysis rate
//! - Normalization (peak, RMS) for loudness invariance
//! - Frame-level silence gating

pub mod channel_mixer;
pub mod normalization;
pub mod resample;
pub mod silence;
