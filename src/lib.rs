//! # Stratum Melody
//!
//! A melody similarity engine: given two audio recordings, decide whether
//! they carry the same melodic line, independent of key, tempo, loudness and
//! file encoding.
//!
//! ## Features
//!
//! - **Decoding**: WAV, MP3 and FLAC from memory via Symphonia, mixed to mono
//!   and resampled to a canonical rate
//! - **Pitch Contour**: YIN fundamental-frequency estimation with a silence
//!   gate and per-frame voicing confidence
//! - **Melody Normalization**: note segmentation, semitone quantization,
//!   interval encoding (transposition invariance) and median-relative durations
//! - **Alignment**: banded, tempo-tolerant edit distance with a bounded score
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_melody::{compare, AudioFormat, ComparisonConfig};
//!
//! let first = std::fs::read("hum.wav").unwrap();
//! let second = std::fs::read("song.mp3").unwrap();
//!
//! let result = compare(
//!     &first,
//!     AudioFormat::Wav,
//!     &second,
//!     AudioFormat::Mp3,
//!     &ComparisonConfig::default(),
//! )?;
//!
//! println!("Score: {:.3} (match: {})", result.score, result.is_match);
//! # Ok::<(), stratum_melody::ComparisonError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! bytes → Decode → Loudness Normalization → Pitch Contour → Melody → Align & Score
//! ```
//!
//! Every entry point is a pure function over its arguments: no global state,
//! no caches, no I/O. Comparisons may run concurrently on any number of
//! threads. Work is CPU-bound, so async callers should move it off their
//! event loop (e.g. onto a blocking worker pool).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::result::{AlignmentResult, ComparisonResult};
pub use config::ComparisonConfig;
pub use error::ComparisonError;
pub use features::melody::{MelodyNote, MelodySequence};
pub use features::pitch::{PitchContour, PitchFrame};
pub use io::{AudioBuffer, AudioFormat};

/// Compare the melodies of two recordings
///
/// Decodes, analyzes and normalizes the first input, then the second, then
/// aligns the two melodies. The first failure aborts the comparison; no
/// partial score is ever produced.
///
/// # Arguments
///
/// * `first` / `second` - Complete file contents
/// * `first_format` / `second_format` - Declared format of each payload
/// * `config` - Comparison parameters (validated on every call)
///
/// # Returns
///
/// `ComparisonResult` with the similarity score, the match decision and the
/// threshold it was made against. Identical inputs always give a
/// bit-identical result, and swapping the two inputs gives the same score.
///
/// # Errors
///
/// - `ComparisonError::InvalidInput` for an invalid configuration or a
///   payload larger than `config.max_input_bytes`
/// - `ComparisonError::Decode` when a payload is not decodable audio of its
///   declared format
/// - `ComparisonError::EmptyAudio` when a recording has no melodic content
///   (silence, noise, or fewer than two notes)
/// - `ComparisonError::Computation` on numerical failure
///
/// # Example
///
/// ```no_run
/// use stratum_melody::{compare, AudioFormat, ComparisonConfig};
///
/// let bytes = std::fs::read("melody.wav").unwrap();
/// let result = compare(&bytes, AudioFormat::Wav, &bytes, AudioFormat::Wav, &ComparisonConfig::default())?;
/// assert_eq!(result.score, 1.0);
/// # Ok::<(), stratum_melody::ComparisonError>(())
/// ```
pub fn compare(
    first: &[u8],
    first_format: AudioFormat,
    second: &[u8],
    second_format: AudioFormat,
    config: &ComparisonConfig,
) -> Result<ComparisonResult, ComparisonError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;
    check_input_size(first, config)?;
    check_input_size(second, config)?;

    let first_melody = melody_from_bytes(first, first_format, config)?;
    let second_melody = melody_from_bytes(second, second_format, config)?;

    let result = score_melodies(&first_melody, &second_melody, config)?;

    log::debug!(
        "Comparison finished in {:.1} ms: score={:.4}, match={}",
        start_time.elapsed().as_secs_f32() * 1000.0,
        result.score,
        result.is_match
    );

    Ok(result)
}

/// Extract the normalized melody of one recording
///
/// Runs decode, loudness normalization, pitch contour extraction and melody
/// normalization. Useful for comparing one recording against many without
/// re-analyzing it (see [`compare_melodies`]).
///
/// # Errors
///
/// Same taxonomy as [`compare`], for a single input.
pub fn extract_melody(
    bytes: &[u8],
    format: AudioFormat,
    config: &ComparisonConfig,
) -> Result<MelodySequence, ComparisonError> {
    config.validate()?;
    check_input_size(bytes, config)?;
    melody_from_bytes(bytes, format, config)
}

/// Align and score two prepared melodies
///
/// # Example
///
/// ```
/// use stratum_melody::{compare_melodies, ComparisonConfig, MelodySequence};
///
/// let a = MelodySequence::from_midi_notes(&[(60, 0.5), (62, 0.5), (64, 0.5), (65, 0.5)])?;
/// let b = MelodySequence::from_midi_notes(&[(60, 0.5), (55, 0.5), (62, 0.5), (59, 0.5)])?;
///
/// let result = compare_melodies(&a, &b, &ComparisonConfig::default())?;
/// assert!(result.score < 0.3);
/// assert!(!result.is_match);
/// # Ok::<(), stratum_melody::ComparisonError>(())
/// ```
///
/// # Errors
///
/// `ComparisonError::InvalidInput` for an invalid configuration or malformed
/// sequences, `ComparisonError::Computation` on numerical failure.
pub fn compare_melodies(
    first: &MelodySequence,
    second: &MelodySequence,
    config: &ComparisonConfig,
) -> Result<ComparisonResult, ComparisonError> {
    config.validate()?;
    score_melodies(first, second, config)
}

fn score_melodies(
    first: &MelodySequence,
    second: &MelodySequence,
    config: &ComparisonConfig,
) -> Result<ComparisonResult, ComparisonError> {
    let alignment = analysis::align(first, second, config)?;
    Ok(ComparisonResult::from_score(
        alignment.normalized_score,
        config.match_threshold,
    ))
}

fn check_input_size(bytes: &[u8], config: &ComparisonConfig) -> Result<(), ComparisonError> {
    if bytes.len() > config.max_input_bytes {
        return Err(ComparisonError::InvalidInput(format!(
            "Input of {} bytes exceeds limit of {} bytes",
            bytes.len(),
            config.max_input_bytes
        )));
    }
    Ok(())
}

fn melody_from_bytes(
    bytes: &[u8],
    format: AudioFormat,
    config: &ComparisonConfig,
) -> Result<MelodySequence, ComparisonError> {
    let decoded = io::decode(bytes, format, config.target_sample_rate)?;
    let sample_rate = decoded.sample_rate();

    let mut samples = decoded.into_samples();
    let loudness = preprocessing::normalization::normalize(&mut samples, config.normalization)?;
    log::debug!(
        "Loudness: peak={:.2} dB, rms={:.2} dB, gain={:.2} dB",
        loudness.peak_db,
        loudness.rms_db,
        loudness.gain_db
    );
    let buffer = AudioBuffer::mono(samples, sample_rate)?;

    let contour = features::pitch::extract(&buffer, config)?;
    log::debug!(
        "Contour: {} frames, {:.1}% voiced",
        contour.len(),
        contour.voiced_ratio() * 100.0
    );

    features::melody::normalize(&contour, config)
}
