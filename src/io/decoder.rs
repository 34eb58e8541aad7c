//! In-memory audio decoding using Symphonia
//!
//! Turns a declared-format byte buffer into canonical mono PCM at a fixed
//! sample rate:
//!
//! 1. Check the container signature against the declared format
//! 2. Probe and demux with Symphonia (the declared format is the probe hint)
//! 3. Decode every packet of the first audio track to interleaved `f32`
//! 4. Mix down to mono and resample to the canonical rate

use super::format::AudioFormat;
use super::sample_buffer::AudioBuffer;
use crate::error::ComparisonError;
use crate::preprocessing::channel_mixer::downmix_to_mono;
use crate::preprocessing::resample::resample_mono;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Shortfall tolerated against an MP3 frame count (encoder delay and padding)
const MP3_FRAME_SLACK: u64 = 2 * 1152;

/// Decode an audio payload into a mono buffer at `target_sample_rate`
///
/// # Arguments
///
/// * `bytes` - Complete file contents
/// * `format` - Format the caller declared for the payload
/// * `target_sample_rate` - Canonical rate of the returned buffer
///
/// # Errors
///
/// Returns `ComparisonError::Decode` when the payload is empty or truncated,
/// its header does not match `format`, no audio track can be decoded, or the
/// decoded duration is zero.
pub fn decode(
    bytes: &[u8],
    format: AudioFormat,
    target_sample_rate: u32,
) -> Result<AudioBuffer, ComparisonError> {
    log::debug!("Decoding {} bytes declared as {}", bytes.len(), format);

    if bytes.is_empty() {
        return Err(ComparisonError::Decode("Empty audio payload".to_string()));
    }

    if !format.matches_header(bytes) {
        return Err(ComparisonError::Decode(format!(
            "Header inconsistent with declared format '{}'",
            format
        )));
    }

    let (interleaved, sample_rate, channels) = decode_interleaved(bytes, format)?;

    let mono = downmix_to_mono(&interleaved, channels)?;
    if mono.is_empty() {
        return Err(ComparisonError::Decode(
            "Decoded audio has zero duration".to_string(),
        ));
    }

    let resampled = resample_mono(&mono, sample_rate, target_sample_rate)?;

    log::debug!(
        "Decoded {} frames at {} Hz ({} ch) -> {} mono samples at {} Hz",
        mono.len(),
        sample_rate,
        channels,
        resampled.len(),
        target_sample_rate
    );

    AudioBuffer::mono(resampled, target_sample_rate)
}

/// Decode every packet of the first audio track
///
/// Returns `(interleaved_samples, sample_rate, channels)`.
fn decode_interleaved(
    bytes: &[u8],
    format: AudioFormat,
) -> Result<(Vec<f32>, u32, usize), ComparisonError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ComparisonError::Decode(format!("Unrecognized {} stream: {}", format, e)))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ComparisonError::Decode("No supported audio track found".to_string()))?;

    let track_id = track.id;
    let expected_frames = track.codec_params.n_frames;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ComparisonError::Decode(format!("Unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            // End of stream (or a stream truncated at a packet boundary)
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(ComparisonError::Decode(format!("Failed to read packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if decoded.frames() == 0 {
                    continue;
                }
                sample_rate = spec.rate;
                channels = spec.channels.count();

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupt packet: skip it, the rest of the stream may be fine
                skipped_packets += 1;
                log::warn!("Skipping undecodable packet: {}", msg);
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                return Err(ComparisonError::Decode(format!("Decoder failed: {}", e)));
            }
        }
    }

    if skipped_packets > 0 {
        log::warn!("{} packets could not be decoded", skipped_packets);
    }

    if samples.is_empty() {
        return Err(ComparisonError::Decode(
            "Decoded audio has zero duration".to_string(),
        ));
    }

    if sample_rate == 0 || channels == 0 {
        return Err(ComparisonError::Decode(format!(
            "Stream reports invalid parameters: {} Hz, {} channels",
            sample_rate, channels
        )));
    }

    if let Some(expected) = expected_frames {
        let decoded_frames = (samples.len() / channels) as u64;
        let slack = if format == AudioFormat::Mp3 { MP3_FRAME_SLACK } else { 0 };
        if decoded_frames + slack < expected {
            return Err(ComparisonError::Decode(format!(
                "Truncated stream: decoded {} of {} frames",
                decoded_frames, expected
            )));
        }
    }

    Ok((samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV writer for decoder tests
    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_mono_wav() {
        let samples: Vec<i16> = (0..22050).map(|i| ((i % 100) as i16 - 50) * 200).collect();
        let bytes = wav_bytes(&samples, 22050, 1);

        let buffer = decode(&bytes, AudioFormat::Wav, 22050).unwrap();
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.frame_count(), 22050);
    }

    #[test]
    fn test_decode_stereo_wav_is_mixed() {
        // Left = +0.5, right = -0.5 -> mono silence
        let samples: Vec<i16> = (0..2000).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        let bytes = wav_bytes(&samples, 22050, 2);

        let buffer = decode(&bytes, AudioFormat::Wav, 22050).unwrap();
        assert_eq!(buffer.frame_count(), 1000);
        assert!(buffer.samples().iter().all(|x| x.abs() < 1e-6));
    }

    #[test]
    fn test_decode_resamples_to_target() {
        let samples = vec![1000i16; 44100];
        let bytes = wav_bytes(&samples, 44100, 1);

        let buffer = decode(&bytes, AudioFormat::Wav, 22050).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.frame_count(), 22050);
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(
            decode(&[], AudioFormat::Wav, 22050),
            Err(ComparisonError::Decode(_))
        ));
    }

    #[test]
    fn test_declared_format_mismatch() {
        let bytes = wav_bytes(&[0i16; 100], 22050, 1);
        assert!(matches!(
            decode(&bytes, AudioFormat::Mp3, 22050),
            Err(ComparisonError::Decode(_))
        ));
    }

    #[test]
    fn test_zero_duration_wav() {
        let bytes = wav_bytes(&[], 22050, 1);
        assert!(matches!(
            decode(&bytes, AudioFormat::Wav, 22050),
            Err(ComparisonError::Decode(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = wav_bytes(&[0i16; 100], 22050, 1);
        assert!(matches!(
            decode(&bytes[..20], AudioFormat::Wav, 22050),
            Err(ComparisonError::Decode(_))
        ));
    }

    #[test]
    fn test_truncated_data_is_decode_error() {
        let samples: Vec<i16> = (0..22050).map(|i| ((i % 50) as i16 - 25) * 400).collect();
        let bytes = wav_bytes(&samples, 22050, 1);

        // Cut on a sample boundary and mid-sample
        for cut in [44 + samples.len(), bytes.len() / 2 + 1] {
            assert!(matches!(
                decode(&bytes[..cut], AudioFormat::Wav, 22050),
                Err(ComparisonError::Decode(_))
            ));
        }
    }

    #[test]
    fn test_garbage_with_mp3_sync() {
        let mut bytes = vec![0xFFu8, 0xFB];
        bytes.extend(std::iter::repeat(0x00).take(64));
        assert!(matches!(
            decode(&bytes, AudioFormat::Mp3, 22050),
            Err(ComparisonError::Decode(_))
        ));
    }
}
