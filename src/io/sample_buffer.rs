//! Canonical PCM buffer and analysis framing

use crate::error::ComparisonError;

/// Owned, immutable PCM audio
///
/// Produced by the decoder (mono, canonical rate) and consumed once by the
/// pitch contour extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap interleaved samples
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::InvalidInput` for a zero sample rate or
    /// channel count, or when the sample count is not a whole number of frames.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, ComparisonError> {
        if sample_rate == 0 {
            return Err(ComparisonError::InvalidInput("Invalid sample rate: 0".to_string()));
        }
        if channels == 0 {
            return Err(ComparisonError::InvalidInput("Invalid channel count: 0".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(ComparisonError::InvalidInput(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Wrap mono samples
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, ComparisonError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Take ownership of the interleaved samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Whether the buffer holds no audio
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Overlapping analysis windows over a mono buffer
    ///
    /// Yields `(start_sample, window)` for every full window; a trailing
    /// partial window is not produced. Yields nothing for a zero window or
    /// hop, or for multi-channel buffers.
    pub fn windows(&self, window_size: usize, hop_size: usize) -> AnalysisWindows<'_> {
        let samples: &[f32] = if self.channels == 1 { &self.samples } else { &[] };
        AnalysisWindows {
            samples,
            window_size,
            hop_size,
            position: 0,
        }
    }

    /// Number of windows [`AudioBuffer::windows`] yields
    pub fn window_count(&self, window_size: usize, hop_size: usize) -> usize {
        if self.channels != 1 || window_size == 0 || hop_size == 0 || self.samples.len() < window_size {
            return 0;
        }
        (self.samples.len() - window_size) / hop_size + 1
    }
}

/// Iterator over overlapping analysis windows
#[derive(Debug)]
pub struct AnalysisWindows<'a> {
    samples: &'a [f32],
    window_size: usize,
    hop_size: usize,
    position: usize,
}

impl<'a> Iterator for AnalysisWindows<'a> {
    type Item = (usize, &'a [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.window_size == 0 || self.hop_size == 0 {
            return None;
        }
        if self.position + self.window_size > self.samples.len() {
            return None;
        }

        let start = self.position;
        self.position += self.hop_size;
        Some((start, &self.samples[start..start + self.window_size]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_cover_buffer() {
        let buffer = AudioBuffer::mono((0..1000).map(|i| i as f32).collect(), 1000).unwrap();
        let windows: Vec<_> = buffer.windows(100, 50).collect();

        assert_eq!(windows.len(), 19);
        assert_eq!(windows.len(), buffer.window_count(100, 50));
        assert_eq!(windows[0].0, 0);
        assert_eq!(windows[1].0, 50);
        assert_eq!(windows[18].1.len(), 100);
        assert_eq!(windows[18].1[99], 999.0);
    }

    #[test]
    fn test_short_buffer_has_no_windows() {
        let buffer = AudioBuffer::mono(vec![0.0; 10], 1000).unwrap();
        assert_eq!(buffer.windows(100, 50).count(), 0);
        assert_eq!(buffer.window_count(100, 50), 0);
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 44100], 22050, 2).unwrap();
        assert_eq!(buffer.frame_count(), 22050);
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(AudioBuffer::mono(vec![0.0], 0).is_err());
        assert!(AudioBuffer::new(vec![0.0; 3], 22050, 2).is_err());
        assert!(AudioBuffer::new(vec![], 22050, 0).is_err());
    }
}
