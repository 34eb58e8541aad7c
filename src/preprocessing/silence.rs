//! Frame-level silence gating

use super::normalization::amplitude_to_db;

/// Silence gate configuration
#[derive(Debug, Clone, Copy)]
pub struct SilenceGate {
    /// Threshold in dB (default: -40.0)
    pub threshold_db: f32,
}

impl Default for SilenceGate {
    fn default() -> Self {
        Self { threshold_db: -40.0 }
    }
}

impl SilenceGate {
    /// Create a gate with the given threshold in dB
    pub fn new(threshold_db: f32) -> Self {
        Self { threshold_db }
    }

    /// Whether a frame's RMS level falls below the threshold
    pub fn is_silent(&self, frame: &[f32]) -> bool {
        frame_rms_db(frame) < self.threshold_db
    }
}

/// RMS level of a frame in dB (negative infinity for an empty or all-zero frame)
pub fn frame_rms_db(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
    amplitude_to_db((sum_sq / frame.len() as f32).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frame_is_silent() {
        let gate = SilenceGate::default();
        assert!(gate.is_silent(&[0.0; 512]));
        assert!(gate.is_silent(&[]));
    }

    #[test]
    fn test_full_scale_square_is_0_db() {
        let frame: Vec<f32> = (0..512).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!(frame_rms_db(&frame).abs() < 1e-4);
        assert!(!SilenceGate::default().is_silent(&frame));
    }

    #[test]
    fn test_threshold_boundary() {
        // Constant 0.001 is -60 dB
        let frame = vec![0.001f32; 256];
        assert!(SilenceGate::new(-40.0).is_silent(&frame));
        assert!(!SilenceGate::new(-70.0).is_silent(&frame));
    }
}
