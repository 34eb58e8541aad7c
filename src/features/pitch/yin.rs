//! YIN fundamental frequency estimation
//!
//! # Algorithm
//!
//! 1. Difference function `d(τ) = Σ_{j<W} (x_j − x_{j+τ})²` over a fixed
//!    integration length `W = window − τ_max`
//! 2. Cumulative mean normalized difference `d'(τ) = d(τ) · τ / Σ_{k=1..τ} d(k)`, `d'(0) = 1`
//! 3. Absolute threshold: the first `τ` in range with `d'(τ)` below the
//!    threshold, followed down to its local minimum; the global minimum if no
//!    lag qualifies
//! 4. Parabolic interpolation around the selected lag
//!
//! The difference function is expanded as `e(0) + e(τ) − 2·r(τ)`, where
//! the energies `e` come from prefix sums and the cross term `r` from one
//! FFT correlation, so a frame costs O(n log n) instead of O(n·τ_max).
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency
//! estimator for speech and music. *The Journal of the Acoustical Society of
//! America*, 111(4), 1917-1930.

use crate::error::ComparisonError;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Numerical stability epsilon
const EPSILON: f64 = 1e-12;

/// Best periodicity candidate for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz
    pub frequency_hz: f32,

    /// Periodicity strength `1 - d'(τ)`, clamped to [0, 1]
    pub confidence: f32,
}

/// Reusable YIN estimator for a fixed window size and frequency range
///
/// Holds the FFT plans and work buffers, so one estimator should be reused
/// across all frames of a buffer. Not shared between threads; each
/// extraction call builds its own.
pub struct YinEstimator {
    sample_rate: f64,
    window_size: usize,
    min_lag: usize,
    max_lag: usize,
    integration: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    head: Vec<Complex<f64>>,
    full: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    prefix_energy: Vec<f64>,
    difference: Vec<f64>,
    cmnd: Vec<f64>,
}

impl std::fmt::Debug for YinEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YinEstimator")
            .field("sample_rate", &self.sample_rate)
            .field("window_size", &self.window_size)
            .field("min_lag", &self.min_lag)
            .field("max_lag", &self.max_lag)
            .finish()
    }
}

impl YinEstimator {
    /// Create an estimator
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate of the frames in Hz
    /// * `window_size` - Frame length in samples
    /// * `min_frequency_hz` - Lowest fundamental searched
    /// * `max_frequency_hz` - Highest fundamental searched
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::InvalidInput` if the frequency range is
    /// inverted or the window is shorter than twice the longest period.
    pub fn new(
        sample_rate: u32,
        window_size: usize,
        min_frequency_hz: f32,
        max_frequency_hz: f32,
    ) -> Result<Self, ComparisonError> {
        if sample_rate == 0 {
            return Err(ComparisonError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }
        if !(min_frequency_hz > 0.0 && min_frequency_hz < max_frequency_hz) {
            return Err(ComparisonError::InvalidInput(format!(
                "Invalid frequency range: [{:.1}, {:.1}] Hz",
                min_frequency_hz, max_frequency_hz
            )));
        }

        let sr = sample_rate as f64;
        let min_lag = ((sr / max_frequency_hz as f64).floor() as usize).max(2);
        let max_lag = (sr / min_frequency_hz as f64).ceil() as usize;

        if max_lag * 2 > window_size || min_lag >= max_lag {
            return Err(ComparisonError::InvalidInput(format!(
                "Window of {} samples cannot resolve lags {}..={}",
                window_size, min_lag, max_lag
            )));
        }

        let fft_size = window_size.next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Ok(Self {
            sample_rate: sr,
            window_size,
            min_lag,
            max_lag,
            integration: window_size - max_lag,
            forward,
            inverse,
            head: vec![Complex::new(0.0, 0.0); fft_size],
            full: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            prefix_energy: vec![0.0; window_size + 1],
            difference: vec![0.0; max_lag + 1],
            cmnd: vec![0.0; max_lag + 1],
        })
    }

    /// Frame length this estimator expects
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Estimate the fundamental of one frame
    ///
    /// `threshold` is the absolute YIN threshold on `d'`; lags are accepted
    /// greedily once `d'` drops below it. Returns `None` for a frame with no
    /// energy (nothing periodic to measure).
    ///
    /// # Errors
    ///
    /// Returns `ComparisonError::InvalidInput` for a frame of the wrong
    /// length and `ComparisonError::Computation` on non-finite intermediate values.
    pub fn estimate(
        &mut self,
        frame: &[f32],
        threshold: f32,
    ) -> Result<Option<PitchEstimate>, ComparisonError> {
        if frame.len() != self.window_size {
            return Err(ComparisonError::InvalidInput(format!(
                "Frame has {} samples, estimator expects {}",
                frame.len(),
                self.window_size
            )));
        }

        if !self.compute_difference(frame) {
            return Ok(None);
        }
        self.compute_cmnd();

        let tau = self.select_lag(threshold as f64);
        let refined = self.parabolic_lag(tau);
        let confidence = (1.0 - self.cmnd[tau]).clamp(0.0, 1.0);
        let frequency = self.sample_rate / refined;

        if !frequency.is_finite() || !confidence.is_finite() {
            return Err(ComparisonError::Computation(format!(
                "Non-finite pitch estimate at lag {} (refined {})",
                tau, refined
            )));
        }

        Ok(Some(PitchEstimate {
            frequency_hz: frequency as f32,
            confidence: confidence as f32,
        }))
    }

    /// Fill `self.difference`; returns false for a frame with no energy
    fn compute_difference(&mut self, frame: &[f32]) -> bool {
        let w = self.integration;

        self.prefix_energy[0] = 0.0;
        for (i, &x) in frame.iter().enumerate() {
            let x = x as f64;
            self.prefix_energy[i + 1] = self.prefix_energy[i] + x * x;
        }
        if self.prefix_energy[self.window_size] <= EPSILON {
            return false;
        }

        // r(τ) = Σ_{j<W} x_j x_{j+τ} = IFFT(conj(FFT(head)) · FFT(full))[τ]
        for (i, slot) in self.head.iter_mut().enumerate() {
            let x = if i < w { frame[i] as f64 } else { 0.0 };
            *slot = Complex::new(x, 0.0);
        }
        for (i, slot) in self.full.iter_mut().enumerate() {
            let x = frame.get(i).copied().unwrap_or(0.0) as f64;
            *slot = Complex::new(x, 0.0);
        }

        self.forward
            .process_with_scratch(&mut self.head, &mut self.scratch);
        self.forward
            .process_with_scratch(&mut self.full, &mut self.scratch);
        for (h, f) in self.head.iter_mut().zip(self.full.iter()) {
            *h = h.conj() * f;
        }
        self.inverse
            .process_with_scratch(&mut self.head, &mut self.scratch);

        let scale = 1.0 / self.head.len() as f64;
        let e0 = self.prefix_energy[w];
        for tau in 0..=self.max_lag {
            let e_tau = self.prefix_energy[tau + w] - self.prefix_energy[tau];
            let r = self.head[tau].re * scale;
            self.difference[tau] = (e0 + e_tau - 2.0 * r).max(0.0);
        }
        self.difference[0] = 0.0;

        true
    }

    fn compute_cmnd(&mut self) {
        self.cmnd[0] = 1.0;
        let mut running = 0.0;
        for tau in 1..=self.max_lag {
            running += self.difference[tau];
            self.cmnd[tau] = if running > EPSILON {
                self.difference[tau] * tau as f64 / running
            } else {
                1.0
            };
        }
    }

    fn select_lag(&self, threshold: f64) -> usize {
        let range = self.min_lag..=self.max_lag;

        if let Some(first) = range.clone().find(|&tau| self.cmnd[tau] < threshold) {
            let mut tau = first;
            while tau < self.max_lag && self.cmnd[tau + 1] < self.cmnd[tau] {
                tau += 1;
            }
            return tau;
        }

        // No lag under the threshold: report the best one, the caller decides voicing
        let mut best = self.min_lag;
        for tau in range {
            if self.cmnd[tau] < self.cmnd[best] {
                best = tau;
            }
        }
        best
    }

    fn parabolic_lag(&self, tau: usize) -> f64 {
        if tau <= self.min_lag || tau >= self.max_lag {
            return tau as f64;
        }
        let a = self.cmnd[tau - 1];
        let b = self.cmnd[tau];
        let c = self.cmnd[tau + 1];
        let denom = a - 2.0 * b + c;
        if denom.abs() < EPSILON {
            return tau as f64;
        }
        let shift = ((a - c) / (2.0 * denom)).clamp(-1.0, 1.0);
        tau as f64 + shift
    }
}
