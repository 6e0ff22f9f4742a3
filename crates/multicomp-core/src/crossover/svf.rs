//! Two-pole (12dB/octave) state-variable filter
//!
//! Trapezoidal-integrated SVF (Simper topology). It produces low, band and
//! high outputs from a single state pair, is stable under coefficient
//! changes, and with Q = 1/√2 is the Butterworth section the crossover
//! cascades into Linkwitz-Riley 24 dB/oct slopes.

use std::f64::consts::PI;

/// Butterworth Q (1/√2); two cascaded sections give LR24
pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Lowest crossover frequency the filters will be tuned to
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Highest crossover frequency as a fraction of the sample rate
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

/// State below this magnitude is flushed to zero
const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Clamp a cutoff into the stable range for a sample rate
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let upper = (MAX_CUTOFF_RATIO * sample_rate).max(MIN_CUTOFF_HZ);
    cutoff_hz.clamp(MIN_CUTOFF_HZ, upper)
}

/// Precomputed SVF coefficients for one cutoff/Q pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvfCoefficients {
    g: f32,
    k: f32,
    a1: f32,
    a2: f32,
    a3: f32,
}

impl SvfCoefficients {
    /// Butterworth coefficients for a cutoff, clamped to the stable range
    pub fn butterworth(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(clamp_cutoff(cutoff_hz, sample_rate), BUTTERWORTH_Q, sample_rate)
    }

    pub fn new(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        // Prewarp in f64: tan() near the upper clamp is steep
        let g = (PI * cutoff_hz as f64 / sample_rate as f64).tan() as f32;
        let k = 1.0 / q;
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;
        Self { g, k, a1, a2, a3 }
    }
}

/// Simultaneous filter outputs for one input sample
#[derive(Debug, Clone, Copy)]
pub struct SvfOutput {
    pub low: f32,
    pub band: f32,
    pub high: f32,
}

/// Per-channel SVF with shared coefficients
#[derive(Debug, Clone)]
pub struct SvfFilter {
    /// Integrator state per channel: [ic1eq, ic2eq]
    state: Vec<[f32; 2]>,
    coeffs: SvfCoefficients,
}

impl SvfFilter {
    pub fn new(num_channels: usize, coeffs: SvfCoefficients) -> Self {
        Self {
            state: vec![[0.0; 2]; num_channels],
            coeffs,
        }
    }

    /// Swap in new coefficients (state is kept, so no discontinuity)
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: SvfCoefficients) {
        self.coeffs = coeffs;
    }

    /// Run one sample through the filter for `channel`
    #[inline]
    pub fn tick(&mut self, channel: usize, input: f32) -> SvfOutput {
        let c = &self.coeffs;
        let [ic1eq, ic2eq] = &mut self.state[channel];

        let v3 = input - *ic2eq;
        let v1 = c.a1 * *ic1eq + c.a2 * v3;
        let v2 = *ic2eq + c.a2 * *ic1eq + c.a3 * v3;
        *ic1eq = 2.0 * v1 - *ic1eq;
        *ic2eq = 2.0 * v2 - *ic2eq;

        SvfOutput {
            low: v2,
            band: v1,
            high: input - c.k * v1 - v2,
        }
    }

    #[inline]
    pub fn lowpass(&mut self, channel: usize, input: f32) -> f32 {
        self.tick(channel, input).low
    }

    #[inline]
    pub fn highpass(&mut self, channel: usize, input: f32) -> f32 {
        self.tick(channel, input).high
    }

    /// Second-order allpass: low + high - k·band
    ///
    /// With Butterworth Q this equals LP² + HP² of an LR24 pair at the same
    /// corner, which is what phase compensation of lower bands needs.
    #[inline]
    pub fn allpass(&mut self, channel: usize, input: f32) -> f32 {
        let k = self.coeffs.k;
        input - 2.0 * k * self.tick(channel, input).band
    }

    pub fn reset(&mut self) {
        self.state.fill([0.0; 2]);
    }

    /// Flush denormal-range state to zero
    pub fn flush_denormals(&mut self) {
        for s in self.state.iter_mut().flatten() {
            if s.abs() < DENORMAL_THRESHOLD {
                *s = 0.0;
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.state.iter().flatten().all(|s| s.is_finite())
    }

    pub fn is_silent(&self) -> bool {
        self.state.iter().flatten().all(|&s| s == 0.0)
    }
}
