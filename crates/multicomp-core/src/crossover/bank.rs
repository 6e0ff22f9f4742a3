//! Linkwitz-Riley crossover filter bank
//!
//! Splits audio into N bands with N-1 LR24 crossover points arranged
//! sequentially: each point splits the remaining upper signal into one band
//! (its low side) and the rest (its high side).
//!
//! ```text
//! Input ──┬── LP f0 ─────────────────────────────► Band 0
//!         └── HP f0 ──┬── LP f1 ─────────────────► Band 1
//!                     └── HP f1 ──┬── LP f2 ─────► Band 2
//!                                 └── HP f2 ─────► Band 3
//! ```
//!
//! LP + HP of one point is a 2nd-order allpass, so the plain sum of the
//! bands is not yet flat; [`super::BandAligner`] adds the missing allpass
//! stages to the lower bands.

use super::svf::{clamp_cutoff, SvfCoefficients, SvfFilter};
use crate::types::AudioBuffer;

/// A single LR24 crossover point (splits into low and high)
///
/// Uses two cascaded 12dB Butterworth filters per side for 24dB/oct slopes.
#[derive(Debug, Clone)]
struct CrossoverPoint {
    /// First stage lowpass
    lp1: SvfFilter,
    /// Second stage lowpass (cascade)
    lp2: SvfFilter,
    /// First stage highpass
    hp1: SvfFilter,
    /// Second stage highpass (cascade)
    hp2: SvfFilter,
    /// Effective (clamped) crossover frequency in Hz
    cutoff_hz: f32,
}

impl CrossoverPoint {
    fn new(num_channels: usize, cutoff_hz: f32, sample_rate: f32) -> Self {
        let coeffs = SvfCoefficients::butterworth(cutoff_hz, sample_rate);
        Self {
            lp1: SvfFilter::new(num_channels, coeffs),
            lp2: SvfFilter::new(num_channels, coeffs),
            hp1: SvfFilter::new(num_channels, coeffs),
            hp2: SvfFilter::new(num_channels, coeffs),
            cutoff_hz: clamp_cutoff(cutoff_hz, sample_rate),
        }
    }

    fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let coeffs = SvfCoefficients::butterworth(cutoff_hz, sample_rate);
        self.lp1.set_coefficients(coeffs);
        self.lp2.set_coefficients(coeffs);
        self.hp1.set_coefficients(coeffs);
        self.hp2.set_coefficients(coeffs);
        self.cutoff_hz = clamp_cutoff(cutoff_hz, sample_rate);
    }

    /// Process and split into (low_band, high_band)
    #[inline]
    fn split(&mut self, channel: usize, input: f32) -> (f32, f32) {
        let low = self.lp2.lowpass(channel, self.lp1.lowpass(channel, input));
        let high = self.hp2.highpass(channel, self.hp1.highpass(channel, input));
        (low, high)
    }

    fn filters(&self) -> [&SvfFilter; 4] {
        [&self.lp1, &self.lp2, &self.hp1, &self.hp2]
    }

    fn filters_mut(&mut self) -> [&mut SvfFilter; 4] {
        [&mut self.lp1, &mut self.lp2, &mut self.hp1, &mut self.hp2]
    }
}

/// Sequential LR24 multiband crossover
pub struct CrossoverBank {
    /// Crossover points (N-1 for N bands)
    points: Vec<CrossoverPoint>,
    sample_rate: f32,
}

impl CrossoverBank {
    /// Build a bank for `cutoffs.len() + 1` bands
    ///
    /// Cutoffs are clamped to 20 Hz..0.45×sample rate.
    pub fn new(num_channels: usize, sample_rate: f32, cutoffs_hz: &[f32]) -> Self {
        Self {
            points: cutoffs_hz
                .iter()
                .map(|&f| CrossoverPoint::new(num_channels, f, sample_rate))
                .collect(),
            sample_rate,
        }
    }

    /// Number of output bands
    pub fn band_count(&self) -> usize {
        self.points.len() + 1
    }

    /// Retune one crossover point
    ///
    /// Only that point's filters are recomputed; call between blocks.
    pub fn set_cutoff(&mut self, index: usize, cutoff_hz: f32) {
        if let Some(point) = self.points.get_mut(index) {
            point.set_cutoff(cutoff_hz, self.sample_rate);
        }
    }

    /// Effective (clamped) crossover frequency of a point
    pub fn cutoff(&self, index: usize) -> Option<f32> {
        self.points.get(index).map(|p| p.cutoff_hz)
    }

    /// Split `input` into `bands`
    ///
    /// `bands` must hold `band_count()` buffers with the same channel count
    /// and working length as `input`.
    pub fn split_block(&mut self, input: &AudioBuffer, bands: &mut [AudioBuffer]) {
        debug_assert_eq!(bands.len(), self.band_count());
        let last = self.points.len();

        for ch in 0..input.num_channels() {
            let samples = input.channel(ch);
            for (i, &sample) in samples.iter().enumerate() {
                let mut rest = sample;
                for (k, point) in self.points.iter_mut().enumerate() {
                    let (low, high) = point.split(ch, rest);
                    bands[k].channel_mut(ch)[i] = low;
                    rest = high;
                }
                // Last band gets the remaining high frequencies
                bands[last].channel_mut(ch)[i] = rest;
            }
        }
    }

    /// Reset all filter states
    pub fn reset(&mut self) {
        for point in &mut self.points {
            for f in point.filters_mut() {
                f.reset();
            }
        }
    }

    pub fn flush_denormals(&mut self) {
        for point in &mut self.points {
            for f in point.filters_mut() {
                f.flush_denormals();
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.filters().iter().all(|f| f.is_finite()))
    }

    pub fn is_silent(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.filters().iter().all(|f| f.is_silent()))
    }
}
