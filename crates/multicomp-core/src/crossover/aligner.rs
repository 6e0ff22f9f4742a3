//! Band alignment
//!
//! Brings every processed band to the same phase and the same delay before
//! summing, so that with no gain reduction the band sum reconstructs the
//! input with a flat magnitude response.
//!
//! Two mismatches exist between bands:
//!
//! - **Phase**: in a sequential LR24 bank, band `b` only ever sees the
//!   crossovers up to `b`, while everything above passes through the later
//!   points as well. Each LR24 point sums to a 2nd-order allpass, so band `b`
//!   is run through the allpass of every crossover `k > b`.
//! - **Latency**: bands with lookahead delay their audio inside the dynamics
//!   stage. Bands with less lookahead are delayed here by the difference.

use super::svf::{SvfCoefficients, SvfFilter};
use crate::delay::DelayLine;
use crate::types::AudioBuffer;

/// Per-band phase and delay compensation
pub struct BandAligner {
    /// `compensation[b]` holds one allpass per crossover above band `b`
    compensation: Vec<Vec<SvfFilter>>,
    /// Equalizing delay per band
    delays: Vec<DelayLine>,
    sample_rate: f32,
    latency_samples: usize,
}

impl BandAligner {
    /// Build an aligner for `cutoffs.len() + 1` bands
    ///
    /// `lookahead_samples` gives each band's lookahead (empty for none);
    /// the aligner's total latency is the largest of them.
    pub fn new(
        num_channels: usize,
        sample_rate: f32,
        cutoffs_hz: &[f32],
        lookahead_samples: &[usize],
    ) -> Self {
        let band_count = cutoffs_hz.len() + 1;
        let compensation = (0..band_count)
            .map(|band| {
                cutoffs_hz
                    .iter()
                    .skip(band + 1)
                    .map(|&f| {
                        SvfFilter::new(num_channels, SvfCoefficients::butterworth(f, sample_rate))
                    })
                    .collect()
            })
            .collect();

        let latency_samples = lookahead_samples.iter().copied().max().unwrap_or(0);
        let delays = (0..band_count)
            .map(|band| {
                let own = lookahead_samples.get(band).copied().unwrap_or(0);
                let mut line = DelayLine::new(num_channels, latency_samples - own);
                line.set_delay(latency_samples - own);
                line
            })
            .collect();

        Self {
            compensation,
            delays,
            sample_rate,
            latency_samples,
        }
    }

    /// Retune the compensation allpasses of one crossover
    pub fn set_cutoff(&mut self, index: usize, cutoff_hz: f32) {
        let coeffs = SvfCoefficients::butterworth(cutoff_hz, self.sample_rate);
        // Band b holds crossovers b+1.. so crossover `index` sits at
        // position index - band - 1 in every band below it
        for (band, stages) in self.compensation.iter_mut().enumerate().take(index) {
            if let Some(stage) = stages.get_mut(index - band - 1) {
                stage.set_coefficients(coeffs);
            }
        }
    }

    /// Total latency the aligner equalizes every band to
    pub fn latency_samples(&self) -> usize {
        self.latency_samples
    }

    /// Apply phase and delay compensation to every band in place
    pub fn process(&mut self, bands: &mut [AudioBuffer]) {
        for ((band, stages), delay) in bands
            .iter_mut()
            .zip(self.compensation.iter_mut())
            .zip(self.delays.iter_mut())
        {
            for (ch, samples) in band.channels_mut().enumerate() {
                if !stages.is_empty() {
                    for sample in samples.iter_mut() {
                        let mut x = *sample;
                        for stage in stages.iter_mut() {
                            x = stage.allpass(ch, x);
                        }
                        *sample = x;
                    }
                }
                delay.process_channel(ch, samples);
            }
        }
    }

    pub fn reset(&mut self) {
        for stage in self.compensation.iter_mut().flatten() {
            stage.reset();
        }
        for delay in &mut self.delays {
            delay.clear();
        }
    }

    pub fn flush_denormals(&mut self) {
        for stage in self.compensation.iter_mut().flatten() {
            stage.flush_denormals();
        }
    }

    pub fn is_finite(&self) -> bool {
        self.compensation.iter().flatten().all(|s| s.is_finite())
            && self.delays.iter().all(|d| d.is_finite())
    }

    pub fn is_silent(&self) -> bool {
        self.compensation.iter().flatten().all(|s| s.is_silent())
            && self.delays.iter().all(|d| d.is_silent())
    }
}
