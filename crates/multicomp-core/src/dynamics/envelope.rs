//! Level envelope follower
//!
//! Asymmetric one-pole smoother: the attack coefficient is used while the
//! input is above the current envelope, the release coefficient otherwise.
//!
//! ```text
//! coeff = exp(-1 / (time_ms / 1000 × sample_rate))
//! env   = coeff × env + (1 - coeff) × level
//! ```
//!
//! After one time constant the envelope has covered ~63% of a step.

use serde::{Deserialize, Serialize};

/// State below this magnitude is flushed to zero
const DENORMAL_THRESHOLD: f32 = 1e-20;

/// What the envelope follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorMode {
    /// Absolute sample value
    #[default]
    Peak,
    /// Mean square, reported as its square root
    Rms,
}

/// One-pole coefficient for a time constant
#[inline]
pub fn time_to_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = time_ms / 1000.0 * sample_rate;
    if samples <= 0.0 {
        return 0.0;
    }
    (-1.0 / samples).exp()
}

/// Stereo-linked envelope detector
///
/// The caller feeds one linked level per frame (the largest absolute value
/// across channels), so all channels of a band share one envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    mode: DetectorMode,
    attack_coeff: f32,
    release_coeff: f32,
    /// Peak: linear level. Rms: mean square.
    state: f32,
    /// Non-finite states flushed since the last `take_flush_count`
    flushes: u32,
}

impl EnvelopeDetector {
    pub fn new(mode: DetectorMode) -> Self {
        Self {
            mode,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            state: 0.0,
            flushes: 0,
        }
    }

    /// Recompute the coefficients from attack/release times
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_to_coefficient(attack_ms, sample_rate);
        self.release_coeff = time_to_coefficient(release_ms, sample_rate);
    }

    /// Feed one linked level and return the envelope (linear amplitude)
    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        let input = match self.mode {
            DetectorMode::Peak => level.abs(),
            DetectorMode::Rms => level * level,
        };

        let coeff = if input > self.state {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.state = coeff * self.state + (1.0 - coeff) * input;

        if !self.state.is_finite() {
            self.state = 0.0;
            self.flushes += 1;
        } else if self.state < DENORMAL_THRESHOLD {
            self.state = 0.0;
        }

        self.value()
    }

    /// Current envelope (linear amplitude)
    #[inline]
    pub fn value(&self) -> f32 {
        match self.mode {
            DetectorMode::Peak => self.state,
            DetectorMode::Rms => self.state.sqrt(),
        }
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    pub fn is_silent(&self) -> bool {
        self.state == 0.0
    }

    /// Number of non-finite flushes since the last call
    pub fn take_flush_count(&mut self) -> u32 {
        std::mem::take(&mut self.flushes)
    }
}
