//! Parameter model - value shapes, validation, sharing and smoothing
//!
//! The control thread owns a [`ParamController`]; every accepted change is
//! published as a whole [`ParamSet`] through [`SharedParams`], and the audio
//! thread reads at most one snapshot per block. Values are never applied
//! immediately: the engine ramps them with [`LinearSmoother`]s.

mod controller;
mod info;
mod shared;
mod smoother;

pub use controller::ParamController;
pub use info::{ParamId, ParamInfo};
pub(crate) use shared::{ParamReader, SharedParams};
pub use smoother::LinearSmoother;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{MAX_BANDS, MAX_CROSSOVERS};

/// Minimum distance between two neighbouring crossover frequencies
pub const MIN_CUTOFF_SEPARATION_HZ: f32 = 20.0;

/// Default crossovers for the reference 4-band layout
pub const DEFAULT_CUTOFFS_4_BANDS: [f32; 3] = [150.0, 800.0, 4000.0];

/// Dynamics settings for a single band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    /// Level above which gain reduction starts (dBFS)
    pub threshold_db: f32,
    /// Input:output slope above threshold (>= 1)
    pub ratio: f32,
    /// Envelope rise time constant (ms, > 0)
    pub attack_ms: f32,
    /// Envelope fall time constant (ms, > 0)
    pub release_ms: f32,
    /// Soft-knee width centered on threshold (dB, >= 0)
    pub knee_db: f32,
    /// Gain applied after compression (dB)
    pub makeup_db: f32,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            threshold_db: -12.0,
            ratio: 2.5,
            attack_ms: 20.0,
            release_ms: 50.0,
            knee_db: 0.0,
            makeup_db: 0.0,
        }
    }
}

impl DynamicsParams {
    /// Check the invariants: finite values, ratio >= 1, attack/release > 0, knee >= 0
    pub fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("threshold_db", self.threshold_db),
            ("ratio", self.ratio),
            ("attack_ms", self.attack_ms),
            ("release_ms", self.release_ms),
            ("knee_db", self.knee_db),
            ("makeup_db", self.makeup_db),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        if self.ratio < 1.0 {
            return Err(ConfigError::InvalidRatio(self.ratio));
        }
        if self.attack_ms <= 0.0 {
            return Err(ConfigError::InvalidAttack(self.attack_ms));
        }
        if self.release_ms <= 0.0 {
            return Err(ConfigError::InvalidRelease(self.release_ms));
        }
        if self.knee_db < 0.0 {
            return Err(ConfigError::InvalidKnee(self.knee_db));
        }
        Ok(())
    }
}

/// Ordered crossover frequencies (N-1 entries for N bands)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverSpec {
    pub cutoffs_hz: Vec<f32>,
}

impl CrossoverSpec {
    pub fn new(cutoffs_hz: &[f32]) -> Self {
        Self {
            cutoffs_hz: cutoffs_hz.to_vec(),
        }
    }

    /// Default crossovers for a band count
    ///
    /// Four bands use [`DEFAULT_CUTOFFS_4_BANDS`]; other counts are spread
    /// geometrically between 100 Hz and 8 kHz.
    pub fn default_for(band_count: usize) -> Self {
        let mut cutoffs = [0.0; MAX_CROSSOVERS];
        fill_default_cutoffs(band_count, &mut cutoffs);
        Self::new(&cutoffs[..band_count.saturating_sub(1)])
    }

    /// Number of bands this spec partitions the spectrum into
    pub fn band_count(&self) -> usize {
        self.cutoffs_hz.len() + 1
    }

    /// Validate against a band count and, when known, a sample rate
    pub fn validate(&self, band_count: usize, sample_rate: Option<f64>) -> ConfigResult<()> {
        validate_cutoffs(&self.cutoffs_hz, band_count, sample_rate)
    }
}

fn fill_default_cutoffs(band_count: usize, out: &mut [f32; MAX_CROSSOVERS]) {
    let count = band_count.saturating_sub(1).min(MAX_CROSSOVERS);
    if count == DEFAULT_CUTOFFS_4_BANDS.len() {
        out[..count].copy_from_slice(&DEFAULT_CUTOFFS_4_BANDS);
        return;
    }
    let (lo, hi) = (100.0_f32, 8000.0_f32);
    for (i, slot) in out.iter_mut().take(count).enumerate() {
        let t = if count == 1 {
            0.5
        } else {
            i as f32 / (count - 1) as f32
        };
        *slot = lo * (hi / lo).powf(t);
    }
}

/// Validate a list of crossover frequencies
///
/// Frequencies must be finite, inside `(0, nyquist)` when the sample rate is
/// known, strictly increasing, and at least [`MIN_CUTOFF_SEPARATION_HZ`] apart.
pub fn validate_cutoffs(
    cutoffs: &[f32],
    band_count: usize,
    sample_rate: Option<f64>,
) -> ConfigResult<()> {
    let expected = band_count.saturating_sub(1);
    if cutoffs.len() != expected {
        return Err(ConfigError::CutoffCountMismatch {
            expected,
            got: cutoffs.len(),
        });
    }

    let nyquist = sample_rate.map(|sr| (sr / 2.0) as f32);
    for (index, &freq) in cutoffs.iter().enumerate() {
        if !freq.is_finite() {
            return Err(ConfigError::NonFinite("crossover"));
        }
        let upper = nyquist.unwrap_or(f32::INFINITY);
        if freq <= 0.0 || freq >= upper {
            return Err(ConfigError::CutoffOutOfRange {
                index,
                freq,
                nyquist: upper,
            });
        }
    }

    for (index, pair) in cutoffs.windows(2).enumerate() {
        let (lo, hi) = (pair[0], pair[1]);
        if hi <= lo {
            return Err(ConfigError::CutoffsNotIncreasing {
                index: index + 1,
                freq: hi,
            });
        }
        if hi - lo < MIN_CUTOFF_SEPARATION_HZ {
            return Err(ConfigError::CutoffsTooClose {
                index,
                next: index + 1,
                separation: hi - lo,
                min: MIN_CUTOFF_SEPARATION_HZ,
            });
        }
    }
    Ok(())
}

/// Complete parameter state shared between the control and audio paths
///
/// Fixed size so it can be copied into atomics without allocating; only the
/// first `band_count` band slots and `band_count - 1` cutoff slots are live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSet {
    band_count: usize,
    pub bands: [DynamicsParams; MAX_BANDS],
    pub cutoffs_hz: [f32; MAX_CROSSOVERS],
    pub output_trim_db: f32,
}

impl ParamSet {
    /// Defaults for a band count
    ///
    /// Every band starts at -12 dB / 2.5:1 / 20 ms / 50 ms. The 4-band layout
    /// additionally gets the per-band voicing: a firmer low band (4:1), a
    /// -10 dB low-mid threshold, a faster high-mid attack (10 ms) and a
    /// quicker high-band release (30 ms).
    pub fn with_defaults(band_count: usize) -> Self {
        let band_count = band_count.clamp(1, MAX_BANDS);
        let mut bands = [DynamicsParams::default(); MAX_BANDS];
        if band_count == 4 {
            bands[0].ratio = 4.0;
            bands[1].threshold_db = -10.0;
            bands[2].attack_ms = 10.0;
            bands[3].release_ms = 30.0;
        }
        let mut cutoffs_hz = [0.0; MAX_CROSSOVERS];
        fill_default_cutoffs(band_count, &mut cutoffs_hz);
        Self {
            band_count,
            bands,
            cutoffs_hz,
            output_trim_db: 0.0,
        }
    }

    /// Number of live bands
    #[inline]
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// Live band parameters
    #[inline]
    pub fn bands(&self) -> &[DynamicsParams] {
        &self.bands[..self.band_count]
    }

    /// Live crossover frequencies
    #[inline]
    pub fn cutoffs(&self) -> &[f32] {
        &self.cutoffs_hz[..self.band_count - 1]
    }

    /// Crossovers as a serializable spec
    pub fn crossover_spec(&self) -> CrossoverSpec {
        CrossoverSpec::new(self.cutoffs())
    }
}
