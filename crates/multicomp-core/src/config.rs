//! Engine construction settings
//!
//! Everything here is fixed for the lifetime of an engine instance (band
//! count) or applied at prepare time (lookahead, smoothing). Runtime values
//! such as thresholds and crossovers live in [`crate::params::ParamSet`].
//!
//! The struct is a plain serde value so a host can persist it alongside its
//! own state; the core performs no file I/O.

use serde::{Deserialize, Serialize};

use crate::dynamics::DetectorMode;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{MAX_BANDS, MIN_BANDS};

/// Longest supported per-band lookahead
pub const MAX_LOOKAHEAD_MS: f32 = 20.0;

/// Bounds applied to the parameter ramp time
pub const MIN_SMOOTHING_MS: f32 = 1.0;
pub const MAX_SMOOTHING_MS: f32 = 50.0;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of bands (2..=8)
    /// Changing it requires building a new engine.
    /// Default: 4
    pub band_count: usize,

    /// Envelope detection mode for every band
    /// Default: Peak
    pub detector: DetectorMode,

    /// Ramp time for parameter changes in ms (clamped to 1..=50)
    /// Default: 10 ms
    pub smoothing_ms: f32,

    /// Per-band lookahead in ms; empty means no lookahead anywhere
    /// Otherwise one entry per band, each within 0..=20 ms.
    /// Default: empty
    pub lookahead_ms: Vec<f32>,

    /// Capacity of the audio → control fault event ring
    /// Default: 64
    pub fault_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            band_count: 4,
            detector: DetectorMode::Peak,
            smoothing_ms: 10.0,
            lookahead_ms: Vec::new(),
            fault_queue_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Config for a given band count with every other field at its default
    pub fn with_bands(band_count: usize) -> Self {
        Self {
            band_count,
            ..Default::default()
        }
    }

    /// Check the construction-time invariants
    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_BANDS..=MAX_BANDS).contains(&self.band_count) {
            return Err(ConfigError::InvalidBandCount {
                got: self.band_count,
                min: MIN_BANDS,
                max: MAX_BANDS,
            });
        }
        if !self.smoothing_ms.is_finite() {
            return Err(ConfigError::NonFinite("smoothing_ms"));
        }
        if !self.lookahead_ms.is_empty() && self.lookahead_ms.len() != self.band_count {
            return Err(ConfigError::LookaheadCountMismatch {
                expected: self.band_count,
                got: self.lookahead_ms.len(),
            });
        }
        for (band, &ms) in self.lookahead_ms.iter().enumerate() {
            if !ms.is_finite() || !(0.0..=MAX_LOOKAHEAD_MS).contains(&ms) {
                return Err(ConfigError::InvalidLookahead {
                    band,
                    got: ms,
                    max: MAX_LOOKAHEAD_MS,
                });
            }
        }
        Ok(())
    }

    /// Ramp time actually used, after clamping
    pub fn effective_smoothing_ms(&self) -> f32 {
        self.smoothing_ms.clamp(MIN_SMOOTHING_MS, MAX_SMOOTHING_MS)
    }

    /// Lookahead of one band in ms (0 when not configured)
    pub fn band_lookahead_ms(&self, band: usize) -> f32 {
        self.lookahead_ms.get(band).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.band_count, 4);
        assert_eq!(config.detector, DetectorMode::Peak);
        assert_eq!(config.effective_smoothing_ms(), 10.0);
    }

    #[test]
    fn test_band_count_bounds() {
        assert!(EngineConfig::with_bands(1).validate().is_err());
        assert!(EngineConfig::with_bands(2).validate().is_ok());
        assert!(EngineConfig::with_bands(8).validate().is_ok());
        assert!(matches!(
            EngineConfig::with_bands(9).validate(),
            Err(ConfigError::InvalidBandCount { got: 9, .. })
        ));
    }

    #[test]
    fn test_lookahead_validation() {
        let mut config = EngineConfig {
            lookahead_ms: vec![0.0, 1.5, 0.0, 0.0],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.band_lookahead_ms(1), 1.5);

        config.lookahead_ms = vec![0.0, 1.5];
        assert_eq!(
            config.validate(),
            Err(ConfigError::LookaheadCountMismatch { expected: 4, got: 2 })
        );

        config.lookahead_ms = vec![0.0, 25.0, 0.0, 0.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLookahead { band: 1, .. })
        ));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("band_count: 3\ndetector: Rms\n").unwrap();
        assert_eq!(config.band_count, 3);
        assert_eq!(config.detector, DetectorMode::Rms);
        assert_eq!(config.smoothing_ms, 10.0);
        assert!(config.lookahead_ms.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smoothing_is_clamped() {
        let config = EngineConfig {
            smoothing_ms: 500.0,
            ..Default::default()
        };
        assert_eq!(config.effective_smoothing_ms(), MAX_SMOOTHING_MS);
    }
}
