//! Lock-free telemetry for UI access
//!
//! The audio thread stores per-band gain reduction and detected level once
//! per block; any number of readers poll them through a cloneable
//! [`MeterHandle`]. Floats are stored as their bit patterns in `AtomicU32`.
//!
//! All operations use `Ordering::Relaxed` since readers only need
//! visibility, not synchronization with other memory operations.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{gain_to_db, MAX_BANDS};

/// Atomic meter storage shared between the engine and its handles
pub(crate) struct MeterAtomics {
    band_count: usize,
    /// Deepest gain reduction of the last block per band (dB, <= 0)
    gain_reduction_db: [AtomicU32; MAX_BANDS],
    /// Highest detected level of the last block per band (dBFS)
    level_db: [AtomicU32; MAX_BANDS],
    /// Numerical faults absorbed since creation
    faults: AtomicU64,
}

impl MeterAtomics {
    pub fn new(band_count: usize) -> Self {
        let floor = gain_to_db(0.0).to_bits();
        Self {
            band_count,
            gain_reduction_db: std::array::from_fn(|_| AtomicU32::new(0.0_f32.to_bits())),
            level_db: std::array::from_fn(|_| AtomicU32::new(floor)),
            faults: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn store_band(&self, band: usize, gain_reduction_db: f32, level_db: f32) {
        self.gain_reduction_db[band].store(gain_reduction_db.to_bits(), Ordering::Relaxed);
        self.level_db[band].store(level_db.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Back to the idle readings (no reduction, silent)
    pub fn clear(&self) {
        for band in 0..self.band_count {
            self.store_band(band, 0.0, gain_to_db(0.0));
        }
    }
}

/// Cloneable read-only view of the engine meters
#[derive(Clone)]
pub struct MeterHandle {
    atomics: Arc<MeterAtomics>,
}

impl MeterHandle {
    pub(crate) fn new(atomics: Arc<MeterAtomics>) -> Self {
        Self { atomics }
    }

    /// Number of bands being metered
    pub fn band_count(&self) -> usize {
        self.atomics.band_count
    }

    /// Gain reduction of a band in dB (<= 0; 0 for an unknown band)
    pub fn gain_reduction_db(&self, band: usize) -> f32 {
        if band >= self.atomics.band_count {
            return 0.0;
        }
        f32::from_bits(self.atomics.gain_reduction_db[band].load(Ordering::Relaxed))
    }

    /// Detected level of a band in dBFS
    pub fn level_db(&self, band: usize) -> f32 {
        if band >= self.atomics.band_count {
            return gain_to_db(0.0);
        }
        f32::from_bits(self.atomics.level_db[band].load(Ordering::Relaxed))
    }

    /// Gain reduction of every band
    pub fn gain_reductions(&self) -> Vec<f32> {
        (0..self.band_count())
            .map(|band| self.gain_reduction_db(band))
            .collect()
    }

    /// Numerical faults absorbed by the audio path so far
    pub fn fault_count(&self) -> u64 {
        self.atomics.faults.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MeterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeterHandle")
            .field("gain_reduction_db", &self.gain_reductions())
            .field("fault_count", &self.fault_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_read() {
        let atomics = Arc::new(MeterAtomics::new(4));
        let handle = MeterHandle::new(atomics.clone());

        assert_eq!(handle.gain_reduction_db(2), 0.0);
        atomics.store_band(2, -4.5, -10.0);
        assert_eq!(handle.gain_reduction_db(2), -4.5);
        assert_eq!(handle.level_db(2), -10.0);

        // Out-of-range bands read as idle
        assert_eq!(handle.gain_reduction_db(6), 0.0);
        assert_eq!(handle.gain_reductions().len(), 4);

        atomics.clear();
        assert_eq!(handle.gain_reduction_db(2), 0.0);
    }

    #[test]
    fn test_fault_counter() {
        let atomics = Arc::new(MeterAtomics::new(2));
        let handle = MeterHandle::new(atomics.clone());
        atomics.record_fault();
        atomics.record_fault();
        assert_eq!(handle.clone().fault_count(), 2);
    }
}
