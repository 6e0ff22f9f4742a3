//! Lock-free parameter snapshot exchange
//!
//! A single writer (the control thread) publishes whole [`ParamSet`]s into
//! an array of atomics guarded by a sequence counter. The audio thread reads
//! without ever waiting: if a write is in progress it simply keeps the
//! snapshot it already has for one more block.
//!
//! ```text
//! writer:  seq = odd  → store values → seq = even (Release)
//! reader:  s1 = seq (Acquire) → load values → fence(Acquire) → s2 = seq
//!          s1 even && s1 == s2  ⇒  consistent snapshot
//! ```

use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use super::{DynamicsParams, ParamSet};
use crate::types::{MAX_BANDS, MAX_CROSSOVERS};

const PARAMS_PER_BAND: usize = 6;
const CUTOFF_BASE: usize = MAX_BANDS * PARAMS_PER_BAND;
const TRIM_SLOT: usize = CUTOFF_BASE + MAX_CROSSOVERS;
const NUM_SLOTS: usize = TRIM_SLOT + 1;

/// Parameter storage shared between the control and audio threads
pub(crate) struct SharedParams {
    sequence: AtomicU64,
    slots: [AtomicU32; NUM_SLOTS],
    /// Prepared sample rate (f64 bits, 0 = not prepared)
    sample_rate: AtomicU64,
}

impl SharedParams {
    pub fn new(initial: &ParamSet) -> Self {
        let values = encode(initial);
        Self {
            sequence: AtomicU64::new(0),
            slots: std::array::from_fn(|i| AtomicU32::new(values[i].to_bits())),
            sample_rate: AtomicU64::new(0),
        }
    }

    /// Publish a complete parameter set
    ///
    /// Must only be called from the single writer (`ParamController` holds
    /// the only write path and requires `&mut self`).
    pub fn publish(&self, set: &ParamSet) {
        let values = encode(set);
        let seq = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        for (slot, value) in self.slots.iter().zip(values.iter()) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
        self.sequence.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Current sequence number (even when no write is in progress)
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Try to read a consistent snapshot into `out`
    ///
    /// Returns the sequence number read, or `None` if a write raced with
    /// the read. `out` keeps its band count.
    fn try_read(&self, out: &mut ParamSet) -> Option<u64> {
        let s1 = self.sequence.load(Ordering::Acquire);
        if s1 & 1 == 1 {
            return None;
        }
        let mut values = [0.0_f32; NUM_SLOTS];
        for (value, slot) in values.iter_mut().zip(self.slots.iter()) {
            *value = f32::from_bits(slot.load(Ordering::Relaxed));
        }
        fence(Ordering::Acquire);
        let s2 = self.sequence.load(Ordering::Relaxed);
        if s1 != s2 {
            return None;
        }
        decode(&values, out);
        Some(s1)
    }

    pub fn set_sample_rate(&self, sample_rate: f64) {
        self.sample_rate
            .store(sample_rate.to_bits(), Ordering::Relaxed);
    }

    /// Prepared sample rate, if the engine has been prepared
    pub fn sample_rate(&self) -> Option<f64> {
        let sr = f64::from_bits(self.sample_rate.load(Ordering::Relaxed));
        (sr > 0.0).then_some(sr)
    }
}

fn encode(set: &ParamSet) -> [f32; NUM_SLOTS] {
    let mut values = [0.0; NUM_SLOTS];
    for (band, p) in set.bands.iter().enumerate() {
        let base = band * PARAMS_PER_BAND;
        values[base] = p.threshold_db;
        values[base + 1] = p.ratio;
        values[base + 2] = p.attack_ms;
        values[base + 3] = p.release_ms;
        values[base + 4] = p.knee_db;
        values[base + 5] = p.makeup_db;
    }
    values[CUTOFF_BASE..TRIM_SLOT].copy_from_slice(&set.cutoffs_hz);
    values[TRIM_SLOT] = set.output_trim_db;
    values
}

fn decode(values: &[f32; NUM_SLOTS], out: &mut ParamSet) {
    for (band, p) in out.bands.iter_mut().enumerate() {
        let base = band * PARAMS_PER_BAND;
        *p = DynamicsParams {
            threshold_db: values[base],
            ratio: values[base + 1],
            attack_ms: values[base + 2],
            release_ms: values[base + 3],
            knee_db: values[base + 4],
            makeup_db: values[base + 5],
        };
    }
    out.cutoffs_hz
        .copy_from_slice(&values[CUTOFF_BASE..TRIM_SLOT]);
    out.output_trim_db = values[TRIM_SLOT];
}

/// Audio-side view of the shared parameters
///
/// Holds the last consistent snapshot; [`ParamReader::refresh`] is called
/// once per block and never blocks.
pub(crate) struct ParamReader {
    shared: Arc<SharedParams>,
    current: ParamSet,
    last_sequence: u64,
}

impl ParamReader {
    pub fn new(shared: Arc<SharedParams>, initial: ParamSet) -> Self {
        let last_sequence = shared.sequence();
        Self {
            shared,
            current: initial,
            last_sequence,
        }
    }

    /// Pick up a newer snapshot if one is available
    ///
    /// Returns `true` when the current snapshot changed.
    #[inline]
    pub fn refresh(&mut self) -> bool {
        if self.shared.sequence() == self.last_sequence {
            return false;
        }
        let mut next = self.current;
        match self.shared.try_read(&mut next) {
            Some(seq) => {
                self.last_sequence = seq;
                let changed = next != self.current;
                self.current = next;
                changed
            }
            None => false,
        }
    }

    /// Latest consistent snapshot
    #[inline]
    pub fn current(&self) -> &ParamSet {
        &self.current
    }

    pub fn shared(&self) -> &SharedParams {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_refresh() {
        let initial = ParamSet::with_defaults(4);
        let shared = Arc::new(SharedParams::new(&initial));
        let mut reader = ParamReader::new(Arc::clone(&shared), initial);

        // Nothing published yet
        assert!(!reader.refresh());

        let mut next = initial;
        next.bands[2].ratio = 8.0;
        next.cutoffs_hz[1] = 1200.0;
        next.output_trim_db = -3.0;
        shared.publish(&next);

        assert!(reader.refresh());
        assert_eq!(reader.current(), &next);
        assert_eq!(reader.current().band_count(), 4);

        // Same sequence: no work, no change
        assert!(!reader.refresh());
    }

    #[test]
    fn test_read_during_write_keeps_previous_snapshot() {
        let initial = ParamSet::with_defaults(2);
        let shared = SharedParams::new(&initial);
        // Simulate a writer that has started but not finished
        shared.sequence.store(1, Ordering::Relaxed);

        let mut out = initial;
        assert_eq!(shared.try_read(&mut out), None);
        assert_eq!(out, initial);
    }

    #[test]
    fn test_concurrent_publish_is_never_torn() {
        let initial = ParamSet::with_defaults(4);
        let shared = Arc::new(SharedParams::new(&initial));
        let writer_shared = Arc::clone(&shared);

        let writer = std::thread::spawn(move || {
            let mut set = initial;
            for i in 0..2000 {
                // Every slot carries the same value in a given publish
                let v = i as f32;
                for band in set.bands.iter_mut() {
                    band.threshold_db = v;
                    band.makeup_db = v;
                }
                set.output_trim_db = v;
                writer_shared.publish(&set);
            }
        });

        let mut reader = ParamReader::new(Arc::clone(&shared), initial);
        for _ in 0..20000 {
            reader.refresh();
            let snap = reader.current();
            let v = snap.bands[0].threshold_db;
            if snap.output_trim_db != 0.0 || v != -12.0 {
                assert!(snap.bands.iter().all(|b| b.threshold_db == v && b.makeup_db == v));
                assert_eq!(snap.output_trim_db, v);
            }
        }
        writer.join().unwrap();
    }
}
