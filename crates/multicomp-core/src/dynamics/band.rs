//! Per-band compressor
//!
//! Signal flow for one band:
//!
//! ```text
//! band audio ──┬──────────────► lookahead delay ──► × gain ──► out
//!              │                                      ▲
//!              └─► linked peak ─► envelope ─► dB ─► curve ─► + makeup
//! ```
//!
//! The detector always sees the undelayed signal; with lookahead the gain
//! reduction is in place before the transient reaches the output.
//!
//! Threshold, ratio, knee and makeup are ramped per sample. Attack and
//! release are ramped at block rate, and the detector coefficients are
//! only recomputed when one of them actually moved.

use super::envelope::{DetectorMode, EnvelopeDetector};
use super::gain_computer::GainComputer;
use crate::delay::DelayLine;
use crate::params::{DynamicsParams, LinearSmoother};
use crate::types::{db_to_gain, gain_to_db, AudioBuffer, LEVEL_FLOOR};

// ═══════════════════════════════════════════════════════════════════════════════
// Band dynamics
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressor state for a single band
pub struct BandDynamics {
    detector: EnvelopeDetector,
    lookahead: DelayLine,
    sample_rate: f32,

    // Per-sample ramps

    threshold_db: LinearSmoother,
    ratio: LinearSmoother,
    knee_db: LinearSmoother,
    /// Makeup as a linear factor
    makeup: LinearSmoother,

    // Block-rate ramps

    attack_ms: LinearSmoother,
    release_ms: LinearSmoother,
    /// Times the detector coefficients were last computed for
    applied_times: (f32, f32),

    // Telemetry of the last block

    /// Deepest gain reduction (dB, <= 0)
    gain_reduction_db: f32,
    /// Highest detected level (dBFS)
    level_db: f32,
}

impl BandDynamics {
    /// Create a band resting at `params`
    ///
    /// `ramp_len` is the parameter ramp in samples, `lookahead` the band's
    /// lookahead delay in samples.
    pub fn new(
        params: &DynamicsParams,
        mode: DetectorMode,
        num_channels: usize,
        sample_rate: f32,
        ramp_len: u32,
        lookahead: usize,
    ) -> Self {
        let mut delay = DelayLine::new(num_channels, lookahead);
        delay.set_delay(lookahead);

        let mut band = Self {
            detector: EnvelopeDetector::new(mode),
            lookahead: delay,
            sample_rate,
            threshold_db: LinearSmoother::new(params.threshold_db, ramp_len),
            ratio: LinearSmoother::new(params.ratio, ramp_len),
            knee_db: LinearSmoother::new(params.knee_db, ramp_len),
            makeup: LinearSmoother::new(db_to_gain(params.makeup_db), ramp_len),
            attack_ms: LinearSmoother::new(params.attack_ms, ramp_len),
            release_ms: LinearSmoother::new(params.release_ms, ramp_len),
            applied_times: (params.attack_ms, params.release_ms),
            gain_reduction_db: 0.0,
            level_db: gain_to_db(0.0),
        };
        band.detector.set_times(params.attack_ms, params.release_ms, sample_rate);
        band
    }

    /// Ramp toward new settings
    pub fn set_params(&mut self, params: &DynamicsParams) {
        self.threshold_db.set_target(params.threshold_db);
        self.ratio.set_target(params.ratio);
        self.knee_db.set_target(params.knee_db);
        self.makeup.set_target(db_to_gain(params.makeup_db));
        self.attack_ms.set_target(params.attack_ms);
        self.release_ms.set_target(params.release_ms);
    }

    /// Jump to new settings without ramping
    pub fn jump_to(&mut self, params: &DynamicsParams) {
        self.threshold_db.reset(params.threshold_db);
        self.ratio.reset(params.ratio);
        self.knee_db.reset(params.knee_db);
        self.makeup.reset(db_to_gain(params.makeup_db));
        self.attack_ms.reset(params.attack_ms);
        self.release_ms.reset(params.release_ms);
        self.update_detector_times();
    }

    /// Compress one block in place
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let len = buffer.len();
        self.attack_ms.skip(len);
        self.release_ms.skip(len);
        self.update_detector_times();

        let mut deepest_gr = 0.0_f32;
        let mut loudest = 0.0_f32;

        for i in 0..len {
            let envelope = self.detector.process(buffer.frame_peak(i));
            loudest = loudest.max(envelope);

            let curve = GainComputer::new(
                self.threshold_db.next(),
                self.ratio.next(),
                self.knee_db.next(),
            );
            let gr_db = curve.gain_reduction_db(gain_to_db(envelope));
            deepest_gr = deepest_gr.min(gr_db);

            let gain = db_to_gain(gr_db) * self.makeup.next();
            for ch in 0..buffer.num_channels() {
                let sample = &mut buffer.channel_mut(ch)[i];
                *sample = self.lookahead.process_sample(ch, *sample) * gain;
            }
        }

        self.gain_reduction_db = deepest_gr;
        self.level_db = gain_to_db(loudest.max(LEVEL_FLOOR));
    }

    fn update_detector_times(&mut self) {
        let times = (self.attack_ms.value(), self.release_ms.value());
        if times != self.applied_times {
            self.detector.set_times(times.0, times.1, self.sample_rate);
            self.applied_times = times;
        }
    }

    /// Deepest gain reduction of the last block (dB, <= 0)
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Highest detected level of the last block (dBFS)
    pub fn level_db(&self) -> f32 {
        self.level_db
    }

    /// Lookahead delay in samples
    pub fn lookahead_samples(&self) -> usize {
        self.lookahead.delay()
    }

    /// Number of non-finite detector flushes since the last call
    pub fn take_flush_count(&mut self) -> u32 {
        self.detector.take_flush_count()
    }

    /// Clear detector, lookahead buffer and meters
    pub fn reset(&mut self) {
        self.detector.reset();
        self.lookahead.clear();
        self.gain_reduction_db = 0.0;
        self.level_db = gain_to_db(0.0);
    }

    pub fn is_silent(&self) -> bool {
        self.detector.is_silent() && self.lookahead.is_silent()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
