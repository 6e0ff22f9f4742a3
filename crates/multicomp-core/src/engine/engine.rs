//! Main processing engine - ties together crossover, alignment, dynamics and mixing
//!
//! ```text
//! input ─► sanitize ─► CrossoverBank ─► BandDynamics × N ─► BandAligner ─► MixStage ─► output
//! ```
//!
//! `prepare` allocates every buffer and filter for a sample rate, channel
//! count and maximum block size. `process` never allocates, locks or logs:
//! it reads at most one parameter snapshot per call, ramps toward it, and
//! reports numerical trouble through the meters and the fault ring.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::crossover::{clamp_cutoff, BandAligner, CrossoverBank};
use crate::dynamics::BandDynamics;
use crate::error::{ConfigError, EngineError, EngineResult, FaultEvent, FaultKind};
use crate::params::{LinearSmoother, ParamController, ParamReader, ParamSet, SharedParams};
use crate::types::{AudioBuffer, MAX_CHANNELS, MAX_CROSSOVERS};

use super::meters::{MeterAtomics, MeterHandle};
use super::mix::MixStage;

/// Build an engine and the controller that drives it
///
/// The engine goes to the audio thread, the controller stays on the
/// control thread. Parameters start at the defaults for the band count.
pub fn create(config: EngineConfig) -> Result<(MulticompEngine, ParamController), ConfigError> {
    config
        .validate()
        .inspect_err(|e| log::warn!("Rejected engine config: {}", e))?;

    let params = ParamSet::with_defaults(config.band_count);
    let shared = Arc::new(SharedParams::new(&params));
    let meters = Arc::new(MeterAtomics::new(config.band_count));
    let (producer, consumer) = rtrb::RingBuffer::new(config.fault_queue_capacity.max(1));

    log::info!(
        "Created {}-band engine (detector {:?}, smoothing {} ms)",
        config.band_count,
        config.detector,
        config.effective_smoothing_ms()
    );

    let engine = MulticompEngine {
        reader: ParamReader::new(shared.clone(), params),
        faults: FaultSink {
            producer,
            meters: meters.clone(),
        },
        prepared: None,
        config,
    };
    let controller = ParamController::new(params, shared, MeterHandle::new(meters), consumer);
    Ok((engine, controller))
}

/// Audio-thread side of fault reporting
struct FaultSink {
    producer: rtrb::Producer<FaultEvent>,
    meters: Arc<MeterAtomics>,
}

impl FaultSink {
    /// Count the fault and queue it for the control thread
    ///
    /// When the ring is full the event is dropped; the counter still moves.
    #[inline]
    fn report(&mut self, kind: FaultKind, band: Option<usize>) {
        self.meters.record_fault();
        let _ = self.producer.push(FaultEvent { kind, band });
    }
}

/// The multiband compressor
pub struct MulticompEngine {
    config: EngineConfig,
    reader: ParamReader,
    faults: FaultSink,
    /// Everything sized by `prepare`
    prepared: Option<PreparedState>,
}

impl MulticompEngine {
    /// Allocate for a sample rate, maximum block size and channel count
    ///
    /// May be called again to reconfigure; all processing state is rebuilt
    /// and the current parameters are applied without ramping.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
        num_channels: usize,
    ) -> EngineResult<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(max_block_size));
        }
        if num_channels == 0 || num_channels > MAX_CHANNELS {
            return Err(EngineError::InvalidChannelCount {
                got: num_channels,
                max: MAX_CHANNELS,
            });
        }

        self.reader.refresh();
        self.reader.shared().set_sample_rate(sample_rate);

        let state = PreparedState::new(
            &self.config,
            self.reader.current(),
            sample_rate as f32,
            max_block_size,
            num_channels,
        );
        log::info!(
            "Prepared engine: {} Hz, {} channels, max block {}, latency {} samples",
            sample_rate,
            num_channels,
            max_block_size,
            state.latency_samples
        );
        self.prepared = Some(state);
        self.faults.meters.clear();
        Ok(())
    }

    /// Whether `prepare` has succeeded
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.config.band_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prepared sample rate
    pub fn sample_rate(&self) -> Option<f64> {
        self.reader.shared().sample_rate()
    }

    /// Constant delay between input and output (0 until prepared)
    pub fn latency_samples(&self) -> usize {
        self.prepared.as_ref().map_or(0, |s| s.latency_samples)
    }

    /// Process one block from `input` into `output`
    ///
    /// Both must have the prepared channel count and equal lengths. Blocks
    /// longer than the prepared maximum are processed in chunks. On error
    /// the output is silenced.
    pub fn process(&mut self, input: &[&[f32]], output: &mut [&mut [f32]]) -> EngineResult<()> {
        let result = self.check_block(input, output);
        let len = match result {
            Ok(len) => len,
            Err(e) => {
                for channel in output.iter_mut() {
                    channel.fill(0.0);
                }
                return Err(e);
            }
        };
        let Some(state) = self.prepared.as_mut() else {
            return Err(EngineError::NotPrepared);
        };

        self.reader.refresh();
        let params = self.reader.current();

        let mut offset = 0;
        while offset < len {
            let n = state.max_block_size.min(len - offset);
            state.input.set_len_from_capacity(n);
            state.input.copy_from_slices(input, offset);
            state.process_chunk(params, &mut self.faults);
            state.output.copy_to_slices(output, offset);
            offset += n;
        }
        Ok(())
    }

    /// Process one block in place
    ///
    /// Every channel must have the same length. On error the buffer is
    /// silenced.
    pub fn process_in_place(&mut self, buffer: &mut [&mut [f32]]) -> EngineResult<()> {
        let len = match self.check_in_place(buffer) {
            Ok(len) => len,
            Err(e) => {
                for channel in buffer.iter_mut() {
                    channel.fill(0.0);
                }
                return Err(e);
            }
        };
        let Some(state) = self.prepared.as_mut() else {
            return Err(EngineError::NotPrepared);
        };

        self.reader.refresh();
        let params = self.reader.current();

        let mut offset = 0;
        while offset < len {
            let n = state.max_block_size.min(len - offset);
            state.input.set_len_from_capacity(n);
            state.input.copy_from_slices(buffer, offset);
            state.process_chunk(params, &mut self.faults);
            state.output.copy_to_slices(buffer, offset);
            offset += n;
        }
        Ok(())
    }

    /// Clear all filter, detector and delay state
    ///
    /// The next block applies the current parameters without ramping.
    pub fn reset(&mut self) {
        if let Some(state) = self.prepared.as_mut() {
            state.reset();
        }
        self.faults.meters.clear();
        log::debug!("Engine reset");
    }

    fn check_in_place(&self, buffer: &[&mut [f32]]) -> EngineResult<usize> {
        let state = self.prepared.as_ref().ok_or(EngineError::NotPrepared)?;
        if buffer.len() != state.num_channels {
            return Err(EngineError::ChannelMismatch {
                expected: state.num_channels,
                got: buffer.len(),
            });
        }
        let len = buffer.first().map_or(0, |c| c.len());
        if let Some(bad) = buffer.iter().find(|c| c.len() != len) {
            return Err(EngineError::BlockLengthMismatch {
                input: len,
                output: bad.len(),
            });
        }
        Ok(len)
    }

    fn check_block(&self, input: &[&[f32]], output: &[&mut [f32]]) -> EngineResult<usize> {
        let state = self.prepared.as_ref().ok_or(EngineError::NotPrepared)?;
        for got in [input.len(), output.len()] {
            if got != state.num_channels {
                return Err(EngineError::ChannelMismatch {
                    expected: state.num_channels,
                    got,
                });
            }
        }
        let len = input.first().map_or(0, |c| c.len());
        let lengths = input.iter().map(|c| c.len()).chain(output.iter().map(|c| c.len()));
        for other in lengths {
            if other != len {
                return Err(EngineError::BlockLengthMismatch { input: len, output: other });
            }
        }
        Ok(len)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prepared state
// ═══════════════════════════════════════════════════════════════════════════════

/// Processing state sized for one sample rate / channel count / block size
struct PreparedState {
    num_channels: usize,
    max_block_size: usize,
    latency_samples: usize,

    bank: CrossoverBank,
    aligner: BandAligner,
    bands: Vec<BandDynamics>,
    mix: MixStage,

    /// Block-rate crossover ramps
    cutoffs: Vec<LinearSmoother>,
    /// Cutoffs the filters are currently tuned to
    applied_cutoffs: [f32; MAX_CROSSOVERS],
    /// Apply the next snapshot without ramping (after prepare/reset)
    jump_pending: bool,

    // Pre-allocated buffers
    input: AudioBuffer,
    band_buffers: Vec<AudioBuffer>,
    output: AudioBuffer,
}

impl PreparedState {
    fn new(
        config: &EngineConfig,
        params: &ParamSet,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Self {
        let ramp_len =
            LinearSmoother::ramp_samples(config.effective_smoothing_ms(), sample_rate);
        let band_count = params.band_count();

        let cutoffs = params.cutoffs();
        for (k, &f) in cutoffs.iter().enumerate() {
            let clamped = clamp_cutoff(f, sample_rate);
            if clamped != f {
                log::warn!(
                    "Crossover {} at {} Hz is out of range at {} Hz, using {} Hz",
                    k,
                    f,
                    sample_rate,
                    clamped
                );
            }
        }

        let lookahead: Vec<usize> = (0..band_count)
            .map(|b| (config.band_lookahead_ms(b) / 1000.0 * sample_rate).round() as usize)
            .collect();
        let aligner = BandAligner::new(num_channels, sample_rate, cutoffs, &lookahead);

        let bands = params
            .bands()
            .iter()
            .zip(&lookahead)
            .map(|(p, &la)| {
                BandDynamics::new(p, config.detector, num_channels, sample_rate, ramp_len, la)
            })
            .collect();

        let mut applied_cutoffs = [0.0; MAX_CROSSOVERS];
        applied_cutoffs[..cutoffs.len()].copy_from_slice(cutoffs);

        Self {
            num_channels,
            max_block_size,
            latency_samples: aligner.latency_samples(),
            bank: CrossoverBank::new(num_channels, sample_rate, cutoffs),
            aligner,
            bands,
            mix: MixStage::new(params.output_trim_db, ramp_len),
            cutoffs: cutoffs
                .iter()
                .map(|&f| LinearSmoother::new(f, ramp_len))
                .collect(),
            applied_cutoffs,
            jump_pending: true,
            input: AudioBuffer::silence(num_channels, max_block_size),
            band_buffers: (0..band_count)
                .map(|_| AudioBuffer::silence(num_channels, max_block_size))
                .collect(),
            output: AudioBuffer::silence(num_channels, max_block_size),
        }
    }

    /// Move every parameter toward the snapshot
    fn apply_params(&mut self, params: &ParamSet) {
        if self.jump_pending {
            for (band, p) in self.bands.iter_mut().zip(params.bands()) {
                band.jump_to(p);
            }
            for (smoother, &f) in self.cutoffs.iter_mut().zip(params.cutoffs()) {
                smoother.reset(f);
            }
            self.mix.jump_to_trim_db(params.output_trim_db);
            self.jump_pending = false;
            return;
        }

        for (band, p) in self.bands.iter_mut().zip(params.bands()) {
            band.set_params(p);
        }
        for (smoother, &f) in self.cutoffs.iter_mut().zip(params.cutoffs()) {
            smoother.set_target(f);
        }
        self.mix.set_trim_db(params.output_trim_db);
    }

    /// Advance the crossover ramps by one block and retune moved points
    fn update_cutoffs(&mut self, block_len: usize) {
        for (k, smoother) in self.cutoffs.iter_mut().enumerate() {
            smoother.skip(block_len);
            let f = smoother.value();
            if f != self.applied_cutoffs[k] {
                self.bank.set_cutoff(k, f);
                self.aligner.set_cutoff(k, f);
                self.applied_cutoffs[k] = f;
            }
        }
    }

    /// Process `self.input` into `self.output`
    fn process_chunk(&mut self, params: &ParamSet, faults: &mut FaultSink) {
        let len = self.input.len();

        if self.input.sanitize() > 0 {
            faults.report(FaultKind::NonFiniteInput, None);
        }

        self.apply_params(params);
        self.update_cutoffs(len);

        for buffer in &mut self.band_buffers {
            buffer.set_len_from_capacity(len);
        }
        self.bank.split_block(&self.input, &mut self.band_buffers);
        if !self.bank.is_finite() {
            self.bank.reset();
            for buffer in &mut self.band_buffers {
                buffer.fill_silence();
            }
            faults.report(FaultKind::FilterState, None);
        }

        for (b, (band, buffer)) in self
            .bands
            .iter_mut()
            .zip(self.band_buffers.iter_mut())
            .enumerate()
        {
            band.process(buffer);
            if band.take_flush_count() > 0 {
                faults.report(FaultKind::DetectorState, Some(b));
            }
            faults
                .meters
                .store_band(b, band.gain_reduction_db(), band.level_db());
        }

        self.aligner.process(&mut self.band_buffers);
        if !self.aligner.is_finite() {
            self.aligner.reset();
            for buffer in &mut self.band_buffers {
                buffer.fill_silence();
            }
            faults.report(FaultKind::FilterState, None);
        }

        self.output.set_len_from_capacity(len);
        self.mix.sum_into(&self.band_buffers, &mut self.output);

        if !self.output.is_finite() {
            self.output.fill_silence();
            self.reset();
            faults.report(FaultKind::NonFiniteOutput, None);
        }

        self.bank.flush_denormals();
        self.aligner.flush_denormals();
    }

    fn reset(&mut self) {
        self.bank.reset();
        self.aligner.reset();
        for band in &mut self.bands {
            band.reset();
        }
        self.jump_pending = true;
    }

    #[cfg(test)]
    fn is_silent(&self) -> bool {
        self.bank.is_silent() && self.aligner.is_silent() && self.bands.iter().all(|b| b.is_silent())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::db_to_gain;

    const SR: f64 = 48000.0;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// Process `input` channels in one call and return the output channels
    fn run(engine: &mut MulticompEngine, input: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let refs: Vec<&[f32]> = input.iter().map(|c| c.as_slice()).collect();
        let mut out: Vec<Vec<f32>> = input.iter().map(|c| vec![0.0; c.len()]).collect();
        let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
        engine.process(&refs, &mut out_refs).unwrap();
        out
    }

    fn stereo(samples: Vec<f32>) -> Vec<Vec<f32>> {
        vec![samples.clone(), samples]
    }

    fn prepared(config: EngineConfig) -> (MulticompEngine, ParamController) {
        let (mut engine, controller) = create(config).unwrap();
        engine.prepare(SR, 480, 2).unwrap();
        (engine, controller)
    }

    #[test]
    fn test_reference_scenario_compresses_only_the_sine_band() {
        let (mut engine, mut ctl) = create(EngineConfig::default()).unwrap();
        ctl.set_all_ratio(4.0).unwrap();
        ctl.set_all_threshold(-12.0).unwrap();
        ctl.set_all_attack(20.0).unwrap();
        ctl.set_all_release(50.0).unwrap();
        engine.prepare(SR, 480, 2).unwrap();

        let signal = sine(1000.0, 1.0, 48000);
        for block in signal.chunks(480) {
            run(&mut engine, &stereo(block.to_vec()));
        }

        let meters = ctl.meters();
        let gr = meters.gain_reductions();
        assert!(
            (-7.5..=-3.0).contains(&gr[2]),
            "1 kHz band should be compressed by ~5 dB, got {:?}",
            gr
        );
        // The static curve applies to the detected level, which rides
        // below the sine's peak
        let level = meters.level_db(2);
        let expected = -(level - (-12.0)) * (1.0 - 1.0 / 4.0);
        assert!(
            (gr[2] - expected).abs() < 0.05,
            "GR {} vs {} from detected level {}",
            gr[2],
            expected,
            level
        );
        for band in [0, 1, 3] {
            assert!(gr[band] > -0.5, "band {} should be idle, got {:?}", band, gr);
        }
        assert_eq!(ctl.gain_reduction_db(2), gr[2]);
        assert_eq!(meters.fault_count(), 0);
    }

    #[test]
    fn test_unity_ratio_sum_is_flat() {
        let (mut engine, mut ctl) = create(EngineConfig::default()).unwrap();
        ctl.set_all_ratio(1.0).unwrap();
        engine.prepare(SR, 4096, 1).unwrap();

        let len = 16384;
        let mut impulse = vec![0.0; len];
        impulse[0] = 1.0;
        let h = run(&mut engine, &[impulse]).remove(0);

        let mut freq = 30.0_f64;
        while freq < 20000.0 {
            let w = 2.0 * std::f64::consts::PI * freq / SR;
            let (mut re, mut im) = (0.0_f64, 0.0_f64);
            for (n, &x) in h.iter().enumerate() {
                re += x as f64 * (w * n as f64).cos();
                im -= x as f64 * (w * n as f64).sin();
            }
            let db = 20.0 * (re * re + im * im).sqrt().log10();
            assert!(db.abs() < 0.5, "response at {:.0} Hz is {:.3} dB", freq, db);
            freq *= 1.5;
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let (mut engine, ctl) = prepared(EngineConfig::default());
        for _ in 0..10 {
            let out = run(&mut engine, &stereo(vec![0.0; 480]));
            assert!(out.iter().flatten().all(|&s| s == 0.0));
        }
        let state = engine.prepared.as_ref().unwrap();
        assert!(state.is_silent());
        assert!(ctl.meters().gain_reductions().iter().all(|&gr| gr == 0.0));
    }

    #[test]
    fn test_process_before_prepare_is_rejected() {
        let (mut engine, _ctl) = create(EngineConfig::default()).unwrap();
        assert!(!engine.is_prepared());
        assert_eq!(engine.latency_samples(), 0);

        let input = [0.5_f32; 64];
        let mut out = [1.0_f32; 64];
        let result = engine.process(&[&input[..]], &mut [&mut out[..]]);
        assert_eq!(result, Err(EngineError::NotPrepared));
        assert!(out.iter().all(|&s| s == 0.0));

        let mut buffer = [0.5_f32; 64];
        assert_eq!(
            engine.process_in_place(&mut [&mut buffer[..]]),
            Err(EngineError::NotPrepared)
        );
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_prepare_validation() {
        let (mut engine, _ctl) = create(EngineConfig::default()).unwrap();
        assert_eq!(engine.prepare(0.0, 512, 2), Err(EngineError::InvalidSampleRate(0.0)));
        assert_eq!(engine.prepare(SR, 0, 2), Err(EngineError::InvalidBlockSize(0)));
        assert!(matches!(
            engine.prepare(SR, 512, MAX_CHANNELS + 1),
            Err(EngineError::InvalidChannelCount { .. })
        ));
        assert!(!engine.is_prepared());
        assert!(engine.prepare(SR, 512, 2).is_ok());
        assert_eq!(engine.sample_rate(), Some(SR));
    }

    #[test]
    fn test_channel_and_length_mismatch() {
        let (mut engine, _ctl) = prepared(EngineConfig::default());
        let mono = [0.0_f32; 32];
        let mut out = [0.0_f32; 32];
        assert_eq!(
            engine.process(&[&mono[..]], &mut [&mut out[..]]),
            Err(EngineError::ChannelMismatch { expected: 2, got: 1 })
        );

        let short = [0.0_f32; 16];
        let mut out_l = [1.0_f32; 32];
        let mut out_r = [1.0_f32; 32];
        assert_eq!(
            engine.process(&[&mono[..], &short[..]], &mut [&mut out_l[..], &mut out_r[..]]),
            Err(EngineError::BlockLengthMismatch { input: 32, output: 16 })
        );
        assert!(out_l.iter().chain(out_r.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn test_in_place_mismatch_silences_buffer() {
        let (mut engine, _ctl) = prepared(EngineConfig::default());

        let mut mono = [0.5_f32; 32];
        assert_eq!(
            engine.process_in_place(&mut [&mut mono[..]]),
            Err(EngineError::ChannelMismatch { expected: 2, got: 1 })
        );
        assert!(mono.iter().all(|&s| s == 0.0));

        let mut left = [0.5_f32; 32];
        let mut right = [0.5_f32; 16];
        assert_eq!(
            engine.process_in_place(&mut [&mut left[..], &mut right[..]]),
            Err(EngineError::BlockLengthMismatch { input: 32, output: 16 })
        );
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn test_non_finite_input_is_absorbed() {
        let (mut engine, mut ctl) = prepared(EngineConfig::default());
        let mut block = sine(1000.0, 0.5, 480);
        block[100] = f32::NAN;
        block[200] = f32::INFINITY;

        let out = run(&mut engine, &stereo(block));
        assert!(out.iter().flatten().all(|s| s.is_finite()));
        assert!(ctl.meters().fault_count() >= 1);
        assert!(ctl.drain_faults() >= 1);

        // Later blocks are clean
        let out = run(&mut engine, &stereo(sine(1000.0, 0.5, 480)));
        assert!(out.iter().flatten().all(|s| s.is_finite()));
        assert_eq!(ctl.drain_faults(), 0);
    }

    #[test]
    fn test_output_trim_ramps() {
        let (mut engine, mut ctl) = create(EngineConfig::default()).unwrap();
        ctl.set_all_ratio(1.0).unwrap();
        engine.prepare(SR, 480, 2).unwrap();

        for _ in 0..100 {
            run(&mut engine, &stereo(vec![0.5; 480]));
        }
        ctl.set_output_trim(-12.0).unwrap();
        let out = run(&mut engine, &stereo(vec![0.5; 480]));

        assert!(out[0][0] > 0.45, "trim must ramp, first sample {}", out[0][0]);
        let expected = 0.5 * db_to_gain(-12.0);
        assert!(
            (out[0][479] - expected).abs() < 1e-3,
            "trim should arrive after 10 ms: {} vs {}",
            out[0][479],
            expected
        );
    }

    #[test]
    fn test_lookahead_sets_latency() {
        let config = EngineConfig {
            lookahead_ms: vec![0.0, 1.0, 0.0, 0.0],
            ..Default::default()
        };
        let (mut engine, _ctl) = prepared(config);
        assert_eq!(engine.latency_samples(), 48);

        let out = run(&mut engine, &stereo(vec![0.5; 480]));
        assert!(out[0][..48].iter().all(|&s| s == 0.0));
        assert!(out[0][48..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_large_blocks_are_chunked() {
        let signal = stereo(sine(440.0, 0.9, 1000));

        let (mut small, _c1) = create(EngineConfig::default()).unwrap();
        small.prepare(SR, 64, 2).unwrap();
        let (mut large, _c2) = create(EngineConfig::default()).unwrap();
        large.prepare(SR, 1000, 2).unwrap();

        let a = run(&mut small, &signal);
        let b = run(&mut large, &signal);
        for (x, y) in a[0].iter().zip(&b[0]) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_process_in_place_matches_process() {
        let signal = stereo(sine(2500.0, 0.8, 960));

        let (mut a, _c1) = prepared(EngineConfig::default());
        let expected = run(&mut a, &signal);

        let (mut b, _c2) = prepared(EngineConfig::default());
        let mut buffer = signal.clone();
        let mut refs: Vec<&mut [f32]> = buffer.iter_mut().map(|c| c.as_mut_slice()).collect();
        b.process_in_place(&mut refs).unwrap();
        assert_eq!(buffer, expected);
    }

    #[test]
    fn test_crossover_change_ramps_to_target() {
        let (mut engine, mut ctl) = prepared(EngineConfig::default());
        run(&mut engine, &stereo(vec![0.0; 480]));

        ctl.set_crossover(&[200.0, 1000.0, 5000.0]).unwrap();
        run(&mut engine, &stereo(sine(300.0, 0.5, 240)));
        {
            let state = engine.prepared.as_ref().unwrap();
            // Halfway through the 10 ms ramp
            assert!((state.applied_cutoffs[0] - 175.0).abs() < 0.5);
        }
        run(&mut engine, &stereo(sine(300.0, 0.5, 480)));
        let state = engine.prepared.as_ref().unwrap();
        assert_eq!(&state.applied_cutoffs[..3], &[200.0, 1000.0, 5000.0]);

        // Above Nyquist is rejected once the sample rate is known
        assert!(ctl.set_crossover(&[200.0, 1000.0, 30000.0]).is_err());
    }

    #[test]
    fn test_out_of_range_cutoff_is_clamped_at_prepare() {
        let (mut engine, mut ctl) = create(EngineConfig::default()).unwrap();
        ctl.set_crossover(&[150.0, 800.0, 21000.0]).unwrap();
        engine.prepare(32000.0, 256, 1).unwrap();
        let out = run(&mut engine, &[sine(1000.0, 0.5, 256)]);
        assert!(out[0].iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_reset_clears_state() {
        let (mut engine, ctl) = prepared(EngineConfig::default());
        run(&mut engine, &stereo(sine(1000.0, 1.0, 4800)));
        assert!(ctl.meters().gain_reduction_db(2) < 0.0);

        engine.reset();
        assert!(engine.prepared.as_ref().unwrap().is_silent());
        assert_eq!(ctl.meters().gain_reduction_db(2), 0.0);
    }

    #[test]
    fn test_two_band_engine() {
        let (mut engine, ctl) = prepared(EngineConfig::with_bands(2));
        assert_eq!(engine.band_count(), 2);
        assert_eq!(ctl.crossover().cutoffs_hz.len(), 1);
        let out = run(&mut engine, &stereo(sine(100.0, 1.0, 4800)));
        assert!(out[1].iter().all(|s| s.is_finite()));
    }
}
