//! Synthetic test signals run through a fresh engine

use anyhow::{ensure, Result};
use multicomp_core::{MulticompEngine, ParamController};

pub const SAMPLE_RATE: f64 = 48000.0;
pub const BLOCK_SIZE: usize = 480;

/// Meter readings after a steady tone
#[derive(Debug, Clone)]
pub struct ToneReport {
    pub frequency_hz: f32,
    pub gain_reduction_db: Vec<f32>,
    pub level_db: Vec<f32>,
    /// Left-channel peak of the last block
    pub output_peak: f32,
    pub faults: u64,
}

/// Feed `seconds` of a stereo sine and read the meters of the last block
pub fn steady_tone(
    engine: &mut MulticompEngine,
    controller: &mut ParamController,
    frequency_hz: f32,
    amplitude: f32,
    seconds: f32,
) -> Result<ToneReport> {
    ensure!(engine.is_prepared(), "engine must be prepared first");

    let total = (seconds as f64 * SAMPLE_RATE) as usize;
    let mut input = vec![0.0_f32; BLOCK_SIZE];
    let mut out_l = vec![0.0_f32; BLOCK_SIZE];
    let mut out_r = vec![0.0_f32; BLOCK_SIZE];
    let mut output_peak = 0.0_f32;

    let mut position = 0;
    while position < total {
        for (i, sample) in input.iter_mut().enumerate() {
            let t = (position + i) as f64 / SAMPLE_RATE;
            *sample = amplitude * (2.0 * std::f64::consts::PI * frequency_hz as f64 * t).sin() as f32;
        }
        engine.process(&[&input[..], &input[..]], &mut [&mut out_l[..], &mut out_r[..]])?;
        output_peak = out_l.iter().fold(0.0, |peak: f32, s| peak.max(s.abs()));
        position += BLOCK_SIZE;
    }

    let drained = controller.drain_faults();
    if drained > 0 {
        log::warn!("{} faults reported during the {} Hz tone", drained, frequency_hz);
    }

    let meters = controller.meters();
    Ok(ToneReport {
        frequency_hz,
        gain_reduction_db: meters.gain_reductions(),
        level_db: (0..meters.band_count()).map(|b| meters.level_db(b)).collect(),
        output_peak,
        faults: meters.fault_count(),
    })
}

/// Magnitude of the engine's impulse response at log-spaced frequencies
///
/// Only meaningful with every ratio at 1:1; the result is then the
/// crossover/aligner sum, which should be flat.
pub fn impulse_sweep(engine: &mut MulticompEngine, points: usize) -> Result<Vec<(f32, f32)>> {
    ensure!(engine.is_prepared(), "engine must be prepared first");
    ensure!(points >= 2, "need at least two sweep points");

    let len = 1 << 15;
    let mut response = vec![0.0_f32; len];
    response[0] = 1.0;
    // Engine must be prepared mono
    engine.process_in_place(&mut [&mut response[..]])?;

    let (lo, hi) = (20.0_f64, 20000.0_f64);
    Ok((0..points)
        .map(|i| {
            let freq = lo * (hi / lo).powf(i as f64 / (points - 1) as f64);
            let w = 2.0 * std::f64::consts::PI * freq / SAMPLE_RATE;
            let (re, im) = response.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, &x)| {
                let phase = w * n as f64;
                (re + x as f64 * phase.cos(), im - x as f64 * phase.sin())
            });
            let db = 20.0 * (re * re + im * im).sqrt().max(1e-12).log10();
            (freq as f32, db as f32)
        })
        .collect())
}
