//! Multicomp Probe - drive the compressor core from the command line
//!
//! Builds an engine, plays a steady full-scale sine through it and prints
//! per-band meters. With `--sweep` it also measures the unity-ratio
//! magnitude response of the crossover. See [`settings`] for the flags.

mod scenarios;
mod settings;

use anyhow::{Context, Result};

use scenarios::{impulse_sweep, steady_tone, BLOCK_SIZE, SAMPLE_RATE};
use settings::ProbeSettings;

fn main() -> Result<()> {
    // Set RUST_LOG=debug for parameter traces
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let settings = ProbeSettings::parse(std::env::args().skip(1))?;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Multicomp Probe                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let (mut engine, mut controller) =
        multicomp_core::create(settings.engine.clone()).context("Invalid engine config")?;
    settings.apply(&mut controller)?;
    engine.prepare(SAMPLE_RATE, BLOCK_SIZE, 2)?;

    println!(
        "{} bands, crossovers {:?} Hz, latency {} samples",
        engine.band_count(),
        controller.crossover().cutoffs_hz,
        engine.latency_samples()
    );

    let report = steady_tone(&mut engine, &mut controller, settings.tone_hz, 1.0, 1.0)?;
    println!();
    println!("{} Hz sine at 0 dBFS, after 1 s:", report.frequency_hz);
    for (band, (gr, level)) in report
        .gain_reduction_db
        .iter()
        .zip(&report.level_db)
        .enumerate()
    {
        println!("  band {}: level {:7.2} dBFS   GR {:6.2} dB", band, level, gr);
    }
    println!("  output peak {:.3}, faults {}", report.output_peak, report.faults);

    if settings.sweep {
        let (mut mono, mut mono_controller) = multicomp_core::create(settings.engine.clone())?;
        settings.apply(&mut mono_controller)?;
        mono_controller.set_all_ratio(1.0)?;
        mono.prepare(SAMPLE_RATE, 4096, 1)?;

        let sweep = impulse_sweep(&mut mono, 25)?;
        println!();
        println!("Band sum at 1:1:");
        for (freq, db) in &sweep {
            println!("  {:8.1} Hz  {:+.3} dB", freq, db);
        }
        let worst = sweep.iter().fold(0.0_f32, |worst, (_, db)| worst.max(db.abs()));
        if worst > 0.5 {
            log::warn!("Band sum deviates by {:.3} dB", worst);
        }
    }

    Ok(())
}
