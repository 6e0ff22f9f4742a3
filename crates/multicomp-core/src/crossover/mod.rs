//! Band splitting
//!
//! - [`CrossoverBank`]: sequential Linkwitz-Riley 24 dB/oct splitter
//! - [`BandAligner`]: phase and delay compensation so the band sum is flat
//! - [`svf`]: the Butterworth state-variable filter both are built from

mod aligner;
mod bank;
pub mod svf;

pub use aligner::BandAligner;
pub use bank::CrossoverBank;
pub use svf::{clamp_cutoff, SvfCoefficients, SvfFilter};
