//! Per-band dynamics processing
//!
//! Each band runs its own [`BandDynamics`]: a stereo-linked
//! [`EnvelopeDetector`] feeding a soft-knee [`GainComputer`], with
//! optional lookahead and makeup gain.

mod band;
mod envelope;
mod gain_computer;

pub use band::BandDynamics;
pub use envelope::{time_to_coefficient, DetectorMode, EnvelopeDetector};
pub use gain_computer::GainComputer;
