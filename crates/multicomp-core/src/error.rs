//! Error types for configuration and engine preconditions
//!
//! Only configuration-time and precondition errors are ever returned to the
//! caller. Numerical faults inside `process` are absorbed (the block is
//! silenced and state flushed) and reported as [`FaultEvent`]s instead.

use thiserror::Error;

/// A rejected configuration or parameter change
///
/// Setters that return this error leave the previous configuration intact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Ratio below 1:1 would be expansion
    #[error("Ratio must be >= 1.0, got {0}")]
    InvalidRatio(f32),

    /// Attack time must be strictly positive
    #[error("Attack time must be > 0 ms, got {0}")]
    InvalidAttack(f32),

    /// Release time must be strictly positive
    #[error("Release time must be > 0 ms, got {0}")]
    InvalidRelease(f32),

    /// Knee width must not be negative
    #[error("Knee width must be >= 0 dB, got {0}")]
    InvalidKnee(f32),

    /// NaN or infinite value supplied for a parameter
    #[error("Parameter '{0}' must be finite")]
    NonFinite(&'static str),

    /// Band index outside 0..band_count
    #[error("Band index {index} out of range (band count {count})")]
    BandIndexOutOfRange { index: usize, count: usize },

    /// Band count outside the supported range
    #[error("Band count must be within {min}..={max}, got {got}")]
    InvalidBandCount { got: usize, min: usize, max: usize },

    /// Crossover list length does not match band_count - 1
    #[error("Expected {expected} crossover frequencies, got {got}")]
    CutoffCountMismatch { expected: usize, got: usize },

    /// Cutoff not inside (0, nyquist)
    #[error("Crossover {index} at {freq} Hz is outside (0, {nyquist}) Hz")]
    CutoffOutOfRange { index: usize, freq: f32, nyquist: f32 },

    /// Cutoffs must be strictly increasing
    #[error("Crossover {index} ({freq} Hz) is not above the previous crossover")]
    CutoffsNotIncreasing { index: usize, freq: f32 },

    /// Neighbouring cutoffs closer than the minimum separation
    #[error("Crossovers {index} and {next} are {separation} Hz apart (minimum {min} Hz)")]
    CutoffsTooClose {
        index: usize,
        next: usize,
        separation: f32,
        min: f32,
    },

    /// Lookahead list length does not match the band count
    #[error("Expected {expected} lookahead values, got {got}")]
    LookaheadCountMismatch { expected: usize, got: usize },

    /// Lookahead outside the supported range
    #[error("Lookahead for band {band} must be within 0..={max} ms, got {got}")]
    InvalidLookahead { band: usize, got: f32, max: f32 },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Precondition violations reported by the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// `process` was called before `prepare`
    #[error("Engine used before prepare()")]
    NotPrepared,

    /// Sample rate must be finite and positive
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Maximum block size must be at least one sample
    #[error("Invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// Channel count outside 1..=MAX_CHANNELS
    #[error("Invalid channel count: {got} (supported 1..={max})")]
    InvalidChannelCount { got: usize, max: usize },

    /// Block channel count differs from the prepared channel count
    #[error("Channel count mismatch: prepared {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    /// Input and output channels have different lengths
    #[error("Block length mismatch: input {input} samples, output {output} samples")]
    BlockLengthMismatch { input: usize, output: usize },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// What kind of numerical fault the audio path absorbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Non-finite samples in the input block (replaced with silence)
    NonFiniteInput,
    /// Crossover or aligner filter state went non-finite (flushed)
    FilterState,
    /// Envelope detector state went non-finite (flushed)
    DetectorState,
    /// Non-finite output after mixing (block silenced)
    NonFiniteOutput,
}

/// A numerical fault reported from the audio path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultEvent {
    pub kind: FaultKind,
    /// Band the fault was detected in, if it is band-specific
    pub band: Option<usize>,
}

impl std::fmt::Display for FaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.band {
            Some(band) => write!(f, "{:?} in band {}", self.kind, band),
            None => write!(f, "{:?}", self.kind),
        }
    }
}
