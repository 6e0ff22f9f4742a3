//! Multicomp Core - Multiband dynamics processor
//!
//! Splits audio into 2 to 8 bands with Linkwitz-Riley crossovers,
//! compresses each band independently and sums the result. With every ratio
//! at 1:1 the band sum reconstructs the input with a flat magnitude response.
//!
//! ```no_run
//! use multicomp_core::EngineConfig;
//!
//! let (mut engine, mut controller) = multicomp_core::create(EngineConfig::default())?;
//! controller.set_all_threshold(-18.0)?;
//! engine.prepare(48000.0, 512, 2)?;
//!
//! let (left, right) = (vec![0.0_f32; 512], vec![0.0_f32; 512]);
//! let (mut out_l, mut out_r) = (vec![0.0_f32; 512], vec![0.0_f32; 512]);
//! engine.process(&[&left[..], &right[..]], &mut [&mut out_l[..], &mut out_r[..]])?;
//!
//! println!("band 2 gain reduction: {} dB", controller.gain_reduction_db(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod crossover;
pub mod delay;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod params;
pub mod types;

pub use config::EngineConfig;
pub use dynamics::DetectorMode;
pub use engine::{create, MeterHandle, MulticompEngine};
pub use error::{ConfigError, EngineError, FaultEvent, FaultKind};
pub use params::{CrossoverSpec, DynamicsParams, ParamController, ParamId, ParamSet};
pub use types::*;
