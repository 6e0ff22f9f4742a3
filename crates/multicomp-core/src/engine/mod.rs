//! Audio engine - real-time processing path
//!
//! The engine is owned by the audio thread and driven through `prepare`,
//! `process` and `reset`. It communicates with the control thread only
//! through lock-free structures:
//!
//! - parameters arrive as whole snapshots via a sequence-locked atomic array
//! - meters leave via per-band atomics ([`MeterHandle`])
//! - numerical faults leave via an `rtrb` ring drained by the controller

mod engine;
mod meters;
mod mix;

pub use engine::{create, MulticompEngine};
pub use meters::MeterHandle;
pub use mix::MixStage;
