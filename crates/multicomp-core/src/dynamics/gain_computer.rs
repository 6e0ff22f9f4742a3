//! Static compression curve
//!
//! Maps a detected level (dB) to gain reduction (dB, always <= 0). With knee
//! width `W` centered on threshold `T`:
//!
//! ```text
//! x <= T - W/2        0
//! x >= T + W/2        -(x - T)(1 - 1/R)
//! otherwise           -(1 - 1/R)(x - T + W/2)² / 2W
//! ```
//!
//! `W = 0` is a hard knee. The quadratic segment meets both straight
//! segments with matching value and slope.

/// Threshold / ratio / knee triple evaluated per sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    pub threshold_db: f32,
    pub ratio: f32,
    pub knee_db: f32,
}

impl GainComputer {
    pub fn new(threshold_db: f32, ratio: f32, knee_db: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            knee_db,
        }
    }

    /// Gain reduction in dB for a level in dB
    #[inline]
    pub fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let slope = 1.0 - 1.0 / self.ratio.max(1.0);
        let over = level_db - self.threshold_db;
        let half_knee = self.knee_db.max(0.0) * 0.5;

        if over <= -half_knee {
            0.0
        } else if over >= half_knee {
            -over * slope
        } else {
            let x = over + half_knee;
            -slope * x * x / (2.0 * self.knee_db)
        }
    }
}
