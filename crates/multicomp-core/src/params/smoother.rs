//! Linear parameter ramps
//!
//! Step changes in threshold, ratio or gain are audible as clicks. Every
//! externally set value is approached over a fixed number of samples instead.

/// Linear ramp from the current value to a target over a fixed sample count
#[derive(Debug, Clone, Copy)]
pub struct LinearSmoother {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
    ramp_len: u32,
}

impl LinearSmoother {
    /// Create a smoother resting at `value`
    pub fn new(value: f32, ramp_len: u32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
            ramp_len,
        }
    }

    /// Ramp length in samples for `ms` at `sample_rate`
    pub fn ramp_samples(ms: f32, sample_rate: f32) -> u32 {
        (ms / 1000.0 * sample_rate).round().max(0.0) as u32
    }

    /// Start ramping toward a new target
    ///
    /// Setting the same target again does not restart the ramp.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if self.ramp_len == 0 {
            self.current = target;
            self.remaining = 0;
        } else {
            self.remaining = self.ramp_len;
            self.step = (target - self.current) / self.ramp_len as f32;
        }
    }

    /// Jump to a value without ramping
    #[inline]
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    /// Advance `samples` samples at once (block-rate parameters)
    #[inline]
    pub fn skip(&mut self, samples: usize) {
        if self.remaining == 0 {
            return;
        }
        if samples as u64 >= self.remaining as u64 {
            self.current = self.target;
            self.remaining = 0;
        } else {
            self.remaining -= samples as u32;
            self.current += self.step * samples as f32;
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Whether a ramp is in progress
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.remaining > 0
    }
}
