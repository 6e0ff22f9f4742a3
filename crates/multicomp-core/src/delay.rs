//! Integer-sample delay lines
//!
//! Used for per-band lookahead and for the latency side of band alignment:
//! bands with less lookahead are delayed so every band leaves the aligner
//! with the same total latency.

/// Ring-buffer delay for one channel
#[derive(Debug, Clone)]
struct ChannelDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl ChannelDelay {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            write_pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, delay: usize) -> f32 {
        self.buffer[self.write_pos] = input;

        // Read position trails the write position by `delay`
        let read_pos = if self.write_pos >= delay {
            self.write_pos - delay
        } else {
            self.buffer.len() - (delay - self.write_pos)
        };
        let output = self.buffer[read_pos];

        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Multichannel delay line with a fixed maximum, set once at prepare time
#[derive(Debug, Clone)]
pub struct DelayLine {
    channels: Vec<ChannelDelay>,
    delay_samples: usize,
}

impl DelayLine {
    /// Create a delay line able to delay up to `max_delay` samples
    pub fn new(num_channels: usize, max_delay: usize) -> Self {
        Self {
            channels: (0..num_channels)
                .map(|_| ChannelDelay::new(max_delay + 1))
                .collect(),
            delay_samples: 0,
        }
    }

    /// Set the delay amount in samples
    ///
    /// Clamped to the maximum the line was created with.
    pub fn set_delay(&mut self, samples: usize) {
        let max = self.max_delay();
        if samples > max {
            log::warn!(
                "Delay of {} samples exceeds delay line size {}, clamping",
                samples,
                max
            );
        }
        self.delay_samples = samples.min(max);
    }

    /// Current delay in samples
    pub fn delay(&self) -> usize {
        self.delay_samples
    }

    /// Largest delay this line supports
    pub fn max_delay(&self) -> usize {
        self.channels
            .first()
            .map(|c| c.buffer.len() - 1)
            .unwrap_or(0)
    }

    /// Process one sample of one channel
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        self.channels[channel].process(input, self.delay_samples)
    }

    /// Delay a whole channel slice in place
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32]) {
        if self.delay_samples == 0 {
            return;
        }
        let delay = self.delay_samples;
        let line = &mut self.channels[channel];
        for sample in samples.iter_mut() {
            *sample = line.process(*sample, delay);
        }
    }

    /// Fill with silence
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
    }

    /// Whether every stored sample is finite
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.buffer.iter().all(|s| s.is_finite()))
    }

    /// Whether every stored sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.buffer.iter().all(|&s| s == 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_line() {
        let mut delay = DelayLine::new(1, 10);
        delay.set_delay(3);

        // First 3 samples output silence while the line fills
        assert_eq!(delay.process_sample(0, 1.0), 0.0);
        assert_eq!(delay.process_sample(0, 2.0), 0.0);
        assert_eq!(delay.process_sample(0, 3.0), 0.0);

        assert_eq!(delay.process_sample(0, 4.0), 1.0);
        assert_eq!(delay.process_sample(0, 5.0), 2.0);
    }

    #[test]
    fn test_zero_delay_is_passthrough() {
        let mut delay = DelayLine::new(2, 0);
        assert_eq!(delay.max_delay(), 0);
        assert_eq!(delay.process_sample(0, 0.5), 0.5);
        assert_eq!(delay.process_sample(1, -0.25), -0.25);

        let mut block = [1.0, 2.0, 3.0];
        delay.process_channel(0, &mut block);
        assert_eq!(block, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut delay = DelayLine::new(2, 4);
        delay.set_delay(2);
        let mut left = [1.0, 0.0, 0.0, 0.0];
        let mut right = [0.0, 0.0, 0.0, 0.0];
        delay.process_channel(0, &mut left);
        delay.process_channel(1, &mut right);
        assert_eq!(left, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(right, [0.0; 4]);
    }

    #[test]
    fn test_delay_is_clamped() {
        let mut delay = DelayLine::new(1, 8);
        delay.set_delay(100);
        assert_eq!(delay.delay(), 8);
    }

    #[test]
    fn test_clear() {
        let mut delay = DelayLine::new(1, 4);
        delay.set_delay(2);
        delay.process_sample(0, 1.0);
        assert!(!delay.is_silent());
        delay.clear();
        assert!(delay.is_silent());
    }
}
