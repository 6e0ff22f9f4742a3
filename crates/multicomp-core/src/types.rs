//! Common types for multicomp
//!
//! Fundamental audio types shared by every stage of the processor: the
//! planar multichannel buffer the engine pre-allocates at prepare time,
//! global limits, and decibel conversions.

/// Maximum number of frequency bands an engine can be built with
pub const MAX_BANDS: usize = 8;

/// Maximum number of crossover points (N-1 for N bands)
pub const MAX_CROSSOVERS: usize = MAX_BANDS - 1;

/// Minimum number of bands (one crossover point)
pub const MIN_BANDS: usize = 2;

/// Maximum channel count accepted by `prepare`
pub const MAX_CHANNELS: usize = 8;

/// Level floor used when converting to decibels (-240 dBFS)
pub const LEVEL_FLOOR: f32 = 1e-12;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// Convert decibels to a linear gain factor
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear level to decibels, floored at [`LEVEL_FLOOR`]
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(LEVEL_FLOOR).log10()
}

/// A planar multichannel buffer
///
/// Each channel is a separate contiguous `Vec`. Buffers are allocated once
/// with a fixed capacity; the working length is then adjusted per audio
/// callback with [`AudioBuffer::set_len_from_capacity`], which never
/// allocates.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<Sample>>,
    capacity: usize,
}

impl AudioBuffer {
    /// Create a buffer of `num_channels` channels filled with `len` samples of silence
    pub fn silence(num_channels: usize, len: usize) -> Self {
        Self {
            channels: (0..num_channels).map(|_| vec![0.0; len]).collect(),
            capacity: len,
        }
    }

    /// Create a buffer from separate channel slices
    pub fn from_channels(channels: &[&[Sample]]) -> Self {
        let len = channels.first().map(|c| c.len()).unwrap_or(0);
        assert!(
            channels.iter().all(|c| c.len() == len),
            "Channel lengths must match"
        );
        Self {
            channels: channels.iter().map(|c| c.to_vec()).collect(),
            capacity: len,
        }
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel in the working length
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated capacity per channel
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Panics in debug builds if `new_len > capacity`. Newly exposed samples
    /// are silence.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        debug_assert!(
            new_len <= self.capacity,
            "set_len_from_capacity called with len > capacity"
        );
        let new_len = new_len.min(self.capacity);
        for channel in &mut self.channels {
            if new_len > channel.len() {
                channel.resize(new_len, 0.0);
            } else {
                channel.truncate(new_len);
            }
        }
    }

    /// Fill every channel with silence
    pub fn fill_silence(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Get one channel
    #[inline]
    pub fn channel(&self, ch: usize) -> &[Sample] {
        &self.channels[ch]
    }

    /// Get one channel mutably
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [Sample] {
        &mut self.channels[ch]
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[Sample]> {
        self.channels.iter().map(|c| c.as_slice())
    }

    /// Iterate over channels mutably
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [Sample]> {
        self.channels.iter_mut().map(|c| c.as_mut_slice())
    }

    /// Peak absolute value of one frame across all channels
    #[inline]
    pub fn frame_peak(&self, index: usize) -> Sample {
        self.channels
            .iter()
            .fold(0.0, |peak, c| peak.max(c[index].abs()))
    }

    /// Add another buffer to this one (summing samples)
    pub fn add_buffer(&mut self, other: &AudioBuffer) {
        assert_eq!(self.len(), other.len(), "Buffer lengths must match");
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += *s;
            }
        }
    }

    /// Scale all samples by a factor
    pub fn scale(&mut self, factor: Sample) {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= factor;
            }
        }
    }

    /// Copy from channel slices, starting at `offset` in each source slice
    ///
    /// Copies `self.len()` samples per channel. Real-time safe.
    pub fn copy_from_slices<S: AsRef<[Sample]>>(&mut self, src: &[S], offset: usize) {
        let len = self.len();
        for (dst, s) in self.channels.iter_mut().zip(src.iter()) {
            dst.copy_from_slice(&s.as_ref()[offset..offset + len]);
        }
    }

    /// Copy into channel slices, starting at `offset` in each destination
    pub fn copy_to_slices<S: AsMut<[Sample]>>(&self, dst: &mut [S], offset: usize) {
        let len = self.len();
        for (src, d) in self.channels.iter().zip(dst.iter_mut()) {
            d.as_mut()[offset..offset + len].copy_from_slice(src);
        }
    }

    /// Replace non-finite samples with silence
    ///
    /// Returns the number of samples replaced.
    pub fn sanitize(&mut self) -> usize {
        let mut replaced = 0;
        for sample in self.channels.iter_mut().flatten() {
            if !sample.is_finite() {
                *sample = 0.0;
                replaced += 1;
            }
        }
        replaced
    }

    /// Whether every sample is finite
    pub fn is_finite(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.iter().all(|s| s.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversions() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0) - 0.501_187).abs() < 1e-4);
        assert!((gain_to_db(1.0)).abs() < 1e-6);
        assert!((gain_to_db(0.1) + 20.0).abs() < 1e-4);
        // Silence is floored instead of -inf
        assert!((gain_to_db(0.0) + 240.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_len_from_capacity() {
        let mut buf = AudioBuffer::silence(2, 64);
        buf.set_len_from_capacity(16);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.capacity(), 64);

        buf.channel_mut(0)[3] = 1.0;
        buf.set_len_from_capacity(64);
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.channel(0)[3], 1.0);
        assert_eq!(buf.channel(0)[40], 0.0);
    }

    #[test]
    fn test_add_and_scale() {
        let mut a = AudioBuffer::from_channels(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = AudioBuffer::from_channels(&[&[0.5, 0.5], &[-1.0, -1.0]]);
        a.add_buffer(&b);
        a.scale(2.0);
        assert_eq!(a.channel(0), &[3.0, 5.0]);
        assert_eq!(a.channel(1), &[4.0, 6.0]);
    }

    #[test]
    fn test_frame_peak_and_finite() {
        let mut buf = AudioBuffer::from_channels(&[&[0.25, -0.1], &[-0.75, 0.2]]);
        assert_eq!(buf.frame_peak(0), 0.75);
        assert_eq!(buf.frame_peak(1), 0.2);
        assert!(buf.is_finite());
        buf.channel_mut(1)[1] = f32::NAN;
        assert!(!buf.is_finite());
        assert_eq!(buf.sanitize(), 1);
        assert!(buf.is_finite());
        assert_eq!(buf.channel(1), &[-0.75, 0.0]);
    }

    #[test]
    fn test_copy_with_offset() {
        let left = [1.0_f32, 2.0, 3.0, 4.0];
        let right = [5.0_f32, 6.0, 7.0, 8.0];
        let mut buf = AudioBuffer::silence(2, 4);
        buf.set_len_from_capacity(2);
        buf.copy_from_slices(&[&left[..], &right[..]], 1);
        assert_eq!(buf.channel(0), &[2.0, 3.0]);

        let mut out = vec![vec![0.0_f32; 4], vec![0.0; 4]];
        buf.copy_to_slices(&mut out, 2);
        assert_eq!(out[1], vec![0.0, 0.0, 6.0, 7.0]);
    }
}
