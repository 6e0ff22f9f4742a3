//! Band summing and output trim

use crate::params::LinearSmoother;
use crate::types::{db_to_gain, AudioBuffer};

/// Sums the processed bands and applies the global output trim
pub struct MixStage {
    /// Output trim as a linear factor, ramped per sample
    trim: LinearSmoother,
}

impl MixStage {
    pub fn new(trim_db: f32, ramp_len: u32) -> Self {
        Self {
            trim: LinearSmoother::new(db_to_gain(trim_db), ramp_len),
        }
    }

    /// Ramp toward a new trim
    pub fn set_trim_db(&mut self, trim_db: f32) {
        self.trim.set_target(db_to_gain(trim_db));
    }

    /// Jump to a trim without ramping
    pub fn jump_to_trim_db(&mut self, trim_db: f32) {
        self.trim.reset(db_to_gain(trim_db));
    }

    /// Sum `bands` into `out` and apply the trim
    pub fn sum_into(&mut self, bands: &[AudioBuffer], out: &mut AudioBuffer) {
        out.fill_silence();
        for band in bands {
            out.add_buffer(band);
        }

        if !self.trim.is_smoothing() {
            let gain = self.trim.value();
            if gain != 1.0 {
                out.scale(gain);
            }
            return;
        }

        for i in 0..out.len() {
            let gain = self.trim.next();
            for channel in out.channels_mut() {
                channel[i] *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_bands() {
        let mut mix = MixStage::new(0.0, 0);
        let bands = vec![
            AudioBuffer::from_channels(&[&[0.25, 0.5]]),
            AudioBuffer::from_channels(&[&[0.25, -0.5]]),
        ];
        let mut out = AudioBuffer::silence(1, 2);
        mix.sum_into(&bands, &mut out);
        assert_eq!(out.channel(0), &[0.5, 0.0]);
    }

    #[test]
    fn test_trim_ramps_per_sample() {
        let mut mix = MixStage::new(0.0, 4);
        mix.set_trim_db(-6.0);
        let bands = vec![AudioBuffer::from_channels(&[&[1.0; 6]])];
        let mut out = AudioBuffer::silence(1, 6);
        mix.sum_into(&bands, &mut out);

        let target = db_to_gain(-6.0);
        let ch = out.channel(0);
        assert!(ch[0] < 1.0 && ch[0] > target);
        assert!(ch[1] < ch[0]);
        assert_eq!(ch[3], target);
        assert_eq!(ch[5], target);
    }
}
