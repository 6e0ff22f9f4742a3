//! Control-path parameter handle
//!
//! `ParamController` is the only writer of the shared parameter state. Every
//! setter validates the candidate change against a copy of the current set,
//! and only a fully valid set is committed and published; a rejected change
//! leaves both the authoritative copy and the audio thread untouched.

use std::sync::Arc;

use super::{
    validate_cutoffs, CrossoverSpec, DynamicsParams, ParamId, ParamSet, SharedParams,
};
use crate::engine::MeterHandle;
use crate::error::{ConfigError, ConfigResult, FaultEvent};

/// Owned by the control thread; validates, stores and publishes parameters
pub struct ParamController {
    params: ParamSet,
    shared: Arc<SharedParams>,
    meters: MeterHandle,
    faults: rtrb::Consumer<FaultEvent>,
}

impl ParamController {
    pub(crate) fn new(
        params: ParamSet,
        shared: Arc<SharedParams>,
        meters: MeterHandle,
        faults: rtrb::Consumer<FaultEvent>,
    ) -> Self {
        Self {
            params,
            shared,
            meters,
            faults,
        }
    }

    /// Number of bands the engine was built with
    pub fn band_count(&self) -> usize {
        self.params.band_count()
    }

    /// The authoritative parameter set
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Dynamics settings of one band
    pub fn band_params(&self, band: usize) -> Option<DynamicsParams> {
        self.params.bands().get(band).copied()
    }

    /// Replace the dynamics settings of one band
    pub fn set_band_params(&mut self, band: usize, params: DynamicsParams) -> ConfigResult<()> {
        self.check_band(band)?;
        params.validate().inspect_err(|e| Self::log_rejected("band params", e))?;

        let mut next = self.params;
        next.bands[band] = params;
        log::debug!("Band {} params: {:?}", band, params);
        self.commit(next);
        Ok(())
    }

    /// Replace all crossover frequencies (N-1 values, strictly increasing)
    pub fn set_crossover(&mut self, cutoffs_hz: &[f32]) -> ConfigResult<()> {
        validate_cutoffs(cutoffs_hz, self.band_count(), self.shared.sample_rate())
            .inspect_err(|e| Self::log_rejected("crossover", e))?;

        let mut next = self.params;
        next.cutoffs_hz[..cutoffs_hz.len()].copy_from_slice(cutoffs_hz);
        log::debug!("Crossovers: {:?} Hz", cutoffs_hz);
        self.commit(next);
        Ok(())
    }

    /// Replace all crossover frequencies from a spec
    pub fn set_crossover_spec(&mut self, spec: &CrossoverSpec) -> ConfigResult<()> {
        self.set_crossover(&spec.cutoffs_hz)
    }

    /// Current crossover frequencies
    pub fn crossover(&self) -> CrossoverSpec {
        self.params.crossover_spec()
    }

    /// Set the global output trim in dB
    pub fn set_output_trim(&mut self, db: f32) -> ConfigResult<()> {
        if !db.is_finite() {
            let e = ConfigError::NonFinite("output_trim_db");
            Self::log_rejected("output trim", &e);
            return Err(e);
        }
        let mut next = self.params;
        next.output_trim_db = db;
        self.commit(next);
        Ok(())
    }

    /// Current output trim in dB
    pub fn output_trim_db(&self) -> f32 {
        self.params.output_trim_db
    }

    /// Set the threshold of every band
    pub fn set_all_threshold(&mut self, threshold_db: f32) -> ConfigResult<()> {
        self.update_all_bands(|p| p.threshold_db = threshold_db)
    }

    /// Set the ratio of every band
    pub fn set_all_ratio(&mut self, ratio: f32) -> ConfigResult<()> {
        self.update_all_bands(|p| p.ratio = ratio)
    }

    /// Set the attack time of every band
    pub fn set_all_attack(&mut self, attack_ms: f32) -> ConfigResult<()> {
        self.update_all_bands(|p| p.attack_ms = attack_ms)
    }

    /// Set the release time of every band
    pub fn set_all_release(&mut self, release_ms: f32) -> ConfigResult<()> {
        self.update_all_bands(|p| p.release_ms = release_ms)
    }

    /// Set a parameter from a normalized 0..1 control value
    ///
    /// `index` is the band for per-band parameters and the crossover index
    /// for [`ParamId::Crossover`]; it is ignored for [`ParamId::OutputTrim`].
    pub fn set_normalized(&mut self, id: ParamId, index: usize, normalized: f32) -> ConfigResult<()> {
        let value = id.info().denormalize(normalized);
        let set_field: fn(&mut DynamicsParams, f32) = match id {
            ParamId::OutputTrim => return self.set_output_trim(value),
            ParamId::Crossover => {
                let count = self.band_count() - 1;
                if index >= count {
                    return Err(ConfigError::BandIndexOutOfRange { index, count });
                }
                let mut cutoffs = self.params.cutoffs_hz;
                cutoffs[index] = value;
                return self.set_crossover(&cutoffs[..count]);
            }
            ParamId::Threshold => |p: &mut DynamicsParams, v: f32| p.threshold_db = v,
            ParamId::Ratio => |p: &mut DynamicsParams, v: f32| p.ratio = v,
            ParamId::Attack => |p: &mut DynamicsParams, v: f32| p.attack_ms = v,
            ParamId::Release => |p: &mut DynamicsParams, v: f32| p.release_ms = v,
            ParamId::Knee => |p: &mut DynamicsParams, v: f32| p.knee_db = v,
            ParamId::Makeup => |p: &mut DynamicsParams, v: f32| p.makeup_db = v,
        };
        self.check_band(index)?;
        let mut p = self.params.bands[index];
        set_field(&mut p, value);
        self.set_band_params(index, p)
    }

    /// Latest gain reduction of a band in dB (<= 0)
    pub fn gain_reduction_db(&self, band: usize) -> f32 {
        self.meters.gain_reduction_db(band)
    }

    /// Cloneable meter reader for other threads
    pub fn meters(&self) -> MeterHandle {
        self.meters.clone()
    }

    /// Drain numerical fault events reported by the audio thread
    ///
    /// Each event is logged; returns how many were drained.
    pub fn drain_faults(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.faults.pop() {
            log::warn!("Audio path absorbed numerical fault: {}", event);
            drained += 1;
        }
        drained
    }

    fn update_all_bands(&mut self, update: impl Fn(&mut DynamicsParams)) -> ConfigResult<()> {
        let mut next = self.params;
        let band_count = next.band_count();
        for band in next.bands[..band_count].iter_mut() {
            update(band);
            band.validate()
                .inspect_err(|e| Self::log_rejected("all-band update", e))?;
        }
        self.commit(next);
        Ok(())
    }

    fn check_band(&self, band: usize) -> ConfigResult<()> {
        if band >= self.band_count() {
            return Err(ConfigError::BandIndexOutOfRange {
                index: band,
                count: self.band_count(),
            });
        }
        Ok(())
    }

    fn commit(&mut self, next: ParamSet) {
        if next != self.params {
            self.params = next;
            self.shared.publish(&self.params);
        }
    }

    fn log_rejected(what: &str, error: &ConfigError) {
        log::warn!("Rejected {}: {}", what, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn controller() -> ParamController {
        let (_engine, controller) = crate::create(EngineConfig::default()).unwrap();
        controller
    }

    #[test]
    fn test_set_band_params() {
        let mut ctl = controller();
        let p = DynamicsParams {
            threshold_db: -20.0,
            ratio: 6.0,
            ..Default::default()
        };
        assert!(ctl.set_band_params(1, p).is_ok());
        assert_eq!(ctl.band_params(1), Some(p));
    }

    #[test]
    fn test_invalid_band_params_keep_previous() {
        let mut ctl = controller();
        let before = *ctl.params();

        let bad = DynamicsParams { ratio: 0.9, ..Default::default() };
        assert_eq!(ctl.set_band_params(0, bad), Err(ConfigError::InvalidRatio(0.9)));
        assert_eq!(ctl.params(), &before);

        assert!(matches!(
            ctl.set_band_params(7, DynamicsParams::default()),
            Err(ConfigError::BandIndexOutOfRange { index: 7, count: 4 })
        ));
    }

    #[test]
    fn test_close_cutoffs_rejected_and_state_unchanged() {
        let mut ctl = controller();
        assert!(ctl.set_crossover(&[200.0, 1000.0, 5000.0]).is_ok());
        let before = *ctl.params();

        let result = ctl.set_crossover(&[200.0, 210.0, 5000.0]);
        assert!(matches!(result, Err(ConfigError::CutoffsTooClose { .. })));
        assert_eq!(ctl.params(), &before);
        assert_eq!(ctl.crossover().cutoffs_hz, vec![200.0, 1000.0, 5000.0]);
    }

    #[test]
    fn test_all_band_setters_are_atomic() {
        let mut ctl = controller();
        assert!(ctl.set_all_ratio(3.0).is_ok());
        assert!(ctl.params().bands().iter().all(|b| b.ratio == 3.0));

        let before = *ctl.params();
        assert!(ctl.set_all_attack(0.0).is_err());
        assert_eq!(ctl.params(), &before);

        assert!(ctl.set_all_threshold(-30.0).is_ok());
        assert!(ctl.set_all_release(120.0).is_ok());
        assert!(ctl
            .params()
            .bands()
            .iter()
            .all(|b| b.threshold_db == -30.0 && b.release_ms == 120.0));
    }

    #[test]
    fn test_output_trim() {
        let mut ctl = controller();
        assert!(ctl.set_output_trim(-3.5).is_ok());
        assert_eq!(ctl.output_trim_db(), -3.5);
        assert!(ctl.set_output_trim(f32::INFINITY).is_err());
        assert_eq!(ctl.output_trim_db(), -3.5);
    }

    #[test]
    fn test_set_normalized() {
        let mut ctl = controller();
        assert!(ctl.set_normalized(ParamId::Threshold, 2, 0.5).is_ok());
        assert_eq!(ctl.params().bands[2].threshold_db, -30.0);

        assert!(ctl.set_normalized(ParamId::Ratio, 0, 0.0).is_ok());
        assert_eq!(ctl.params().bands[0].ratio, 1.0);

        assert!(ctl.set_normalized(ParamId::Makeup, 3, 0.75).is_ok());
        assert_eq!(ctl.params().bands[3].makeup_db, 12.0);
        assert!(ctl.set_normalized(ParamId::Knee, 4, 0.5).is_err());

        assert!(ctl.set_normalized(ParamId::OutputTrim, 99, 0.25).is_ok());
        assert_eq!(ctl.output_trim_db(), -12.0);

        // Crossover 1 moved far below crossover 0 is rejected
        assert!(ctl.set_normalized(ParamId::Crossover, 1, 0.0).is_err());
        assert!(ctl.set_normalized(ParamId::Crossover, 5, 0.5).is_err());
    }

    #[test]
    fn test_drain_faults_empty() {
        let mut ctl = controller();
        assert_eq!(ctl.drain_faults(), 0);
    }
}
