//! Parameter metadata for control surfaces
//!
//! Control surfaces drive rotary controls in normalized 0..1 space; this
//! module describes each parameter (name, unit, range, default) and maps
//! between normalized and actual values. Ranges follow the stock controls:
//! attack 1-100 ms, release 10-200 ms, threshold -60-0 dB, ratio 1-10.

/// Identifies one user-facing parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    Threshold,
    Ratio,
    Attack,
    Release,
    Knee,
    Makeup,
    /// Crossover frequency between band `n` and `n + 1`
    Crossover,
    OutputTrim,
}

impl ParamId {
    /// All parameter ids in display order
    pub const ALL: [ParamId; 8] = [
        ParamId::Threshold,
        ParamId::Ratio,
        ParamId::Attack,
        ParamId::Release,
        ParamId::Knee,
        ParamId::Makeup,
        ParamId::Crossover,
        ParamId::OutputTrim,
    ];

    /// Whether this parameter exists once per band
    pub fn is_per_band(&self) -> bool {
        !matches!(self, ParamId::Crossover | ParamId::OutputTrim)
    }

    /// Describe this parameter
    pub fn info(&self) -> ParamInfo {
        match self {
            ParamId::Threshold => ParamInfo::new("Threshold", -12.0)
                .with_range(-60.0, 0.0)
                .with_unit("dB"),
            ParamId::Ratio => ParamInfo::new("Ratio", 2.5)
                .with_range(1.0, 10.0)
                .with_unit(":1"),
            ParamId::Attack => ParamInfo::new("Attack", 20.0)
                .with_range(1.0, 100.0)
                .with_unit("ms"),
            ParamId::Release => ParamInfo::new("Release", 50.0)
                .with_range(10.0, 200.0)
                .with_unit("ms"),
            ParamId::Knee => ParamInfo::new("Knee", 0.0)
                .with_range(0.0, 24.0)
                .with_unit("dB"),
            ParamId::Makeup => ParamInfo::new("Makeup", 0.0)
                .with_range(-24.0, 24.0)
                .with_unit("dB"),
            ParamId::Crossover => ParamInfo::new("Crossover", 1000.0)
                .with_range(20.0, 20000.0)
                .with_unit("Hz")
                .logarithmic(),
            ParamId::OutputTrim => ParamInfo::new("Output", 0.0)
                .with_range(-24.0, 24.0)
                .with_unit("dB"),
        }
    }
}

/// Information about a parameter
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Parameter name for display
    pub name: String,
    /// Default value (actual units)
    pub default: f32,
    /// Minimum value
    pub min: f32,
    /// Maximum value
    pub max: f32,
    /// Unit label (e.g., "ms", "dB", "Hz")
    pub unit: String,
    /// Map normalized values exponentially (frequencies)
    pub logarithmic: bool,
}

impl Default for ParamInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            default: 0.5,
            min: 0.0,
            max: 1.0,
            unit: String::new(),
            logarithmic: false,
        }
    }
}

impl ParamInfo {
    /// Create a new parameter info with name and default value
    pub fn new(name: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            default,
            ..Default::default()
        }
    }

    /// Set the value range
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the unit label
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Use an exponential normalized mapping
    pub fn logarithmic(mut self) -> Self {
        self.logarithmic = true;
        self
    }

    /// Map a normalized 0..1 value to the actual range
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let t = normalized.clamp(0.0, 1.0);
        if self.logarithmic && self.min > 0.0 {
            self.min * (self.max / self.min).powf(t)
        } else {
            self.min + t * (self.max - self.min)
        }
    }

    /// Map an actual value to normalized 0..1
    pub fn normalize(&self, actual: f32) -> f32 {
        let v = actual.clamp(self.min, self.max);
        let t = if self.logarithmic && self.min > 0.0 {
            (v / self.min).ln() / (self.max / self.min).ln()
        } else {
            (v - self.min) / (self.max - self.min)
        };
        t.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_info() {
        let info = ParamId::Attack.info();
        assert_eq!(info.name, "Attack");
        assert_eq!(info.default, 20.0);
        assert_eq!((info.min, info.max), (1.0, 100.0));
        assert_eq!(info.unit, "ms");
        assert!(!info.logarithmic);
        assert!(ParamId::Crossover.info().logarithmic);
    }

    #[test]
    fn test_linear_mapping() {
        let info = ParamId::Threshold.info();
        assert_eq!(info.denormalize(0.5), -30.0);
        assert_eq!(info.denormalize(1.0), 0.0);
        assert_eq!(info.denormalize(0.0), -60.0);
        // Out of range input is clamped
        assert_eq!(info.denormalize(2.0), 0.0);
        assert_eq!(info.normalize(-45.0), 0.25);
        assert_eq!(info.normalize(12.0), 1.0);
    }

    #[test]
    fn test_logarithmic_mapping() {
        let info = ParamId::Crossover.info();
        assert!((info.denormalize(0.0) - 20.0).abs() < 1e-3);
        assert!((info.denormalize(1.0) - 20000.0).abs() < 1.0);
        // Geometric midpoint of 20 Hz..20 kHz
        assert!((info.denormalize(0.5) - 632.456).abs() < 0.5);

        let n = info.normalize(1000.0);
        assert!((info.denormalize(n) - 1000.0).abs() < 0.5);
    }

    #[test]
    fn test_defaults_inside_ranges() {
        for id in ParamId::ALL {
            let info = id.info();
            assert!(
                info.default >= info.min && info.default <= info.max,
                "{:?} default {} outside {}..{}",
                id,
                info.default,
                info.min,
                info.max
            );
        }
        assert!(ParamId::Ratio.is_per_band());
        assert!(!ParamId::OutputTrim.is_per_band());
    }
}
