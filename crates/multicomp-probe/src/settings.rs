//! Command line settings
//!
//! ## Flags
//!
//! - `--bands <n>`: band count (default 4)
//! - `--rms`: RMS instead of peak detection
//! - `--lookahead <ms>`: same lookahead on every band
//! - `--ratio <r>` / `--threshold <db>`: override every band
//! - `--tone <hz>`: test tone frequency (default 1000)
//! - `--sweep`: print the band-sum magnitude response

use anyhow::{bail, Context, Result};
use multicomp_core::{DetectorMode, EngineConfig, ParamController};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub engine: EngineConfig,
    pub ratio: Option<f32>,
    pub threshold_db: Option<f32>,
    pub tone_hz: f32,
    pub sweep: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            ratio: None,
            threshold_db: None,
            tone_hz: 1000.0,
            sweep: false,
        }
    }
}

impl ProbeSettings {
    /// Parse flags (without the program name)
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut settings = Self::default();
        let mut lookahead_ms = None;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--bands" => settings.engine.band_count = parse_value(&mut iter, &arg)?,
                "--rms" => settings.engine.detector = DetectorMode::Rms,
                "--lookahead" => lookahead_ms = Some(parse_value::<f32>(&mut iter, &arg)?),
                "--ratio" => settings.ratio = Some(parse_value(&mut iter, &arg)?),
                "--threshold" => settings.threshold_db = Some(parse_value(&mut iter, &arg)?),
                "--tone" => settings.tone_hz = parse_value(&mut iter, &arg)?,
                "--sweep" => settings.sweep = true,
                other => bail!("Unknown argument: {}", other),
            }
        }

        if let Some(ms) = lookahead_ms {
            settings.engine.lookahead_ms = vec![ms; settings.engine.band_count];
        }
        Ok(settings)
    }

    /// Push the overrides through a controller
    pub fn apply(&self, controller: &mut ParamController) -> Result<()> {
        if let Some(ratio) = self.ratio {
            controller.set_all_ratio(ratio).context("Invalid ratio")?;
        }
        if let Some(threshold_db) = self.threshold_db {
            controller
                .set_all_threshold(threshold_db)
                .context("Invalid threshold")?;
        }
        Ok(())
    }
}

fn parse_value<T>(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = iter
        .next()
        .with_context(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", flag, value))
}
