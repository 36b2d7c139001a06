use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::analyzer::{DEFAULT_HIDDEN_UNITS, DEFAULT_THRESHOLD, MAX_HIDDEN_UNITS};
use crate::error::{Error, Result};

use std::ops::Range;
use std::path::Path;

pub const CONFIG_FILE: &str = "optnet.toml";
pub const ENV_PREFIX: &str = "OPTNET";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzerConfig {
  /// Width of the single ReLU hidden layer
  pub hidden_units: usize,
  /// A sample needs optimization when its probability is strictly above this
  pub threshold: f64,
  /// Unset means fresh thread-local randomness
  #[serde(default)]
  pub seed: Option<u64>,
  pub weight_min: f64,
  pub weight_max: f64
}

impl Default for AnalyzerConfig {
  fn default() -> Self {
    AnalyzerConfig {
      hidden_units: DEFAULT_HIDDEN_UNITS,
      threshold: DEFAULT_THRESHOLD,
      seed: None,
      weight_min: 0.0,
      weight_max: 1.0
    }
  }
}

impl AnalyzerConfig {
  /// Defaults, then `<config_dir>/optnet.toml` if present, then `OPTNET__*` env vars.
  pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
    let defaults = Self::default();

    let config: Self = Config::builder()
      .set_default("hidden_units", defaults.hidden_units as i64)?
      .set_default("threshold", defaults.threshold)?
      .set_default("weight_min", defaults.weight_min)?
      .set_default("weight_max", defaults.weight_max)?
      .add_source(File::from(config_dir.as_ref().join(CONFIG_FILE)).required(false))
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .separator("__")
          .try_parsing(true)
      )
      .build()?
      .try_deserialize()?;

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if !(1..=MAX_HIDDEN_UNITS).contains(&self.hidden_units) {
      return Err(Error::InvalidConfig(format!(
        "hidden_units {} must lie within [1, {MAX_HIDDEN_UNITS}]",
        self.hidden_units
      )));
    }
    if !(0.0..=1.0).contains(&self.threshold) {
      return Err(Error::InvalidConfig(format!(
        "threshold {} must lie within [0, 1]",
        self.threshold
      )));
    }
    if !self.weight_min.is_finite() || !self.weight_max.is_finite() {
      return Err(Error::InvalidConfig("weight range must be finite".to_string()));
    }
    // Uniform needs the span itself to be finite
    if !(self.weight_max - self.weight_min).is_finite() {
      return Err(Error::InvalidConfig(format!(
        "weight range {}..{} is too wide",
        self.weight_min,
        self.weight_max
      )));
    }
    if self.weight_min >= self.weight_max {
      return Err(Error::InvalidConfig(format!(
        "weight_min {} must be below weight_max {}",
        self.weight_min,
        self.weight_max
      )));
    }
    Ok(())
  }

  #[inline]
  pub fn weight_range(&self) -> Range<f64> {
    self.weight_min..self.weight_max
  }
}
