use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::nn::{NN, Output};

use std::ops::Range;
use std::sync::Arc;

pub const INPUT_COUNT: usize = 3;
pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_HIDDEN_UNITS: usize = 10;
pub const MAX_HIDDEN_UNITS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Analysis {
  pub probability: f64,
  pub needs_optimization: bool
}

/// Untrained 3 -> hidden (ReLU) -> 1 (sigmoid) classifier. Weights are random
/// placeholders, so the decisions carry no information about the host.
#[derive(Debug, Clone)]
pub struct Analyzer {
  nn: NN,
  threshold: f64
}

impl Analyzer {
  pub fn new(config: &AnalyzerConfig) -> Result<Self> {
    config.validate()?;

    let arch = Arc::new(vec![INPUT_COUNT, config.hidden_units, 1]);
    let nn = match config.seed {
      Some(seed) => NN::new(arch, config.weight_range(), &mut StdRng::seed_from_u64(seed)),
      None => NN::new(arch, config.weight_range(), &mut rand::thread_rng())
    };
    debug!(
      hidden_units = config.hidden_units,
      seed = ?config.seed,
      threshold = config.threshold,
      "built placeholder network"
    );

    Ok(Analyzer {
      nn,
      threshold: config.threshold
    })
  }

  /// Wrap an existing network. It must take three inputs and produce one output.
  pub fn from_network(nn: NN, threshold: f64) -> Result<Self> {
    if nn.input_count != INPUT_COUNT {
      return Err(Error::ShapeMismatch { expected: INPUT_COUNT, actual: nn.input_count });
    }
    if nn.output_count() != 1 {
      return Err(Error::ShapeMismatch { expected: 1, actual: nn.output_count() });
    }
    if !(0.0..=1.0).contains(&threshold) {
      return Err(Error::InvalidConfig(format!("threshold {threshold} must lie within [0, 1]")));
    }

    Ok(Analyzer { nn, threshold })
  }

  fn placeholder<R: Rng + ?Sized>(range: Range<f64>, rng: &mut R) -> Self {
    let arch = Arc::new(vec![INPUT_COUNT, DEFAULT_HIDDEN_UNITS, 1]);

    Analyzer {
      nn: NN::new(arch, range, rng),
      threshold: DEFAULT_THRESHOLD
    }
  }

  #[inline]
  pub fn threshold(&self) -> f64 {
    self.threshold
  }

  #[inline]
  pub fn network(&self) -> &NN {
    &self.nn
  }

  pub fn probability(&self, metrics: &Metrics) -> Result<f64> {
    if let Err(e) = metrics.validate() {
      warn!(error = %e, "rejected metrics");
      return Err(e);
    }
    let probability = self.raw_probability(metrics.to_input())?;
    debug!(?metrics, probability, "scored metrics");

    Ok(probability)
  }

  pub fn needs_optimization(&self, metrics: &Metrics) -> Result<bool> {
    Ok(self.analyze(metrics)?.needs_optimization)
  }

  pub fn analyze(&self, metrics: &Metrics) -> Result<Analysis> {
    let probability = self.probability(metrics)?;

    Ok(Analysis {
      probability,
      needs_optimization: probability > self.threshold
    })
  }

  /// Scores every sample with the same weights. Output order follows input order;
  /// any invalid sample fails the whole batch.
  pub fn analyze_batch(&self, batch: &[Metrics]) -> Result<Vec<Analysis>> {
    let analyses = batch
      .par_iter()
      .map(|metrics| self.analyze(metrics))
      .collect::<Result<Vec<_>>>()?;

    let flagged = analyses
      .iter()
      .filter(|a| a.needs_optimization)
      .count();
    info!(samples = analyses.len(), flagged, "analyzed batch");

    Ok(analyses)
  }

  #[inline]
  fn raw_probability(&self, input: [f64; INPUT_COUNT]) -> Result<f64> {
    let output = self.nn.forward(input, Output::Sigmoid)?;
    Ok(output[0])
  }
}

/// Builds a fresh randomly weighted network for every call, so repeated calls
/// with the same values may disagree. Inputs are not validated; a NaN anywhere
/// yields `false`. Use [`Analyzer`] for reproducible, validated scoring.
pub fn analyze_metrics(cpu_usage: f64, memory_usage: f64, active_connections: f64) -> bool {
  let defaults = AnalyzerConfig::default();
  let analyzer = Analyzer::placeholder(defaults.weight_range(), &mut rand::thread_rng());

  analyzer
    .raw_probability([cpu_usage, memory_usage, active_connections])
    .map(|probability| probability > analyzer.threshold)
    .unwrap_or(false)
}

pub struct AnalyzerBuilder {
  config: AnalyzerConfig
}

impl AnalyzerBuilder {
  pub fn new() -> Self {
    AnalyzerBuilder {
      config: AnalyzerConfig::default()
    }
  }

  pub fn hidden_units(mut self, hidden_units: usize) -> Self {
    self.config.hidden_units = hidden_units;
    self
  }

  pub fn threshold(mut self, threshold: f64) -> Self {
    self.config.threshold = threshold;
    self
  }

  pub fn seed(mut self, seed: u64) -> Self {
    self.config.seed = Some(seed);
    self
  }

  pub fn weight_range(mut self, range: Range<f64>) -> Self {
    self.config.weight_min = range.start;
    self.config.weight_max = range.end;
    self
  }

  pub fn build(self) -> Result<Analyzer> {
    Analyzer::new(&self.config)
  }
}

impl Default for AnalyzerBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl From<AnalyzerConfig> for AnalyzerBuilder {
  fn from(config: AnalyzerConfig) -> Self {
    AnalyzerBuilder { config }
  }
}

#[cfg(test)]
mod test_analyzer {
  use super::*;

  fn zeroed(threshold: f64) -> Analyzer {
    let nn = NN::new_prefit(Arc::new(vec![3, 10, 1]), vec![0.0; 40], vec![0.0; 11]).unwrap();
    Analyzer::from_network(nn, threshold).unwrap()
  }

  #[test]
  fn test_analyzer_new() {
    let analyzer = Analyzer::new(&AnalyzerConfig::default()).unwrap();

    assert_eq!(*analyzer.network().architecture, vec![3, 10, 1]);
    assert_eq!(analyzer.network().weights.len(), 10*3 + 10);
    assert_eq!(analyzer.network().biases.len(), 10 + 1);
    assert_eq!(analyzer.threshold(), 0.5);
  }

  #[test]
  fn test_analyzer_new_invalid_config() {
    let config = AnalyzerConfig { hidden_units: 0, ..Default::default() };
    assert!(matches!(Analyzer::new(&config), Err(Error::InvalidConfig(_))));
  }

  #[test]
  fn test_analyzer_seeded_is_deterministic() {
    let metrics = Metrics::new(0.42, 0.77, 310.0);
    let a = AnalyzerBuilder::new().seed(1234).build().unwrap();
    let b = AnalyzerBuilder::new().seed(1234).build().unwrap();

    assert_eq!(a.network().weights, b.network().weights);
    assert_eq!(a.analyze(&metrics).unwrap(), b.analyze(&metrics).unwrap());
  }

  #[test]
  fn test_analyzer_probability_bounds() {
    let analyzer = AnalyzerBuilder::new()
      .seed(9)
      .weight_range(-1.0..1.0)
      .build()
      .unwrap();

    for metrics in [
      Metrics::new(0.0, 0.0, 0.0),
      Metrics::new(1.0, 1.0, 1.0),
      Metrics::new(-50.0, 3.0, 1e6),
      Metrics::new(99.0, 64.0, 25_000.0)
    ] {
      let p = analyzer.probability(&metrics).unwrap();
      assert!((0.0..=1.0).contains(&p), "probability {p} out of range");
    }
  }

  #[test]
  fn test_analyzer_default_weights_lean_positive() {
    // weights and biases in [0, 1) with non-negative inputs keep every pre-activation >= 0
    let analyzer = AnalyzerBuilder::new().seed(3).build().unwrap();
    let p = analyzer.probability(&Metrics::new(0.3, 0.6, 12.0)).unwrap();

    assert!(p >= 0.5);
  }

  #[test]
  fn test_analyzer_threshold_is_strict() {
    let analysis = zeroed(0.5).analyze(&Metrics::new(0.9, 0.9, 900.0)).unwrap();

    assert!((analysis.probability - 0.5).abs() < 1e-12);
    assert!(!analysis.needs_optimization);

    assert!(zeroed(0.25).needs_optimization(&Metrics::new(0.9, 0.9, 900.0)).unwrap());
  }

  #[test]
  fn test_analyzer_known_weights() {
    // hidden unit 0 copies cpu_usage, output = 4*h0 - 2
    let mut weights = vec![0.0; 40];
    weights[0] = 1.0;
    weights[30] = 4.0;
    let mut biases = vec![0.0; 11];
    biases[10] = -2.0;
    let nn = NN::new_prefit(Arc::new(vec![3, 10, 1]), weights, biases).unwrap();
    let analyzer = Analyzer::from_network(nn, 0.5).unwrap();

    assert!(!analyzer.needs_optimization(&Metrics::new(0.2, 0.9, 500.0)).unwrap());
    assert!(analyzer.needs_optimization(&Metrics::new(0.8, 0.1, 1.0)).unwrap());
  }

  #[test]
  fn test_analyzer_rejects_non_finite() {
    let analyzer = zeroed(0.5);

    let err = analyzer.analyze(&Metrics::new(f64::NAN, 0.1, 1.0)).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { field: "cpu_usage", .. }));
  }

  #[test]
  fn test_analyzer_from_network_shape() {
    let nn = NN::new_prefit(Arc::new(vec![2, 2, 1]), vec![0.0; 6], vec![0.0; 3]).unwrap();
    assert!(matches!(
      Analyzer::from_network(nn, 0.5),
      Err(Error::ShapeMismatch { expected: 3, actual: 2 })
    ));

    let nn = NN::new_prefit(Arc::new(vec![3, 2, 2]), vec![0.0; 10], vec![0.0; 4]).unwrap();
    assert!(matches!(
      Analyzer::from_network(nn, 0.5),
      Err(Error::ShapeMismatch { expected: 1, actual: 2 })
    ));

    let nn = NN::new_prefit(Arc::new(vec![3, 2, 1]), vec![0.0; 8], vec![0.0; 3]).unwrap();
    assert!(matches!(Analyzer::from_network(nn, 1.5), Err(Error::InvalidConfig(_))));
  }

  #[test]
  fn test_analyzer_batch() {
    let analyzer = AnalyzerBuilder::new().seed(77).build().unwrap();
    let batch: Vec<Metrics> = (0..64)
      .map(|i| Metrics::new(i as f64 / 64.0, 0.5, i as f64 * 10.0))
      .collect();

    let analyses = analyzer.analyze_batch(&batch).unwrap();

    assert_eq!(analyses.len(), batch.len());
    for (metrics, analysis) in batch.iter().zip(&analyses) {
      assert_eq!(*analysis, analyzer.analyze(metrics).unwrap());
    }
  }

  #[test]
  fn test_analyzer_batch_invalid_sample() {
    let analyzer = zeroed(0.5);
    let batch = [Metrics::new(0.1, 0.1, 1.0), Metrics::new(0.1, f64::INFINITY, 1.0)];

    assert!(matches!(
      analyzer.analyze_batch(&batch),
      Err(Error::InvalidInput { field: "memory_usage", .. })
    ));
    assert!(analyzer.analyze_batch(&[]).unwrap().is_empty());
  }

  #[test]
  fn test_analyze_metrics() {
    // only the shape of the answer is checkable with random weights
    let _: bool = analyze_metrics(0.85, 0.6, 140.0);
  }

  #[test]
  fn test_analyze_metrics_nan_is_false() {
    // fresh weights every call, so repeat to cover many draws
    for _ in 0..200 {
      assert!(!analyze_metrics(f64::NAN, 0.6, 140.0));
      assert!(!analyze_metrics(0.85, f64::NAN, 140.0));
      assert!(!analyze_metrics(0.85, 0.6, f64::NAN));
    }
  }

  #[test]
  fn test_placeholder_zero_range() {
    // a degenerate range pins every parameter, which makes the placeholder checkable
    let analyzer = Analyzer::placeholder(0.0..f64::MIN_POSITIVE, &mut StdRng::seed_from_u64(0));
    let p = analyzer.raw_probability([1.0, 1.0, 1.0]).unwrap();

    assert!((p - 0.5).abs() < 1e-9);
  }

  #[test]
  fn test_analyzerbuilder() {
    let builder = AnalyzerBuilder::new()
      .hidden_units(4)
      .threshold(0.7)
      .seed(5)
      .weight_range(-0.5..0.5);

    assert_eq!(builder.config.hidden_units, 4);
    assert_eq!(builder.config.threshold, 0.7);
    assert_eq!(builder.config.seed, Some(5));
    assert_eq!(builder.config.weight_range(), -0.5..0.5);

    let analyzer = builder.build().unwrap();
    assert_eq!(*analyzer.network().architecture, vec![3, 4, 1]);
    assert_eq!(analyzer.threshold(), 0.7);
  }
}
