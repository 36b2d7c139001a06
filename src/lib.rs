//! Placeholder classifier deciding whether a host needs optimization from its
//! CPU usage, memory usage and active connection count.
//!
//! The network is never trained. Its weights are random, so decisions are only
//! reproducible when an [`Analyzer`](analyzer::Analyzer) is built with a seed.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod nn;

pub use analyzer::analyze_metrics;
pub use error::{Error, Result};

// visible in prelude::*;
pub mod prelude {
  pub use crate::analyzer::{analyze_metrics, Analysis, Analyzer, AnalyzerBuilder};
  pub use crate::config::AnalyzerConfig;
  pub use crate::error::{Error, Result};
  pub use crate::metrics::Metrics;
  pub use crate::nn::{NN, Output};
}
