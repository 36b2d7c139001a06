use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use std::path::Path;

/// One host snapshot. Units are whatever the caller feeds in; nothing is rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
  pub cpu_usage: f64,
  pub memory_usage: f64,
  pub active_connections: f64
}

impl Metrics {
  pub fn new(cpu_usage: f64, memory_usage: f64, active_connections: f64) -> Self {
    Metrics {
      cpu_usage,
      memory_usage,
      active_connections
    }
  }

  /// Network input order: cpu, memory, connections.
  #[inline]
  pub fn to_input(&self) -> [f64; 3] {
    [self.cpu_usage, self.memory_usage, self.active_connections]
  }

  pub fn validate(&self) -> Result<()> {
    let fields = [
      ("cpu_usage", self.cpu_usage),
      ("memory_usage", self.memory_usage),
      ("active_connections", self.active_connections)
    ];

    match fields.into_iter().find(|(_, value)| !value.is_finite()) {
      Some((field, value)) => Err(Error::InvalidInput { field, value }),
      None => Ok(())
    }
  }
}

/// Reads a JSON array of metrics objects.
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<Vec<Metrics>> {
  let content = std::fs::read_to_string(path)?;
  let batch = serde_json::from_str(&content)?;
  Ok(batch)
}

impl From<[f64; 3]> for Metrics {
  fn from([cpu_usage, memory_usage, active_connections]: [f64; 3]) -> Self {
    Metrics::new(cpu_usage, memory_usage, active_connections)
  }
}
