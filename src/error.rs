use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Invalid input: {field} = {value} is not finite")]
  InvalidInput { field: &'static str, value: f64 },

  #[error("Shape mismatch: expected {expected} values, got {actual}")]
  ShapeMismatch { expected: usize, actual: usize },

  #[error("Invalid architecture: {0}")]
  InvalidArchitecture(String),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Configuration error: {0}")]
  Config(#[from] ::config::ConfigError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
