use rand::distributions::Uniform;
use rand::Rng;

use crate::error::{Error, Result};

use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
  Sigmoid,
  None
}

#[derive(Debug, Clone)]
pub struct NN {
  // input is 1x3, h1-w is 10x3 (*input is 1x10), output-w is 1x10 (*h1-w is 1x1)
  pub architecture: Arc<Vec<usize>>, // [3, 10, 1]
  pub input_count: usize, // == architecture[0]

  // (curr, prev)
  pub weights_dimensions: Vec<(usize, usize)>, // [(10, 3), (1, 10)]
  pub weights: Vec<f64>, // all weights in network

  pub biases_dimensions: Vec<(usize, usize)>, // [(10, 1), (1, 1)]
  pub biases: Vec<f64> // all biases in network
}

impl NN {
  /// Every weight and bias is drawn uniformly from `range`.
  pub fn new<R: Rng + ?Sized>(arch: Arc<Vec<usize>>, range: Range<f64>, rng: &mut R) -> Self {
    let (weights_dimensions, biases_dimensions) = Self::dimensions(&arch);

    let dist = Uniform::from(range);
    let weights = (0..Self::count(&weights_dimensions))
      .map(|_| rng.sample(&dist))
      .collect();
    let biases = (0..Self::count(&biases_dimensions))
      .map(|_| rng.sample(&dist))
      .collect();

    NN {
      input_count: arch[0],
      architecture: arch,
      weights_dimensions,
      weights,
      biases_dimensions,
      biases
    }
  }

  /// Build a network from known parameters, laid out the same way `new` lays them out.
  pub fn new_prefit(arch: Arc<Vec<usize>>, weights: Vec<f64>, biases: Vec<f64>) -> Result<Self> {
    Self::check_architecture(&arch)?;
    let (weights_dimensions, biases_dimensions) = Self::dimensions(&arch);

    let weights_count = Self::count(&weights_dimensions);
    if weights.len() != weights_count {
      return Err(Error::ShapeMismatch { expected: weights_count, actual: weights.len() });
    }
    let biases_count = Self::count(&biases_dimensions);
    if biases.len() != biases_count {
      return Err(Error::ShapeMismatch { expected: biases_count, actual: biases.len() });
    }

    Ok(NN {
      input_count: arch[0],
      architecture: arch,
      weights_dimensions,
      weights,
      biases_dimensions,
      biases
    })
  }

  pub fn forward<A: AsRef<[f64]>>(&self, input: A, output: Output) -> Result<Vec<f64>> {
    let input = input.as_ref();
    if input.len() != self.input_count {
      return Err(Error::ShapeMismatch { expected: self.input_count, actual: input.len() });
    }

    let mut current_input = input.to_owned();
    let layer_count = self.weights_dimensions.len();

    for i in 0..layer_count {
      let layer_weights = self.layer_weights(i);
      let layer_biases = self.layer_biases(i);
      let (current_neuron_count, current_input_count) = self.weights_dimensions[i];

      // a = W*x + b, W row-major (curr, prev)
      let mut neurons: Vec<f64> = layer_weights
        .chunks_exact(current_input_count)
        .zip(layer_biases)
        .map(|(row, b)| {
          row.iter()
            .zip(&current_input)
            .map(|(w, x)| w * x)
            .sum::<f64>() + b
        })
        .collect();
      debug_assert_eq!(neurons.len(), current_neuron_count);

      // relu on hidden layers only; NaN passes through
      if i != layer_count - 1 {
        neurons
          .iter_mut()
          .filter(|x| **x < 0.0)
          .for_each(|x| *x = 0.0);
      }

      current_input = neurons;
    }

    Ok(match output {
      Output::Sigmoid => {
        current_input
          .into_iter()
          .map(sigmoid)
          .collect()
      },
      Output::None => current_input
    })
  }

  #[inline]
  pub fn output_count(&self) -> usize {
    self.architecture[self.architecture.len() - 1]
  }

  /// Fallible counterpart of the assertions in `dimensions`, also catching
  /// parameter counts that overflow `usize`.
  pub fn check_architecture(arch: &[usize]) -> Result<()> {
    if arch.len() < 2 {
      return Err(Error::InvalidArchitecture(format!(
        "{arch:?} needs an input and an output layer"
      )));
    }
    if arch.contains(&0) {
      return Err(Error::InvalidArchitecture(format!("{arch:?} has an empty layer")));
    }

    let weights_count = arch
      .windows(2)
      .try_fold(0usize, |acc, pair| pair[0].checked_mul(pair[1]).and_then(|n| acc.checked_add(n)));
    let biases_count = arch
      .iter()
      .skip(1)
      .try_fold(0usize, |acc, &n| acc.checked_add(n));
    if weights_count.is_none() || biases_count.is_none() {
      return Err(Error::InvalidArchitecture(format!("{arch:?} has too many parameters")));
    }
    Ok(())
  }

  fn dimensions(arch: &[usize]) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    assert!(arch.len() > 1, "Architecture needs an input and an output layer");
    assert!(arch.iter().all(|&n| n > 0), "Layers must not be empty");

    let weights_dimensions = arch
      .windows(2)
      .map(|pair| (pair[1], pair[0]))
      .collect();
    let biases_dimensions = arch
      .iter()
      .skip(1)
      .map(|curr| (*curr, 1))
      .collect();

    (weights_dimensions, biases_dimensions)
  }

  #[inline]
  fn count(dimensions: &[(usize, usize)]) -> usize {
    dimensions
      .iter()
      .fold(0, |acc, &(x, y)| acc + x*y)
  }

  #[inline]
  fn layer_weights(&self, index: usize) -> &[f64] {
    let ptr = Self::count(&self.weights_dimensions[..index]);
    let (rows, cols) = self.weights_dimensions[index];

    &self.weights[ptr..(ptr + rows*cols)]
  }

  #[inline]
  fn layer_biases(&self, index: usize) -> &[f64] {
    let ptr = Self::count(&self.biases_dimensions[..index]);
    let (rows, cols) = self.biases_dimensions[index];

    &self.biases[ptr..(ptr + rows*cols)]
  }
}

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
  if x >= 0.0 {
    1.0 / (1.0 + (-x).exp())
  } else {
    let z = x.exp();
    z / (1.0 + z)
  }
}
