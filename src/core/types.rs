//! Core type definitions for the distributed SVM

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Largest stored index plus one (0 for an empty vector)
    pub fn dim(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }

    /// Dot product against a dense vector.
    ///
    /// Coordinates beyond the end of `dense` contribute nothing, so a model
    /// trained on fewer features can still score wider samples.
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .take_while(|(&i, _)| i < dense.len())
            .map(|(&i, &v)| dense[i] * v)
            .sum()
    }

    /// `dense += scale * self`
    pub fn add_scaled_to(&self, dense: &mut [f64], scale: f64) {
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            dense[i] += scale * v;
        }
    }

    /// Return a copy with `value` stored at `index`, replacing any existing entry
    pub fn with_entry(&self, index: usize, value: f64) -> Self {
        let mut indices = Vec::with_capacity(self.nnz() + 1);
        let mut values = Vec::with_capacity(self.nnz() + 1);
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if i != index {
                indices.push(i);
                values.push(v);
            }
        }
        indices.push(index);
        values.push(value);
        Self::new(indices, values)
    }
}

/// Training sample with features and label
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1 for binary classification)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }

    /// Copy of this sample with the constant bias coordinate set at `bias_index`
    pub fn with_bias(&self, bias_index: usize) -> Self {
        Self {
            features: self.features.with_entry(bias_index, 1.0),
            label: self.label,
        }
    }
}

/// Order in which the local solver visits its dual coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitOrder {
    /// Fresh seeded permutation every outer iteration
    Random,
    /// Identity permutation, never reshuffled
    Sequential,
}

/// Configuration for the distributed solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Regularization parameter C
    pub c: f64,
    /// Maximum number of outer (synchronized) iterations
    pub max_iter: usize,
    /// Number of local passes per outer iteration
    pub max_inner_iter: usize,
    /// Duality gap below which the solver stops
    pub tolerance: f64,
    /// Coordinate visiting order of the local solver
    pub visit_order: VisitOrder,
    /// Base seed; worker `k` uses `seed + k`
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 200,
            max_inner_iter: 10,
            tolerance: 1e-6,
            visit_order: VisitOrder::Random,
            seed: 0,
        }
    }
}

impl SolverConfig {
    /// Reject settings the solver cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be a positive finite number, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if self.max_inner_iter == 0 {
            return Err(SVMError::InvalidParameter(
                "max_inner_iter must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "tolerance must be a positive finite number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Diagonal term 0.5 / C added to every Q_ii
    pub fn diag(&self) -> f64 {
        0.5 / self.c
    }
}

/// Solver state; everything but `Running` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverState {
    Running,
    /// Duality gap fell below the tolerance
    Converged,
    /// The aggregated direction does not decrease the dual objective
    NoImprovingDirection,
    /// Outer iteration budget used up
    Exhausted,
}

impl SolverState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SolverState::Running)
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverState::Running => "running",
            SolverState::Converged => "converged",
            SolverState::NoImprovingDirection => "no improving direction",
            SolverState::Exhausted => "iteration budget exhausted",
        };
        f.write_str(name)
    }
}

/// Objective values observed after one outer iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub primal: f64,
    pub dual: f64,
    pub duality_gap: f64,
    pub eta: f64,
    /// Lowest primal value seen up to and including this iteration
    pub best_primal: f64,
}

/// Result of one worker's solve
#[derive(Debug, Clone)]
pub struct Solution {
    /// Weight vector (bias last), equal to best_w once terminal
    pub w: Vec<f64>,
    /// Dual variables of this worker's shard
    pub alpha: Vec<f64>,
    pub duality_gap: f64,
    pub state: SolverState,
    /// Number of outer iterations that applied a step
    pub iterations: usize,
    /// Primal objective of `w`
    pub primal: f64,
    /// Dual objective of the final `alpha`
    pub dual: f64,
    pub history: Vec<IterationRecord>,
}
