//! Trained linear classifier

use crate::core::{Prediction, Result, SVMError, SVMModel, Sample};

/// Weights `[w_1 .. w_dim, b]` of a linear decision function `w.x + b`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    weights: Vec<f64>,
    dim: usize,
}

impl LinearModel {
    /// Build a model from a weight vector whose last component is the bias
    pub fn from_weights(weights: Vec<f64>) -> Self {
        let dim = weights.len().saturating_sub(1);
        let weights = if weights.is_empty() { vec![0.0] } else { weights };
        Self { weights, dim }
    }

    /// Build a model from feature weights and a separate bias
    pub fn new(mut weights: Vec<f64>, bias: f64) -> Result<Self> {
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(SVMError::InvalidParameter(
                "model weights must be finite".to_string(),
            ));
        }
        weights.push(bias);
        Ok(Self::from_weights(weights))
    }

    /// Number of features, bias excluded
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Full weight vector, bias last
    pub fn augmented_weights(&self) -> &[f64] {
        &self.weights
    }

    /// `w.x + b`; features beyond the trained dimension are ignored
    pub fn decision_value(&self, sample: &Sample) -> f64 {
        sample.features.dot_dense(self.weights()) + self.bias()
    }
}

impl SVMModel for LinearModel {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_value(sample);
        let label = if decision_value > 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn weights(&self) -> &[f64] {
        &self.weights[..self.dim]
    }

    fn bias(&self) -> f64 {
        self.weights[self.dim]
    }
}
