//! Model serialization and persistence
//!
//! Trained models are stored as pretty-printed JSON: the weight vector (bias
//! last), the feature dimension and some metadata about how the model was
//! trained. The CLI uses this format for `train --output`, `predict`,
//! `evaluate` and `info`.

use crate::api::TrainedModel;
use crate::core::{Result, SVMError, SVMModel, SolverConfig, SolverState, VisitOrder};
use crate::model::LinearModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained linear SVM
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Feature weights followed by the bias
    pub weights: Vec<f64>,
    /// Number of features, bias excluded
    pub dim: usize,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Training parameters used
    pub training_params: TrainingParams,
    pub duality_gap: f64,
    pub state: SolverState,
    pub iterations: usize,
    /// Creation timestamp
    pub created_at: String,
}

/// Training parameters for reference
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingParams {
    pub c: f64,
    pub tolerance: f64,
    pub max_iter: usize,
    pub max_inner_iter: usize,
    pub visit_order: VisitOrder,
    pub seed: u64,
}

impl From<&SolverConfig> for TrainingParams {
    fn from(config: &SolverConfig) -> Self {
        Self {
            c: config.c,
            tolerance: config.tolerance,
            max_iter: config.max_iter,
            max_inner_iter: config.max_inner_iter,
            visit_order: config.visit_order,
            seed: config.seed,
        }
    }
}

impl From<&TrainingParams> for SolverConfig {
    fn from(params: &TrainingParams) -> Self {
        Self {
            c: params.c,
            max_iter: params.max_iter,
            max_inner_iter: params.max_inner_iter,
            tolerance: params.tolerance,
            visit_order: params.visit_order,
            seed: params.seed,
        }
    }
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_trained_model(model: &TrainedModel) -> Self {
        let info = model.info();
        Self {
            weights: model.inner().augmented_weights().to_vec(),
            dim: info.dim,
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                training_params: TrainingParams::from(model.config()),
                duality_gap: info.duality_gap,
                state: info.state,
                iterations: info.iterations,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.weights.len() != self.dim + 1 {
            return Err(SVMError::SerializationError(format!(
                "model declares {} features but stores {} weights",
                self.dim,
                self.weights.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(SVMError::SerializationError(
                "model contains non-finite weights".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert back to a trained model
    pub fn to_trained_model(&self) -> Result<TrainedModel> {
        self.validate()?;
        let metadata = &self.metadata;
        Ok(TrainedModel::from_parts(
            LinearModel::from_weights(self.weights.clone()),
            SolverConfig::from(&metadata.training_params),
            metadata.duality_gap,
            metadata.state,
            metadata.iterations,
        ))
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let model = LinearModel::from_weights(self.weights.clone());
        let nonzero = model.weights().iter().filter(|&&w| w != 0.0).count();
        let params = &self.metadata.training_params;

        println!("=== Linear SVM Model Summary ===");
        println!("Features: {}", self.dim);
        println!("Non-zero weights: {nonzero}");
        println!("Bias: {:.6}", model.bias());
        println!("Termination: {}", self.metadata.state);
        println!("Iterations: {}", self.metadata.iterations);
        println!("Duality gap: {:.3e}", self.metadata.duality_gap);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Training Parameters:");
        println!("  C: {}", params.c);
        println!("  Tolerance: {}", params.tolerance);
        println!("  Max Iterations: {}", params.max_iter);
        println!("  Inner Iterations: {}", params.max_inner_iter);
        println!("  Visit Order: {:?}", params.visit_order);
        println!("  Seed: {}", params.seed);
    }
}
