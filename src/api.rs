//! High-level API for training and using linear SVMs
//!
//! This module wraps the distributed trainer in a builder, and gives the
//! trained weights a small prediction and evaluation interface.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bqo_svm::api::SVM;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Train on four worker threads
//! let svm = SVM::new()
//!     .with_c(1.0)
//!     .with_workers(4)
//!     .train_from_file("data.libsvm")?;
//!
//! // Make predictions
//! let predictions = svm.predict_from_file("test.libsvm")?;
//! println!("{} predictions", predictions.len());
//! println!("Accuracy: {:.2}%", svm.evaluate_from_file("test.libsvm")? * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Dataset, IterationRecord, Prediction, Result, SVMError, SVMModel, Sample, SolverConfig,
    SolverState, VisitOrder,
};
use crate::data::DataFormat;
use crate::eval::{self, EvaluationMetrics, Evaluator};
use crate::model::LinearModel;
use crate::trainer::{DistributedTrainer, TrainingOutcome};
use std::path::Path;

/// High-level SVM interface with builder pattern
#[derive(Debug, Clone)]
pub struct SVM {
    config: SolverConfig,
    workers: usize,
}

impl SVM {
    /// Create a new SVM with default parameters and a single worker
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
            workers: 1,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set the duality gap at which training stops
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set maximum number of outer iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iter = max_iterations;
        self
    }

    /// Set number of local passes per outer iteration
    pub fn with_inner_iterations(mut self, inner_iterations: usize) -> Self {
        self.config.max_inner_iter = inner_iterations;
        self
    }

    /// Set number of worker threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_visit_order(mut self, visit_order: VisitOrder) -> Self {
        self.config.visit_order = visit_order;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn train<D: Dataset + ?Sized>(self, dataset: &D) -> Result<TrainedModel> {
        let outcome = DistributedTrainer::new(self.config.clone(), self.workers)?.train(dataset)?;
        Ok(TrainedModel::from_outcome(outcome, self.config))
    }

    /// Train on a dataset whose feature space must cover at least `dim` features,
    /// e.g. the dimension of a test set evaluated afterwards
    pub fn train_with_dim<D: Dataset + ?Sized>(
        self,
        dataset: &D,
        dim: usize,
    ) -> Result<TrainedModel> {
        if dataset.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let outcome = DistributedTrainer::new(self.config.clone(), self.workers)?
            .train_samples(&collect_samples(dataset), dim.max(dataset.dim()))?;
        Ok(TrainedModel::from_outcome(outcome, self.config))
    }

    /// Train on samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let dim = samples
            .iter()
            .map(|s| s.features.dim())
            .max()
            .unwrap_or(0);
        let outcome = DistributedTrainer::new(self.config.clone(), self.workers)?
            .train_samples(samples, dim)?;
        Ok(TrainedModel::from_outcome(outcome, self.config))
    }

    /// Train from a file, guessing the format from its extension
    pub fn train_from_file<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel> {
        let dataset = DataFormat::detect(path.as_ref()).load(path.as_ref())?;
        self.train(&*dataset)
    }
}

impl Default for SVM {
    fn default() -> Self {
        Self::new()
    }
}

/// Trained SVM model with high-level prediction interface
#[derive(Debug, Clone)]
pub struct TrainedModel {
    model: LinearModel,
    config: SolverConfig,
    duality_gap: f64,
    state: SolverState,
    iterations: usize,
    history: Vec<IterationRecord>,
}

impl TrainedModel {
    fn from_outcome(outcome: TrainingOutcome, config: SolverConfig) -> Self {
        Self {
            model: outcome.model(),
            config,
            duality_gap: outcome.duality_gap,
            state: outcome.state,
            iterations: outcome.iterations,
            history: outcome.history,
        }
    }

    /// Rebuild a model from stored parts; the iteration history is not kept
    pub(crate) fn from_parts(
        model: LinearModel,
        config: SolverConfig,
        duality_gap: f64,
        state: SolverState,
        iterations: usize,
    ) -> Self {
        Self {
            model,
            config,
            duality_gap,
            state,
            iterations,
            history: Vec::new(),
        }
    }

    /// Predict a single sample
    pub fn predict(&self, sample: &Sample) -> Prediction {
        self.model.predict(sample)
    }

    /// Predict multiple samples
    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        self.model.predict_batch(samples)
    }

    /// Predict from dataset
    pub fn predict_dataset<D: Dataset + ?Sized>(&self, dataset: &D) -> Vec<Prediction> {
        self.predict_batch(&collect_samples(dataset))
    }

    /// Predict from a file, guessing the format from its extension
    pub fn predict_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Prediction>> {
        let dataset = DataFormat::detect(path.as_ref()).load(path.as_ref())?;
        Ok(self.predict_dataset(&*dataset))
    }

    /// Evaluate accuracy on a dataset
    pub fn evaluate<D: Dataset + ?Sized>(&self, dataset: &D) -> f64 {
        eval::accuracy(&self.model, &collect_samples(dataset))
    }

    /// Evaluate accuracy on a file, guessing the format from its extension
    pub fn evaluate_from_file<P: AsRef<Path>>(&self, path: P) -> Result<f64> {
        let dataset = DataFormat::detect(path.as_ref()).load(path.as_ref())?;
        Ok(self.evaluate(&*dataset))
    }

    /// Get detailed evaluation metrics
    pub fn evaluate_detailed<D: Dataset + ?Sized>(&self, dataset: &D) -> EvaluationMetrics {
        Evaluator::new(&self.model).evaluate_detailed(&collect_samples(dataset))
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            dim: self.model.dim(),
            bias: self.model.bias(),
            nonzero_weights: self.model.weights().iter().filter(|&&w| w != 0.0).count(),
            duality_gap: self.duality_gap,
            state: self.state,
            iterations: self.iterations,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Objective values of every outer iteration
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Get the underlying linear model
    pub fn inner(&self) -> &LinearModel {
        &self.model
    }
}

fn collect_samples<D: Dataset + ?Sized>(dataset: &D) -> Vec<Sample> {
    (0..dataset.len()).map(|i| dataset.get_sample(i)).collect()
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Number of features, bias excluded
    pub dim: usize,
    pub bias: f64,
    pub nonzero_weights: usize,
    pub duality_gap: f64,
    pub state: SolverState,
    pub iterations: usize,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train with default parameters, format guessed from the extension
    pub fn train<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
        SVM::new().train_from_file(path)
    }

    /// Train with custom C parameter and worker count
    pub fn train_with<P: AsRef<Path>>(path: P, c: f64, workers: usize) -> Result<TrainedModel> {
        SVM::new()
            .with_c(c)
            .with_workers(workers)
            .train_from_file(path)
    }

    /// Quick evaluation: train on training file, test on test file
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<f64> {
        let model = train(train_path)?;
        model.evaluate_from_file(test_path)
    }

    /// Hold-out validation on a sequential split (not randomized for reproducibility)
    pub fn simple_validation<D: Dataset + ?Sized>(
        dataset: &D,
        train_ratio: f64,
        c: f64,
    ) -> Result<f64> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(SVMError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }

        let samples = collect_samples(dataset);
        let train_size = (samples.len() as f64 * train_ratio) as usize;
        let (train, test) = samples.split_at(train_size);

        let model = SVM::new().with_c(c).train_samples(train)?;
        Ok(eval::accuracy(model.inner(), test))
    }
}
