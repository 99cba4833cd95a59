//! Distributed L2-loss linear SVM
//!
//! Training solves the dual of the squared hinge loss SVM with a
//! box-constrained quadratic optimization scheme: every worker runs dual
//! coordinate descent on its own shard, and one step length along the summed
//! direction is agreed on globally each outer iteration.

pub mod api;
pub mod comm;
pub mod core;
pub mod data;
pub mod eval;
pub mod model;
pub mod persistence;
pub mod problem;
pub mod solver;
pub mod trainer;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{ModelInfo, TrainedModel, SVM};
pub use crate::comm::{Communicator, Contribution, LocalCommunicator};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::{DataFormat, LibSVMDataset, TSVDataset};
pub use crate::eval::{EvaluationMetrics, Evaluator};
pub use crate::model::LinearModel;
pub use crate::problem::{Problem, Shard};
pub use crate::solver::BqoSolver;
pub use crate::trainer::{partition, DistributedTrainer, TrainingOutcome};
pub use crate::utils::SparseVectorStats;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
