//! Distributed dual solver for the L2-loss linear SVM
//!
//! The dual problem is
//!
//! ```text
//! min f(alpha) = 0.5 alpha^T (Q + diag I) alpha - e^T alpha,  alpha >= 0
//! Q_ij = y_i y_j x_i . x_j,  diag = 0.5 / C
//! ```
//!
//! Workers run randomized coordinate descent on their own shard
//! ([`local`]), the resulting increments are reduced across the job
//! ([`aggregate`]), and a single step length along the combined direction is
//! chosen so that the dual objective decreases and `alpha` stays feasible
//! ([`step`]). [`monitor`] tracks the duality gap and the best primal
//! solution; [`bqo`] ties the pieces together.

pub mod aggregate;
pub mod bqo;
pub mod local;
pub mod monitor;
pub mod step;

pub use self::aggregate::{max_feasible_step, GlobalIncrement, LocalIncrement};
pub use self::bqo::BqoSolver;
pub use self::local::LocalDualSolver;
pub use self::monitor::{primal_loss, ConvergenceMonitor};
pub use self::step::{ObjectiveTracker, Step, StepCombiner, StepDecision};
