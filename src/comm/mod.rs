//! Cross-worker aggregation
//!
//! Every worker of a training job owns a [`Communicator`]. A call to
//! [`Communicator::all_reduce`] publishes the worker's partial values and
//! blocks until the contributions of all workers have been merged; every
//! participant then receives the very same merged value. The `sum` part is
//! reduced by elementwise addition, the `min` part by elementwise minimum.

pub mod channel;
pub mod local;

pub use self::channel::{cluster, ChannelCommunicator, Coordinator};
pub use self::local::LocalCommunicator;

use crate::core::{Result, SVMError};
use std::sync::Arc;

/// Partial values published by one worker for a single reduction round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contribution {
    /// Reduced by elementwise addition
    pub sum: Vec<f64>,
    /// Reduced by elementwise minimum
    pub min: Vec<f64>,
}

impl Contribution {
    pub fn new(sum: Vec<f64>, min: Vec<f64>) -> Self {
        Self { sum, min }
    }

    pub fn sums(sum: Vec<f64>) -> Self {
        Self {
            sum,
            min: Vec::new(),
        }
    }

    pub fn mins(min: Vec<f64>) -> Self {
        Self {
            sum: Vec::new(),
            min,
        }
    }

    /// Fold `other` into `self`
    pub fn merge(&mut self, other: &Contribution) -> Result<()> {
        if self.sum.len() != other.sum.len() || self.min.len() != other.min.len() {
            return Err(SVMError::Communication(format!(
                "contribution shape mismatch: ({}, {}) vs ({}, {})",
                self.sum.len(),
                self.min.len(),
                other.sum.len(),
                other.min.len()
            )));
        }
        for (acc, &v) in self.sum.iter_mut().zip(&other.sum) {
            *acc += v;
        }
        for (acc, &v) in self.min.iter_mut().zip(&other.min) {
            *acc = acc.min(v);
        }
        Ok(())
    }
}

/// Barrier-synchronized reduction channel shared by the workers of one job
pub trait Communicator: Send {
    /// Zero-based id of this worker
    fn worker_id(&self) -> usize;

    /// Number of workers taking part in every reduction
    fn num_workers(&self) -> usize;

    /// Publish `contribution` and wait for the merged value of all workers
    fn all_reduce(&mut self, contribution: Contribution) -> Result<Arc<Contribution>>;

    /// Elementwise sum across workers
    fn sum_reduce(&mut self, values: Vec<f64>) -> Result<Vec<f64>> {
        Ok(self.all_reduce(Contribution::sums(values))?.sum.clone())
    }

    fn sum_reduce_scalar(&mut self, value: f64) -> Result<f64> {
        Ok(self.all_reduce(Contribution::sums(vec![value]))?.sum[0])
    }

    fn min_reduce(&mut self, value: f64) -> Result<f64> {
        Ok(self.all_reduce(Contribution::mins(vec![value]))?.min[0])
    }

    fn max_reduce(&mut self, value: f64) -> Result<f64> {
        Ok(-self.min_reduce(-value)?)
    }

    /// True on the worker that reports job-level progress
    fn is_leader(&self) -> bool {
        self.worker_id() == 0
    }
}
