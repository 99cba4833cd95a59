//! Problem descriptor shared by the solver components of one worker
//!
//! Built once at start-up through [`Problem::initialize`], which performs the
//! only bootstrap exchange of a job: workers publish their sample counts (so
//! every worker can derive its shard bounds by prefix sums) and agree on the
//! feature dimension. The constant bias coordinate is appended to every local
//! sample at index `dim`.

use crate::comm::Communicator;
use crate::core::{Result, SVMError, Sample, SolverConfig};
use crate::utils::validation::{validate_binary_labels, validate_finite_features};

/// Contiguous range `[idx_low, idx_high)` of global sample indices owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    pub worker_id: usize,
    pub num_workers: usize,
    pub idx_low: usize,
    pub idx_high: usize,
}

impl Shard {
    /// Derive the shard of `worker_id` from the sample counts of all workers
    pub fn from_counts(counts: &[usize], worker_id: usize) -> Result<Self> {
        if worker_id >= counts.len() {
            return Err(SVMError::InvalidParameter(format!(
                "worker id {} out of range for {} workers",
                worker_id,
                counts.len()
            )));
        }
        let idx_low: usize = counts[..worker_id].iter().sum();
        Ok(Self {
            worker_id,
            num_workers: counts.len(),
            idx_low,
            idx_high: idx_low + counts[worker_id],
        })
    }

    pub fn len(&self) -> usize {
        self.idx_high - self.idx_low
    }

    pub fn is_empty(&self) -> bool {
        self.idx_high == self.idx_low
    }
}

/// Everything a worker needs to know about the global problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Local samples, bias coordinate included
    pub samples: Vec<Sample>,
    pub shard: Shard,
    /// Number of features agreed by all workers, bias excluded
    pub dim: usize,
    /// Global sample count
    pub num_samples: usize,
    pub config: SolverConfig,
}

impl Problem {
    /// Exchange shard sizes and feature dimension with the other workers.
    ///
    /// `dim` is the caller's view of the feature dimension; the agreed value
    /// is the maximum over all workers and over every local sample.
    pub fn initialize<C: Communicator + ?Sized>(
        comm: &mut C,
        samples: &[Sample],
        dim: usize,
        config: &SolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        validate_binary_labels(samples)?;
        validate_finite_features(samples)?;

        let mut counts = vec![0.0; comm.num_workers()];
        counts[comm.worker_id()] = samples.len() as f64;
        let counts: Vec<usize> = comm
            .sum_reduce(counts)?
            .into_iter()
            .map(|c| c as usize)
            .collect();
        let shard = Shard::from_counts(&counts, comm.worker_id())?;

        let num_samples: usize = counts.iter().sum();
        if num_samples == 0 {
            return Err(SVMError::EmptyDataset);
        }

        let local_dim = samples
            .iter()
            .map(|s| s.features.dim())
            .fold(dim, usize::max);
        let dim = comm.max_reduce(local_dim as f64)? as usize;

        Ok(Self {
            samples: samples.iter().map(|s| s.with_bias(dim)).collect(),
            shard,
            dim,
            num_samples,
            config: config.clone(),
        })
    }

    /// Length of the weight vector (features plus bias)
    pub fn n(&self) -> usize {
        self.dim + 1
    }
}
