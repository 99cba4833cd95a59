//! In-process cluster runtime
//!
//! [`DistributedTrainer`] splits a dataset into contiguous shards, starts one
//! thread per worker plus the coordinator that implements the reductions, and
//! assembles the per-worker solutions into a [`TrainingOutcome`].

use crate::comm::{cluster, Communicator, LocalCommunicator};
use crate::core::{
    Dataset, IterationRecord, Result, SVMError, Sample, Solution, SolverConfig, SolverState,
};
use crate::model::LinearModel;
use crate::problem::Problem;
use crate::solver::BqoSolver;
use log::info;
use std::ops::Range;
use std::thread;

/// Split `num_samples` indices into `num_workers` contiguous ranges.
///
/// The first `num_samples % num_workers` ranges get one extra sample; ranges
/// may be empty when there are more workers than samples.
pub fn partition(num_samples: usize, num_workers: usize) -> Vec<Range<usize>> {
    if num_workers == 0 {
        return Vec::new();
    }
    let base = num_samples / num_workers;
    let extra = num_samples % num_workers;
    let mut start = 0;
    (0..num_workers)
        .map(|k| {
            let len = base + usize::from(k < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Result of a training job
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Weight vector, bias last
    pub w: Vec<f64>,
    /// Dual variables in global sample order
    pub alpha: Vec<f64>,
    pub duality_gap: f64,
    pub state: SolverState,
    pub iterations: usize,
    pub primal: f64,
    pub dual: f64,
    pub history: Vec<IterationRecord>,
    /// Feature dimension, bias excluded
    pub dim: usize,
}

impl TrainingOutcome {
    /// Classifier described by the trained weights
    pub fn model(&self) -> LinearModel {
        LinearModel::from_weights(self.w.clone())
    }
}

/// Trains a linear SVM with a fixed number of worker threads
#[derive(Debug, Clone)]
pub struct DistributedTrainer {
    config: SolverConfig,
    workers: usize,
}

impl DistributedTrainer {
    pub fn new(config: SolverConfig, workers: usize) -> Result<Self> {
        config.validate()?;
        if workers == 0 {
            return Err(SVMError::InvalidParameter(
                "number of workers must be at least 1".to_string(),
            ));
        }
        Ok(Self { config, workers })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Train on a dataset, split evenly across the workers
    pub fn train<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<TrainingOutcome> {
        if dataset.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.train_samples(&samples, dataset.dim())
    }

    /// Train on samples, split evenly across the workers
    pub fn train_samples(&self, samples: &[Sample], dim: usize) -> Result<TrainingOutcome> {
        let shards: Vec<&[Sample]> = partition(samples.len(), self.workers)
            .into_iter()
            .map(|range| &samples[range])
            .collect();
        self.train_partitioned(&shards, dim)
    }

    /// Train with one pre-assigned shard per worker, in worker order
    pub fn train_partitioned(&self, shards: &[&[Sample]], dim: usize) -> Result<TrainingOutcome> {
        if shards.len() != self.workers {
            return Err(SVMError::InvalidDataset(format!(
                "expected {} shards, got {}",
                self.workers,
                shards.len()
            )));
        }
        info!(
            "training on {} samples with {} worker(s)",
            shards.iter().map(|s| s.len()).sum::<usize>(),
            self.workers
        );

        if self.workers == 1 {
            let mut comm = LocalCommunicator::new();
            let (solution, dim) = self.run_worker(&mut comm, shards[0], dim)?;
            return Ok(Self::assemble(vec![solution], dim));
        }

        let (coordinator, comms) = cluster(self.workers)?;
        let (results, coordinator_result) = thread::scope(|s| {
            let coordinator = s.spawn(move || coordinator.run());
            let handles: Vec<_> = comms
                .into_iter()
                .zip(shards)
                .map(|(mut comm, &shard)| s.spawn(move || self.run_worker(&mut comm, shard, dim)))
                .collect();

            let results: Vec<Result<(Solution, usize)>> = handles
                .into_iter()
                .enumerate()
                .map(|(id, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(SVMError::Communication(format!("worker {id} panicked")))
                    })
                })
                .collect();
            let coordinator_result = coordinator.join().unwrap_or_else(|_| {
                Err(SVMError::Communication("coordinator panicked".to_string()))
            });
            (results, coordinator_result)
        });

        let mut solutions = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(solution) => solutions.push(solution),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            // peers of a failed worker only see the aborted round
            let root = errors
                .iter()
                .position(|e| !matches!(e, SVMError::Communication(_)))
                .unwrap_or(0);
            return Err(errors.swap_remove(root));
        }
        coordinator_result?;

        let dim = solutions[0].1;
        let solutions: Vec<Solution> = solutions.into_iter().map(|(s, _)| s).collect();
        if solutions.iter().any(|s| s.w != solutions[0].w) {
            return Err(SVMError::Communication(
                "workers finished with different weight vectors".to_string(),
            ));
        }
        Ok(Self::assemble(solutions, dim))
    }

    fn run_worker<C: Communicator + ?Sized>(
        &self,
        comm: &mut C,
        shard: &[Sample],
        dim: usize,
    ) -> Result<(Solution, usize)> {
        let problem = Problem::initialize(comm, shard, dim, &self.config)?;
        let dim = problem.dim;
        let solution = BqoSolver::new(problem).solve(comm)?;
        Ok((solution, dim))
    }

    fn assemble(mut solutions: Vec<Solution>, dim: usize) -> TrainingOutcome {
        let alpha = solutions
            .iter()
            .flat_map(|s| s.alpha.iter().copied())
            .collect();
        let leader = solutions.swap_remove(0);
        TrainingOutcome {
            w: leader.w,
            alpha,
            duality_gap: leader.duality_gap,
            state: leader.state,
            iterations: leader.iterations,
            primal: leader.primal,
            dual: leader.dual,
            history: leader.history,
            dim,
        }
    }
}
