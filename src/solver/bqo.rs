//! Outer loop of the distributed box-constrained QP solver
//!
//! One call to [`BqoSolver::solve`] runs on every worker of a job. Each outer
//! iteration:
//!
//! 1. snapshots `alpha` and `w`,
//! 2. runs the local coordinate descent passes,
//! 3. reduces the increments of all workers (first barrier),
//! 4. applies the agreed step `eta` to the local copies,
//! 5. reduces the squared hinge loss (second barrier) and checks the gap.
//!
//! All workers see the same reduced values, so their copies of `w` stay
//! bit-identical from one iteration to the next.

use crate::comm::Communicator;
use crate::core::{Result, SVMError, Solution, SolverState};
use crate::problem::Problem;
use crate::solver::aggregate::{GlobalIncrement, LocalIncrement};
use crate::solver::local::LocalDualSolver;
use crate::solver::monitor::{primal_loss, ConvergenceMonitor};
use crate::solver::step::{ObjectiveTracker, StepCombiner, StepDecision};
use crate::utils::dense;
use log::{debug, info};
use std::time::Instant;

/// Distributed L2-loss SVM dual solver for one worker
pub struct BqoSolver {
    problem: Problem,
}

impl BqoSolver {
    pub fn new(problem: Problem) -> Self {
        Self { problem }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Run the outer iterations until a terminal state is reached.
    ///
    /// The returned `w` is the best weight vector observed and is identical
    /// on every worker; `alpha` covers this worker's shard only.
    pub fn solve<C: Communicator + ?Sized>(&self, comm: &mut C) -> Result<Solution> {
        let start = Instant::now();
        let problem = &self.problem;
        let config = &problem.config;
        let samples = problem.samples.as_slice();
        let n = problem.n();
        let leader = comm.is_leader();

        if leader {
            info!(
                "solving with {} samples, {} features, {} workers (C = {}, {} inner passes)",
                problem.num_samples,
                problem.dim,
                comm.num_workers(),
                config.c,
                config.max_inner_iter
            );
        }

        let mut local = LocalDualSolver::new(samples, config, comm.worker_id());
        let mut alpha = vec![0.0; samples.len()];
        let mut alpha_orig = vec![0.0; samples.len()];
        let mut w = vec![0.0; n];
        let mut w_orig = vec![0.0; n];

        let mut tracker = ObjectiveTracker::new();
        let mut monitor = ConvergenceMonitor::new(
            n,
            config.c,
            problem.num_samples,
            config.tolerance,
            config.max_iter,
        );
        let mut iterations = 0;

        for iteration in 1..=config.max_iter {
            alpha_orig.copy_from_slice(&alpha);
            w_orig.copy_from_slice(&w);

            local.reshuffle();
            local.run_passes(config.max_inner_iter, &mut alpha, &mut w);

            let increment =
                LocalIncrement::compute(&alpha, &alpha_orig, &w, &w_orig, config.diag());
            let global = GlobalIncrement::aggregate(comm, &increment)?;

            let step = match StepCombiner::decide(&w_orig, &global) {
                StepDecision::Apply(step) => step,
                StepDecision::NoImprovingDirection { grad } => {
                    if leader {
                        debug!("iteration {iteration}: no descent direction (grad = {grad:e})");
                    }
                    alpha.copy_from_slice(&alpha_orig);
                    monitor.halt();
                    break;
                }
            };

            step.apply_alpha(&mut alpha, &alpha_orig, &increment.alpha_inc);
            step.apply_w(&mut w, &w_orig, &global.w_inc);
            tracker.advance(&step);

            let loss = comm.sum_reduce_scalar(primal_loss(samples, &w, config.c))?;
            let primal = tracker.regularizer() + loss;
            Self::check_finite(iteration, step.eta, primal, tracker.dual(), &w)?;

            iterations = iteration;
            let state = monitor.observe(iteration, primal, tracker.dual(), step.eta, &w);
            if leader {
                debug!(
                    "iteration {iteration}: primal {primal:.6e} dual {:.6e} gap {:.3e} eta {:.4}",
                    tracker.dual(),
                    monitor.duality_gap(),
                    step.eta
                );
            }
            if state.is_terminal() {
                break;
            }
        }

        let state = monitor.state();
        debug_assert!(state.is_terminal());
        let primal = if monitor.best_primal().is_finite() {
            monitor.best_primal()
        } else {
            // w = 0: every sample has unit hinge loss
            config.c * problem.num_samples as f64
        };

        if leader {
            info!(
                "{} after {} iterations, duality gap {:.3e}, primal {:.6e} ({:.3}s)",
                state,
                iterations,
                monitor.duality_gap(),
                primal,
                start.elapsed().as_secs_f64()
            );
        }

        Ok(Solution {
            w: monitor.best_w().to_vec(),
            alpha,
            duality_gap: monitor.duality_gap(),
            state,
            iterations,
            primal,
            dual: tracker.dual(),
            history: monitor.into_history(),
        })
    }

    fn check_finite(iteration: usize, eta: f64, primal: f64, dual: f64, w: &[f64]) -> Result<()> {
        if !(eta.is_finite() && primal.is_finite() && dual.is_finite()) {
            return Err(SVMError::Divergence(format!(
                "iteration {iteration}: eta {eta}, primal {primal}, dual {dual}"
            )));
        }
        if !dense::all_finite(w) {
            return Err(SVMError::Divergence(format!(
                "iteration {iteration}: weight vector is not finite"
            )));
        }
        Ok(())
    }
}

impl Solution {
    /// True when the solver stopped because the gap fell below the tolerance
    pub fn converged(&self) -> bool {
        self.state == SolverState::Converged
    }
}
