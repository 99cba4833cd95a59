//! Duality gap bookkeeping and the termination decision

use crate::core::{IterationRecord, Sample, SolverState};
use log::warn;

/// Local part of the squared hinge loss, `C Σ max(0, 1 - y w.x)²`
pub fn primal_loss(samples: &[Sample], w: &[f64], c: f64) -> f64 {
    let loss: f64 = samples
        .iter()
        .map(|s| {
            let margin = 1.0 - s.label * s.features.dot_dense(w);
            if margin > 0.0 {
                margin * margin
            } else {
                0.0
            }
        })
        .sum();
    c * loss
}

/// Tracks the best weight vector seen so far and decides when to stop
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    c: f64,
    num_samples: usize,
    tolerance: f64,
    max_iter: usize,
    // +inf until the first step, the zero vector is never scored
    best_primal: f64,
    best_w: Vec<f64>,
    duality_gap: f64,
    state: SolverState,
    history: Vec<IterationRecord>,
}

impl ConvergenceMonitor {
    pub fn new(n: usize, c: f64, num_samples: usize, tolerance: f64, max_iter: usize) -> Self {
        Self {
            c,
            num_samples,
            tolerance,
            max_iter,
            best_primal: f64::INFINITY,
            best_w: vec![0.0; n],
            // exact gap at alpha = 0, w = 0
            duality_gap: 1.0,
            state: SolverState::Running,
            history: Vec::new(),
        }
    }

    /// Record the state reached after a step and return the new solver state
    pub fn observe(
        &mut self,
        iteration: usize,
        primal: f64,
        dual: f64,
        eta: f64,
        w: &[f64],
    ) -> SolverState {
        if primal < self.best_primal {
            self.best_primal = primal;
            self.best_w.copy_from_slice(w);
        }

        self.duality_gap = (primal + dual) / (self.c * self.num_samples as f64);
        self.history.push(IterationRecord {
            iteration,
            primal,
            dual,
            duality_gap: self.duality_gap,
            eta,
            best_primal: self.best_primal,
        });

        self.state = if self.duality_gap < self.tolerance {
            SolverState::Converged
        } else if iteration >= self.max_iter {
            warn!(
                "reached {} iterations with duality gap {:.3e}",
                self.max_iter, self.duality_gap
            );
            SolverState::Exhausted
        } else {
            SolverState::Running
        };
        self.state
    }

    /// Stop because the aggregated direction cannot improve the dual
    pub fn halt(&mut self) -> SolverState {
        self.state = SolverState::NoImprovingDirection;
        self.state
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn best_w(&self) -> &[f64] {
        &self.best_w
    }

    pub fn best_primal(&self) -> f64 {
        self.best_primal
    }

    pub fn duality_gap(&self) -> f64 {
        self.duality_gap
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<IterationRecord> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use approx::assert_relative_eq;

    #[test]
    fn test_primal_loss() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![3.0]), 1.0),
        ];
        // margins: 1 - 0.5, 1 + 0.5, 1 - 1.5 (clipped)
        let loss = primal_loss(&samples, &[0.5], 2.0);
        assert_relative_eq!(loss, 2.0 * (0.25 + 2.25));

        assert_relative_eq!(primal_loss(&samples, &[0.0], 1.0), 3.0);
        assert_eq!(primal_loss(&[], &[0.0], 1.0), 0.0);
    }

    #[test]
    fn test_best_w_is_monotone() {
        let mut monitor = ConvergenceMonitor::new(1, 1.0, 10, 1e-6, 10);
        assert_eq!(monitor.duality_gap(), 1.0);
        assert!(monitor.best_primal().is_infinite());

        monitor.observe(1, 5.0, -1.0, 0.5, &[1.0]);
        monitor.observe(2, 7.0, -0.5, 0.5, &[2.0]);
        assert_eq!(monitor.best_w(), &[1.0]);
        assert_eq!(monitor.best_primal(), 5.0);

        monitor.observe(3, 4.0, -0.2, 0.5, &[3.0]);
        assert_eq!(monitor.best_w(), &[3.0]);

        let best: Vec<f64> = monitor.history().iter().map(|r| r.best_primal).collect();
        assert_eq!(best, vec![5.0, 5.0, 4.0]);
        assert_relative_eq!(monitor.history()[2].duality_gap, 3.8 / 10.0);
    }

    #[test]
    fn test_terminal_states() {
        let mut monitor = ConvergenceMonitor::new(1, 1.0, 1, 1e-6, 3);
        assert_eq!(monitor.observe(1, 2.0, -1.0, 1.0, &[0.1]), SolverState::Running);
        assert_eq!(
            monitor.observe(2, 1.0, -1.0 + 1e-9, 1.0, &[0.2]),
            SolverState::Converged
        );

        let mut monitor = ConvergenceMonitor::new(1, 1.0, 1, 1e-6, 2);
        monitor.observe(1, 2.0, -1.0, 1.0, &[0.1]);
        assert_eq!(monitor.observe(2, 2.0, -1.0, 1.0, &[0.1]), SolverState::Exhausted);

        let mut monitor = ConvergenceMonitor::new(2, 1.0, 1, 1e-6, 2);
        assert_eq!(monitor.halt(), SolverState::NoImprovingDirection);
        assert_eq!(monitor.best_w(), &[0.0, 0.0]);
        assert!(monitor.state().is_terminal());
    }
}
