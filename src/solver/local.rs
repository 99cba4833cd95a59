//! Randomized dual coordinate descent over one worker's shard
//!
//! Each visited coordinate minimizes the dual objective exactly along its own
//! axis, projected onto `alpha_i >= 0`, and the change is folded into the
//! worker's copy of `w` right away so later coordinates of the same pass see
//! it. No communication happens here.

use crate::core::{Sample, SolverConfig, VisitOrder};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Projected gradients smaller than this leave the coordinate untouched
const PG_EPSILON: f64 = 1e-12;

/// Per-worker inner solver; owns the diagonal cache and the visiting order
pub struct LocalDualSolver<'a> {
    samples: &'a [Sample],
    /// `QD_i = x_i . x_i + diag`, strictly positive
    qd: Vec<f64>,
    index: Vec<usize>,
    rng: StdRng,
    visit_order: VisitOrder,
    diag: f64,
}

impl<'a> LocalDualSolver<'a> {
    pub fn new(samples: &'a [Sample], config: &SolverConfig, worker_id: usize) -> Self {
        let diag = config.diag();
        Self {
            samples,
            qd: samples
                .iter()
                .map(|s| s.features.norm_squared() + diag)
                .collect(),
            index: (0..samples.len()).collect(),
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(worker_id as u64)),
            visit_order: config.visit_order,
            diag,
        }
    }

    /// Draw the visiting order for the next outer iteration
    pub fn reshuffle(&mut self) {
        if self.visit_order == VisitOrder::Random {
            self.index.shuffle(&mut self.rng);
        }
    }

    /// Current visiting order
    pub fn order(&self) -> &[usize] {
        &self.index
    }

    /// Run `passes` sweeps over the shard in the current order.
    ///
    /// Returns the number of coordinate updates that were applied.
    pub fn run_passes(&self, passes: usize, alpha: &mut [f64], w: &mut [f64]) -> usize {
        debug_assert_eq!(alpha.len(), self.samples.len());
        let mut updates = 0;
        for _ in 0..passes {
            for &i in &self.index {
                if self.update_coordinate(i, alpha, w) {
                    updates += 1;
                }
            }
        }
        updates
    }

    fn update_coordinate(&self, i: usize, alpha: &mut [f64], w: &mut [f64]) -> bool {
        let sample = &self.samples[i];
        let y = sample.label;
        let g = y * sample.features.dot_dense(w) - 1.0 + self.diag * alpha[i];

        // no upper bound on alpha_i, so only the lower one projects
        let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
        if pg.abs() <= PG_EPSILON {
            return false;
        }

        let old = alpha[i];
        alpha[i] = (old - g / self.qd[i]).max(0.0);
        sample.features.add_scaled_to(w, (alpha[i] - old) * y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use approx::assert_abs_diff_eq;

    fn biased(x: Vec<f64>, label: f64) -> Sample {
        let n = x.len();
        let mut indices: Vec<usize> = (0..n).collect();
        let mut values = x;
        indices.push(n);
        values.push(1.0);
        Sample::new(SparseVector::new(indices, values), label)
    }

    #[test]
    fn test_single_coordinate_step() {
        let samples = vec![biased(vec![1.0, 1.0], 1.0)];
        let config = SolverConfig::default();
        let solver = LocalDualSolver::new(&samples, &config, 0);

        let mut alpha = vec![0.0];
        let mut w = vec![0.0; 3];
        assert_eq!(solver.run_passes(1, &mut alpha, &mut w), 1);

        // G = -1, QD = 3 + 0.5
        assert_abs_diff_eq!(alpha[0], 1.0 / 3.5, epsilon = 1e-15);
        for &wi in &w {
            assert_abs_diff_eq!(wi, 1.0 / 3.5, epsilon = 1e-15);
        }

        // exact minimizer along the axis: a second pass changes nothing
        assert_eq!(solver.run_passes(1, &mut alpha, &mut w), 0);
    }

    #[test]
    fn test_alpha_stays_nonnegative() {
        let samples = vec![
            biased(vec![1.0, 0.0], 1.0),
            biased(vec![0.9, 0.1], 1.0),
            biased(vec![-1.0, 0.5], -1.0),
        ];
        let config = SolverConfig::default();
        let mut solver = LocalDualSolver::new(&samples, &config, 3);

        // start far from feasible optimum so some coordinates get clipped
        let mut alpha = vec![5.0, 5.0, 0.0];
        let mut w = vec![0.0; 3];
        for (a, s) in alpha.iter().zip(&samples) {
            s.features.add_scaled_to(&mut w, a * s.label);
        }
        for _ in 0..5 {
            solver.reshuffle();
            solver.run_passes(2, &mut alpha, &mut w);
            assert!(alpha.iter().all(|&a| a >= 0.0));
        }
    }

    #[test]
    fn test_visit_orders() {
        let samples: Vec<Sample> = (0..8).map(|i| biased(vec![i as f64], 1.0)).collect();
        let sequential = SolverConfig {
            visit_order: VisitOrder::Sequential,
            ..SolverConfig::default()
        };
        let mut solver = LocalDualSolver::new(&samples, &sequential, 0);
        solver.reshuffle();
        assert_eq!(solver.order(), &[0, 1, 2, 3, 4, 5, 6, 7]);

        let random = SolverConfig {
            seed: 42,
            ..SolverConfig::default()
        };
        let mut a = LocalDualSolver::new(&samples, &random, 1);
        let mut b = LocalDualSolver::new(&samples, &random, 1);
        a.reshuffle();
        b.reshuffle();
        assert_eq!(a.order(), b.order());

        let mut sorted = a.order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
    }
}
