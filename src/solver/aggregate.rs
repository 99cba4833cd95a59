//! Local increments and their global reduction
//!
//! After its inner passes a worker describes what it did relative to the
//! iteration-start snapshot. The vector part (`w_inc`) and three scalars are
//! summed over all workers, the feasibility bound is min-reduced; both travel
//! in one round so each outer iteration costs a single O(n) exchange.

use crate::comm::{Communicator, Contribution};
use crate::core::{Result, SVMError};
use crate::utils::dense;

/// What one worker changed during its inner passes
#[derive(Debug, Clone)]
pub struct LocalIncrement {
    /// `alpha - alpha_orig`, never leaves the worker
    pub alpha_inc: Vec<f64>,
    /// `w - w_orig`
    pub w_inc: Vec<f64>,
    pub sum_alpha_inc: f64,
    /// `Σ diag · alpha_inc_i²`
    pub alpha_inc_square: f64,
    /// `Σ diag · alpha_inc_i · alpha_orig_i`
    pub alpha_inc_dot_alpha: f64,
    /// Largest step keeping `alpha_orig + step · alpha_inc >= 0`
    pub max_step: f64,
}

impl LocalIncrement {
    pub fn compute(
        alpha: &[f64],
        alpha_orig: &[f64],
        w: &[f64],
        w_orig: &[f64],
        diag: f64,
    ) -> Self {
        let alpha_inc: Vec<f64> = alpha.iter().zip(alpha_orig).map(|(a, o)| a - o).collect();
        let mut w_inc = vec![0.0; w.len()];
        dense::diff_into(&mut w_inc, w, w_orig);

        let mut sum_alpha_inc = 0.0;
        let mut alpha_inc_square = 0.0;
        let mut alpha_inc_dot_alpha = 0.0;
        for (&inc, &orig) in alpha_inc.iter().zip(alpha_orig) {
            sum_alpha_inc += inc;
            alpha_inc_square += diag * inc * inc;
            alpha_inc_dot_alpha += diag * inc * orig;
        }

        Self {
            max_step: max_feasible_step(alpha_orig, &alpha_inc),
            alpha_inc,
            w_inc,
            sum_alpha_inc,
            alpha_inc_square,
            alpha_inc_dot_alpha,
        }
    }

    /// Payload for the reduction round: `[w_inc.., sum, square, dot]` and `[max_step]`
    pub fn to_contribution(&self) -> Contribution {
        let mut sum = Vec::with_capacity(self.w_inc.len() + 3);
        sum.extend_from_slice(&self.w_inc);
        sum.extend([
            self.sum_alpha_inc,
            self.alpha_inc_square,
            self.alpha_inc_dot_alpha,
        ]);
        Contribution::new(sum, vec![self.max_step])
    }
}

/// Tightest bound on the step length that keeps every dual variable feasible.
///
/// Only decreasing coordinates constrain the step; with none the bound is
/// infinite. Since `alpha_orig_i >= 0` the result is never negative.
pub fn max_feasible_step(alpha_orig: &[f64], alpha_inc: &[f64]) -> f64 {
    alpha_orig
        .iter()
        .zip(alpha_inc)
        .filter(|(_, &inc)| inc < 0.0)
        .map(|(&orig, &inc)| -orig / inc)
        .fold(f64::INFINITY, f64::min)
}

/// Sum of all workers' increments; identical on every worker
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalIncrement {
    pub w_inc: Vec<f64>,
    pub sum_alpha_inc: f64,
    pub alpha_inc_square: f64,
    pub alpha_inc_dot_alpha: f64,
    pub max_step: f64,
}

impl GlobalIncrement {
    /// Publish `local` and wait for the merged increment of the whole job
    pub fn aggregate<C: Communicator + ?Sized>(
        comm: &mut C,
        local: &LocalIncrement,
    ) -> Result<Self> {
        let reduced = comm.all_reduce(local.to_contribution())?;
        Self::from_reduced(&reduced, local.w_inc.len())
    }

    /// Unpack a reduced contribution for a weight vector of length `n`
    pub fn from_reduced(reduced: &Contribution, n: usize) -> Result<Self> {
        if reduced.sum.len() != n + 3 || reduced.min.len() != 1 {
            return Err(SVMError::Communication(format!(
                "reduced increment has shape ({}, {}), expected ({}, 1)",
                reduced.sum.len(),
                reduced.min.len(),
                n + 3
            )));
        }
        let (w_inc, scalars) = reduced.sum.split_at(n);
        Ok(Self {
            w_inc: w_inc.to_vec(),
            sum_alpha_inc: scalars[0],
            alpha_inc_square: scalars[1],
            alpha_inc_dot_alpha: scalars[2],
            max_step: reduced.min[0],
        })
    }
}
