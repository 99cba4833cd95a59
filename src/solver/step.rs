//! Globally agreed step along the aggregated direction
//!
//! Every worker runs [`StepCombiner::decide`] on the same reduced values and
//! its own copy of `w_orig`, which is identical everywhere, so all workers pick
//! the same `eta` without a further exchange.

use crate::solver::aggregate::GlobalIncrement;
use crate::utils::dense;

/// Outcome of the step computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepDecision {
    Apply(Step),
    /// The direction does not decrease the dual objective
    NoImprovingDirection { grad: f64 },
}

/// Step length plus the quadratic terms needed for objective tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub eta: f64,
    /// Directional derivative of the dual objective at `eta = 0`
    pub grad: f64,
    /// Curvature `alpha_inc^T (Q + diag I) alpha_inc`
    pub a_q_a: f64,
    /// `w_orig . w_inc`
    pub w_dot_w_inc: f64,
    /// `‖w_inc‖²`
    pub w_inc_square: f64,
}

pub struct StepCombiner;

impl StepCombiner {
    pub fn decide(w_orig: &[f64], global: &GlobalIncrement) -> StepDecision {
        let w_dot_w_inc = dense::dot(w_orig, &global.w_inc);
        let grad = w_dot_w_inc + global.alpha_inc_dot_alpha - global.sum_alpha_inc;
        if grad >= 0.0 {
            return StepDecision::NoImprovingDirection { grad };
        }

        // grad < 0 implies some alpha_inc_i != 0, hence a_q_a >= diag · inc² > 0
        let w_inc_square = dense::norm_squared(&global.w_inc);
        let a_q_a = global.alpha_inc_square + w_inc_square;
        let eta = global.max_step.min(-grad / a_q_a);

        StepDecision::Apply(Step {
            eta,
            grad,
            a_q_a,
            w_dot_w_inc,
            w_inc_square,
        })
    }
}

impl Step {
    /// `alpha = alpha_orig + eta · alpha_inc`
    pub fn apply_alpha(&self, alpha: &mut [f64], alpha_orig: &[f64], alpha_inc: &[f64]) {
        for ((a, &orig), &inc) in alpha.iter_mut().zip(alpha_orig).zip(alpha_inc) {
            let value = orig + self.eta * inc;
            *a = if inc < 0.0 && value < 0.0 {
                // eta = -orig / inc binds here; rounding can undershoot zero
                debug_assert!(
                    value >= -1e-9 * orig.max(1.0),
                    "step left the feasible region: {value}"
                );
                0.0
            } else {
                value
            };
        }
    }

    /// `w = w_orig + eta · w_inc`
    pub fn apply_w(&self, w: &mut [f64], w_orig: &[f64], w_inc: &[f64]) {
        dense::combine_into(w, w_orig, self.eta, w_inc);
    }

    /// Change of the dual objective caused by this step
    pub fn dual_change(&self) -> f64 {
        self.eta * (0.5 * self.eta * self.a_q_a + self.grad)
    }

    /// Change of `0.5 ‖w‖²` caused by this step
    pub fn regularizer_change(&self) -> f64 {
        self.eta * (self.w_dot_w_inc + 0.5 * self.eta * self.w_inc_square)
    }
}

/// Running dual objective and primal regularizer, updated per step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObjectiveTracker {
    dual: f64,
    regularizer: f64,
}

impl ObjectiveTracker {
    /// Values at `alpha = 0, w = 0`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, step: &Step) {
        self.dual += step.dual_change();
        self.regularizer += step.regularizer_change();
    }

    /// `0.5 alpha^T (Q + diag I) alpha - e^T alpha`
    pub fn dual(&self) -> f64 {
        self.dual
    }

    /// `0.5 ‖w‖²`
    pub fn regularizer(&self) -> f64 {
        self.regularizer
    }
}
