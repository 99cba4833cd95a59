//! Accuracy and confusion-matrix evaluation of a linear classifier
//!
//! A sample counts as correct only when `y · (w.x + b) > 0`; a decision value
//! of exactly zero is an error for both classes. Evaluation never mutates the
//! model, so repeated calls on the same data give identical results.

use crate::comm::Communicator;
use crate::core::{Result, Sample};
use crate::model::LinearModel;

fn is_correct(model: &LinearModel, sample: &Sample) -> bool {
    sample.label * model.decision_value(sample) > 0.0
}

/// Fraction of `samples` classified correctly by `model` (0 for no samples)
pub fn accuracy(model: &LinearModel, samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let correct = samples.iter().filter(|s| is_correct(model, s)).count();
    correct as f64 / samples.len() as f64
}

/// Evaluates a frozen model over the shards of a job
pub struct Evaluator<'a> {
    model: &'a LinearModel,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a LinearModel) -> Self {
        Self { model }
    }

    /// Count this worker's correct predictions and sum-reduce them with the
    /// other workers. Every worker gets the global accuracy.
    pub fn evaluate_shard<C: Communicator + ?Sized>(
        &self,
        comm: &mut C,
        samples: &[Sample],
    ) -> Result<f64> {
        let correct = samples.iter().filter(|s| is_correct(self.model, s)).count();
        let totals = comm.sum_reduce(vec![correct as f64, samples.len() as f64])?;
        Ok(if totals[1] > 0.0 {
            totals[0] / totals[1]
        } else {
            0.0
        })
    }

    /// Confusion matrix over `samples`
    pub fn evaluate_detailed(&self, samples: &[Sample]) -> EvaluationMetrics {
        let mut metrics = EvaluationMetrics::default();
        for sample in samples {
            let actual = sample.label > 0.0;
            // a zero decision value is wrong for either class
            let predicted = if is_correct(self.model, sample) {
                actual
            } else {
                !actual
            };
            match (predicted, actual) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{cluster, LocalCommunicator};
    use crate::core::SparseVector;
    use std::thread;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![-3.0]), 1.0),
            // decision value exactly zero
            Sample::new(SparseVector::new(vec![0], vec![0.0]), -1.0),
        ]
    }

    #[test]
    fn test_accuracy_counts_zero_margin_as_error() {
        let model = LinearModel::new(vec![1.0], 0.0).unwrap();
        assert_eq!(accuracy(&model, &samples()), 0.5);
        assert_eq!(accuracy(&model, &[]), 0.0);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let model = LinearModel::new(vec![1.0], 0.0).unwrap();
        let before = model.clone();
        let first = accuracy(&model, &samples());
        let second = accuracy(&model, &samples());
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(model, before);
    }

    #[test]
    fn test_evaluate_shard_reduces_counts() {
        let model = LinearModel::new(vec![1.0], 0.0).unwrap();
        let data = samples();
        let shards = [&data[..1], &data[1..]];
        let (coordinator, comms) = cluster(2).unwrap();

        let results = thread::scope(|s| {
            s.spawn(move || coordinator.run());
            let handles: Vec<_> = comms
                .into_iter()
                .zip(shards)
                .map(|(mut comm, shard)| {
                    let evaluator = Evaluator::new(&model);
                    s.spawn(move || evaluator.evaluate_shard(&mut comm, shard).unwrap())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert_eq!(results, vec![0.5, 0.5]);

        let mut local = LocalCommunicator::new();
        let single = Evaluator::new(&model)
            .evaluate_shard(&mut local, &data)
            .unwrap();
        assert_eq!(single, 0.5);
    }

    #[test]
    fn test_detailed_metrics() {
        let model = LinearModel::new(vec![1.0], 0.0).unwrap();
        let metrics = Evaluator::new(&model).evaluate_detailed(&samples());
        assert_eq!(metrics, EvaluationMetrics::new(1, 1, 1, 1));
        assert_eq!(metrics.accuracy(), accuracy(&model, &samples()));
        assert_eq!(metrics.precision(), 0.5);
        assert_eq!(metrics.recall(), 0.5);
        assert_eq!(metrics.specificity(), 0.5);
        assert!(metrics.f1_score() > 0.0);
    }

    #[test]
    fn test_metric_ratios() {
        let metrics = EvaluationMetrics::new(10, 5, 2, 3);
        assert_eq!(metrics.accuracy(), 0.75);
        assert_eq!(metrics.precision(), 10.0 / 12.0);
        assert_eq!(metrics.recall(), 10.0 / 13.0);
        assert_eq!(metrics.specificity(), 5.0 / 7.0);
        assert_eq!(EvaluationMetrics::default().accuracy(), 0.0);
    }
}
