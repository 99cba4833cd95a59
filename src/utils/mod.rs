//! Utility functions shared by the solver, the evaluator and the CLI

use crate::core::{Dataset, Sample};

/// Dense vector arithmetic on `f64` slices
pub mod dense {
    /// Inner product of two equally long vectors
    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    /// Squared L2 norm
    pub fn norm_squared(a: &[f64]) -> f64 {
        a.iter().map(|x| x * x).sum()
    }

    /// `out[i] = base[i] + scale * dir[i]`
    pub fn combine_into(out: &mut [f64], base: &[f64], scale: f64, dir: &[f64]) {
        debug_assert_eq!(out.len(), base.len());
        debug_assert_eq!(out.len(), dir.len());
        for ((o, &b), &d) in out.iter_mut().zip(base).zip(dir) {
            *o = b + scale * d;
        }
    }

    /// `out[i] = a[i] - b[i]`
    pub fn diff_into(out: &mut [f64], a: &[f64], b: &[f64]) {
        debug_assert_eq!(out.len(), a.len());
        debug_assert_eq!(out.len(), b.len());
        for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *o = x - y;
        }
    }

    /// True when no component is NaN or infinite
    pub fn all_finite(a: &[f64]) -> bool {
        a.iter().all(|x| x.is_finite())
    }

    /// Largest absolute componentwise difference
    pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }
}

/// Validation and preprocessing utilities
pub mod validation {
    use super::*;
    use crate::core::{Result, SVMError};

    /// Validate that every label is exactly -1 or +1
    pub fn validate_binary_labels(samples: &[Sample]) -> Result<()> {
        match samples
            .iter()
            .find(|s| s.label != 1.0 && s.label != -1.0)
        {
            Some(sample) => Err(SVMError::InvalidLabel(sample.label)),
            None => Ok(()),
        }
    }

    /// Validate that every stored feature value is finite
    pub fn validate_finite_features(samples: &[Sample]) -> Result<()> {
        for (i, sample) in samples.iter().enumerate() {
            if let Some(pos) = sample.features.values.iter().position(|v| !v.is_finite()) {
                return Err(SVMError::InvalidDataset(format!(
                    "sample {} has non-finite value {} at feature {}",
                    i, sample.features.values[pos], sample.features.indices[pos]
                )));
            }
        }
        Ok(())
    }

    /// Count positive and negative labels and their ratio
    pub fn check_label_balance<D: Dataset + ?Sized>(dataset: &D) -> (usize, usize, f64) {
        let labels = dataset.get_labels();
        let positive_count = labels.iter().filter(|&&l| l > 0.0).count();
        let negative_count = labels.len() - positive_count;
        let balance_ratio = if negative_count == 0 {
            f64::INFINITY
        } else {
            positive_count as f64 / negative_count as f64
        };
        (positive_count, negative_count, balance_ratio)
    }
}

/// Statistical utilities for datasets
pub mod stats {
    use super::*;

    /// Calculate basic statistics for sparse vectors in a dataset
    pub fn sparse_vector_stats(samples: &[Sample]) -> SparseVectorStats {
        if samples.is_empty() {
            return SparseVectorStats::default();
        }

        let nnz_values: Vec<usize> = samples.iter().map(|s| s.features.nnz()).collect();

        let total_nnz: usize = nnz_values.iter().sum();
        let mean_nnz = total_nnz as f64 / samples.len() as f64;

        let max_nnz = *nnz_values.iter().max().unwrap_or(&0);
        let min_nnz = *nnz_values.iter().min().unwrap_or(&0);

        let variance = if samples.len() > 1 {
            nnz_values
                .iter()
                .map(|&x| (x as f64 - mean_nnz).powi(2))
                .sum::<f64>()
                / (samples.len() - 1) as f64
        } else {
            0.0
        };

        SparseVectorStats {
            mean_nnz,
            min_nnz,
            max_nnz,
            variance_nnz: variance,
            total_samples: samples.len(),
        }
    }
}

/// Statistics for sparse vector analysis
#[derive(Debug, Clone, Default)]
pub struct SparseVectorStats {
    pub mean_nnz: f64,
    pub min_nnz: usize,
    pub max_nnz: usize,
    pub variance_nnz: f64,
    pub total_samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SVMError, SparseVector};
    use crate::data::LibSVMDataset;

    #[test]
    fn test_dense_helpers() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, -5.0, 6.0];
        assert_eq!(dense::dot(&a, &b), 12.0);
        assert_eq!(dense::norm_squared(&a), 14.0);

        let mut out = [0.0; 3];
        dense::combine_into(&mut out, &a, 0.5, &b);
        assert_eq!(out, [3.0, -0.5, 6.0]);

        dense::diff_into(&mut out, &b, &a);
        assert_eq!(out, [3.0, -7.0, 3.0]);

        assert_eq!(dense::max_abs_diff(&a, &b), 7.0);
        assert!(dense::all_finite(&a));
        assert!(!dense::all_finite(&[1.0, f64::NAN]));
        assert!(!dense::all_finite(&[f64::INFINITY]));
    }

    #[test]
    fn test_validate_binary_labels() {
        let good = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![2.0]), -1.0),
        ];
        assert!(validation::validate_binary_labels(&good).is_ok());

        let bad = vec![Sample::new(SparseVector::new(vec![0], vec![1.0]), 0.5)];
        assert!(matches!(
            validation::validate_binary_labels(&bad),
            Err(SVMError::InvalidLabel(l)) if l == 0.5
        ));
    }

    #[test]
    fn test_validate_finite_features() {
        let good = vec![Sample::new(SparseVector::new(vec![0, 3], vec![1.0, -2.0]), 1.0)];
        assert!(validation::validate_finite_features(&good).is_ok());

        for bad_value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let bad = vec![
                good[0].clone(),
                Sample::new(SparseVector::new(vec![0, 2], vec![1.0, bad_value]), -1.0),
            ];
            match validation::validate_finite_features(&bad) {
                Err(SVMError::InvalidDataset(msg)) => {
                    assert!(msg.contains("sample 1"), "{msg}");
                    assert!(msg.contains("feature 2"), "{msg}");
                }
                other => panic!("expected InvalidDataset, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_check_label_balance() {
        let dataset = LibSVMDataset::from_samples(vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![3.0]), -1.0),
        ])
        .unwrap();
        let (pos, neg, ratio) = validation::check_label_balance(&dataset);
        assert_eq!((pos, neg), (2, 1));
        assert_eq!(ratio, 2.0);

        let all_positive = LibSVMDataset::from_samples(vec![Sample::new(
            SparseVector::new(vec![0], vec![1.0]),
            1.0,
        )])
        .unwrap();
        let (_, _, ratio) = validation::check_label_balance(&all_positive);
        assert!(ratio.is_infinite());
    }

    #[test]
    fn test_sparse_vector_stats() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0, 1], vec![1.0, 2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0, 1, 2, 3], vec![1.0; 4]), -1.0),
        ];
        let stats = stats::sparse_vector_stats(&samples);
        assert_eq!(stats.total_samples, 2);
        assert_eq!(stats.min_nnz, 2);
        assert_eq!(stats.max_nnz, 4);
        assert_eq!(stats.mean_nnz, 3.0);
        assert_eq!(stats.variance_nnz, 2.0);

        let empty = stats::sparse_vector_stats(&[]);
        assert_eq!(empty.total_samples, 0);
    }
}
