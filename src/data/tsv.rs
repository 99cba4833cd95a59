//! Dense text dataset implementation
//!
//! One sample per line, features separated by tabs or spaces and the label
//! in the last column. A leading header row is skipped when most of its
//! feature columns are not numeric. Zero entries are dropped so the samples
//! end up in the same sparse representation as LIBSVM input.

use crate::core::{Dataset, Result, SVMError, Sample, SparseVector};
use crate::data::{binarize_label, parse_finite};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for dense tab separated files
#[derive(Debug, Clone)]
pub struct TSVDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl TSVDataset {
    /// Load a dataset from a TSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = 0;
        let mut first_data_line = true;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if first_data_line {
                first_data_line = false;
                if Self::is_header_line(line) {
                    continue;
                }
            }

            let (sample, width) = Self::parse_data_line(line).map_err(|e| {
                SVMError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            if !samples.is_empty() && width != dimensions {
                return Err(SVMError::DimensionMismatch {
                    expected: dimensions,
                    actual: width,
                });
            }
            dimensions = width;
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(TSVDataset {
            samples,
            dimensions,
        })
    }

    /// Check if a line appears to be a header
    fn is_header_line(line: &str) -> bool {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return false;
        }

        let non_numeric = fields
            .iter()
            .take(fields.len() - 1)
            .filter(|field| field.parse::<f64>().is_err())
            .count();

        non_numeric > fields.len() / 2
    }

    /// Parse a data line, returning the sample and its feature count
    fn parse_data_line(line: &str) -> Result<(Sample, usize)> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (label_str, feature_fields) = match fields.split_last() {
            Some((label, features)) if !features.is_empty() => (*label, features),
            _ => {
                return Err(SVMError::ParseError(format!(
                    "Line has too few fields: {line}"
                )))
            }
        };

        let label = parse_finite(label_str)
            .ok_or_else(|| SVMError::ParseError(format!("Invalid label: {label_str}")))?;

        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (idx, field) in feature_fields.iter().enumerate() {
            let value = parse_finite(field).ok_or_else(|| {
                SVMError::ParseError(format!(
                    "Invalid feature value at column {}: {}",
                    idx + 1,
                    field
                ))
            })?;
            if value != 0.0 {
                indices.push(idx);
                values.push(value);
            }
        }

        Ok((
            Sample::new(SparseVector::new(indices, values), binarize_label(label)),
            feature_fields.len(),
        ))
    }
}

impl Dataset for TSVDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn get_labels(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.label).collect()
    }
}
