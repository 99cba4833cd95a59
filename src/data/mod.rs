//! Data loading and dataset implementations
//!
//! Two on-disk formats are understood: the sparse LIBSVM text format and a
//! dense whitespace separated format with the label in the last column.

pub mod libsvm;
pub mod tsv;

pub use self::libsvm::*;
pub use self::tsv::*;

use crate::core::{Dataset, Result, SVMError};
use log::warn;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Input file format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    LibSvm,
    Tsv,
}

impl DataFormat {
    /// Guess the format from the file extension, falling back to LIBSVM
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tsv") | Some("txt") => DataFormat::Tsv,
            Some("libsvm") | Some("svm") => DataFormat::LibSvm,
            _ => {
                warn!("Cannot infer format of {path:?}, assuming LibSVM");
                DataFormat::LibSvm
            }
        }
    }

    /// Resolve a CLI selector where `auto` means detection by extension
    pub fn resolve(selector: &str, path: &Path) -> Result<Self> {
        if selector == "auto" {
            Ok(Self::detect(path))
        } else {
            selector.parse()
        }
    }

    /// Load a dataset in this format
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Dataset>> {
        Ok(match self {
            DataFormat::LibSvm => Box::new(LibSVMDataset::from_file(path)?),
            DataFormat::Tsv => Box::new(TSVDataset::from_file(path)?),
        })
    }
}

impl FromStr for DataFormat {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "libsvm" => Ok(DataFormat::LibSvm),
            "tsv" => Ok(DataFormat::Tsv),
            other => Err(SVMError::InvalidParameter(format!(
                "Unsupported format: {other}. Use 'libsvm' or 'tsv'"
            ))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::LibSvm => f.write_str("libsvm"),
            DataFormat::Tsv => f.write_str("tsv"),
        }
    }
}

/// Parse a finite `f64`; `nan`, `inf` and friends are rejected
pub(crate) fn parse_finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Map any numeric label onto {-1, +1}: positive values become +1
pub(crate) fn binarize_label(label: f64) -> f64 {
    if label > 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_detection() {
        assert_eq!(DataFormat::detect(&PathBuf::from("a.tsv")), DataFormat::Tsv);
        assert_eq!(
            DataFormat::detect(&PathBuf::from("a.libsvm")),
            DataFormat::LibSvm
        );
        assert_eq!(DataFormat::detect(&PathBuf::from("a.svm")), DataFormat::LibSvm);
        assert_eq!(DataFormat::detect(&PathBuf::from("a")), DataFormat::LibSvm);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("libsvm".parse::<DataFormat>().unwrap(), DataFormat::LibSvm);
        assert_eq!("TSV".parse::<DataFormat>().unwrap(), DataFormat::Tsv);
        assert!(matches!(
            "csv".parse::<DataFormat>(),
            Err(SVMError::InvalidParameter(_))
        ));
        assert_eq!(
            DataFormat::resolve("auto", &PathBuf::from("x.tsv")).unwrap(),
            DataFormat::Tsv
        );
        assert_eq!(DataFormat::Tsv.to_string(), "tsv");
    }

    #[test]
    fn test_binarize_label() {
        assert_eq!(binarize_label(1.0), 1.0);
        assert_eq!(binarize_label(2.0), 1.0);
        assert_eq!(binarize_label(-1.0), -1.0);
        assert_eq!(binarize_label(0.0), -1.0);
    }

    #[test]
    fn test_parse_finite() {
        assert_eq!(parse_finite("-1.5e2"), Some(-150.0));
        assert_eq!(parse_finite("+1"), Some(1.0));
        for field in ["nan", "NaN", "inf", "-inf", "infinity", "1e400", "abc"] {
            assert_eq!(parse_finite(field), None, "{field}");
        }
    }
}
