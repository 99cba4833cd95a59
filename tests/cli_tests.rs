//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub libsvm_file: NamedTempFile,
    pub tsv_file: NamedTempFile,
    pub test_libsvm_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        // LibSVM training data
        let mut libsvm_file = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(libsvm_file, "+1 1:2.0 2:1.0")?;
        writeln!(libsvm_file, "-1 1:-2.0 2:-1.0")?;
        writeln!(libsvm_file, "+1 1:1.5 2:0.8")?;
        writeln!(libsvm_file, "-1 1:-1.5 2:-0.8")?;
        writeln!(libsvm_file, "+1 1:1.8 2:0.9")?;
        writeln!(libsvm_file, "-1 1:-1.8 2:-0.9")?;
        libsvm_file.flush()?;

        // The same points as dense TSV with a header
        let mut tsv_file = NamedTempFile::with_suffix(".tsv")?;
        writeln!(tsv_file, "feature1\tfeature2\tlabel")?;
        writeln!(tsv_file, "2.0\t1.0\t1")?;
        writeln!(tsv_file, "-2.0\t-1.0\t-1")?;
        writeln!(tsv_file, "1.5\t0.8\t1")?;
        writeln!(tsv_file, "-1.5\t-0.8\t-1")?;
        writeln!(tsv_file, "1.8\t0.9\t1")?;
        writeln!(tsv_file, "-1.8\t-0.9\t-1")?;
        tsv_file.flush()?;

        let mut test_libsvm_file = NamedTempFile::with_suffix(".libsvm")?;
        writeln!(test_libsvm_file, "+1 1:1.6 2:0.7")?;
        writeln!(test_libsvm_file, "-1 1:-1.6 2:-0.7")?;
        test_libsvm_file.flush()?;

        Ok(TestDataFiles {
            libsvm_file,
            tsv_file,
            test_libsvm_file,
        })
    }
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bqo-svm"))
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

/// Train on `data` and save the model inside `dir`
fn train_model(dir: &TempDir, data: &Path, extra: &[&str]) -> std::path::PathBuf {
    let model_path = dir.path().join("model.json");
    let mut args = vec![
        "train",
        "--data",
        path_str(data),
        "--output",
        path_str(&model_path),
    ];
    args.extend_from_slice(extra);

    let output = run_cli(&args);
    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(model_path.exists(), "Model file was not created");
    model_path
}

#[test]
fn test_cli_train_command_libsvm() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_files.libsvm_file.path()),
        "--format",
        "libsvm",
        "-C",
        "1.0",
    ]);

    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Training finished"));
    assert!(stdout.contains("Training accuracy: 100.00%"));
}

#[test]
fn test_cli_train_command_tsv() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(
        &temp_dir,
        test_files.tsv_file.path(),
        &["--format", "tsv", "--workers", "2"],
    );

    let content = std::fs::read_to_string(model_path).expect("Failed to read model");
    assert!(content.contains("\"weights\""));
    assert!(content.contains("\"dim\": 2"));
}

#[test]
fn test_cli_train_with_workers_and_test_set() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    for workers in ["1", "3"] {
        let output = run_cli(&[
            "train",
            "--data",
            path_str(test_files.libsvm_file.path()),
            "--test",
            path_str(test_files.test_libsvm_file.path()),
            "--workers",
            workers,
            "--sequential",
        ]);

        assert!(output.status.success(), "workers = {workers}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("converged"), "stdout: {stdout}");
        assert!(stdout.contains("Test accuracy: 100.00%"));
    }
}

#[test]
fn test_cli_train_auto_format_detection() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    for data in [test_files.libsvm_file.path(), test_files.tsv_file.path()] {
        let output = run_cli(&["train", "--data", path_str(data)]);
        assert!(
            output.status.success(),
            "Auto detection failed for {data:?}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn test_cli_info_command() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&temp_dir, test_files.libsvm_file.path(), &[]);

    let output = run_cli(&["info", path_str(&model_path)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Linear SVM Model Summary"));
    assert!(stdout.contains("Features: 2"));
    assert!(stdout.contains("Largest weights:"));
    assert!(stdout.contains("w[1]"));
}

#[test]
fn test_cli_predict_command() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&temp_dir, test_files.libsvm_file.path(), &[]);
    let predictions_path = temp_dir.path().join("predictions.txt");

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_files.test_libsvm_file.path()),
        "--output",
        path_str(&predictions_path),
    ]);
    assert!(output.status.success());

    let content = std::fs::read_to_string(predictions_path).expect("Failed to read predictions");
    assert!(content.contains("# Predictions for 2 samples"));
    let lines: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, vec!["0 1", "1 -1"]);
}

#[test]
fn test_cli_predict_stdout_with_confidence() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&temp_dir, test_files.libsvm_file.path(), &[]);

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_files.test_libsvm_file.path()),
        "--confidence",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("decision_value"));
    let first = stdout
        .lines()
        .find(|l| l.starts_with("0 "))
        .expect("prediction for sample 0");
    let fields: Vec<&str> = first.split_whitespace().collect();
    assert_eq!(fields.len(), 3);
    let decision: f64 = fields[2].parse().expect("numeric decision value");
    assert!(decision > 0.0);
}

#[test]
fn test_cli_evaluate_command() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&temp_dir, test_files.libsvm_file.path(), &[]);

    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_files.test_libsvm_file.path()),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Model Evaluation ==="));
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(!stdout.contains("Detailed Metrics"));
}

#[test]
fn test_cli_evaluate_detailed() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&temp_dir, test_files.tsv_file.path(), &[]);

    // model trained on TSV, evaluated on LIBSVM
    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_files.test_libsvm_file.path()),
        "--detailed",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Detailed Metrics"));
    assert!(stdout.contains("True Positives:  1"));
    assert!(stdout.contains("F1 Score:        1.0000"));
}

#[test]
fn test_cli_error_handling_invalid_file() {
    let output = run_cli(&["train", "--data", "/nonexistent/file.libsvm"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_cli_error_handling_invalid_format() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_files.libsvm_file.path()),
        "--format",
        "csv",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported format"));
}

#[test]
fn test_cli_rejects_bad_parameters() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    for args in [["-C", "0"], ["--workers", "0"], ["--max-inner-iter", "0"]] {
        let mut cli_args = vec!["train", "--data", path_str(test_files.libsvm_file.path())];
        cli_args.extend_from_slice(&args);
        let output = run_cli(&cli_args);
        assert!(!output.status.success(), "{args:?} should fail");
    }
}

#[test]
fn test_cli_rejects_corrupt_model() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let mut model_file = NamedTempFile::with_suffix(".json").expect("Failed to create model");
    writeln!(model_file, "{{\"weights\": [1.0]}}").expect("Failed to write");

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(model_file.path()),
        "--data",
        path_str(test_files.test_libsvm_file.path()),
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_verbose_and_debug_flags() {
    let test_files = TestDataFiles::new().expect("Failed to create test files");
    let output = run_cli(&[
        "--verbose",
        "train",
        "--data",
        path_str(test_files.libsvm_file.path()),
    ]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Loaded 6 samples"));

    let output = run_cli(&[
        "--debug",
        "train",
        "--data",
        path_str(test_files.libsvm_file.path()),
    ]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("iteration"));
}

#[test]
fn test_cli_help_output() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "predict", "evaluate", "info"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_version_output() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
