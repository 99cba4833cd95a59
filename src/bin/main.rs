//! bqo-svm Command Line Interface
//!
//! Train linear SVMs on several worker threads, then predict, evaluate and
//! inspect the saved models. LIBSVM and dense TSV inputs are supported.

use bqo_svm::api::SVM;
use bqo_svm::core::{Result, VisitOrder};
use bqo_svm::data::DataFormat;
use bqo_svm::persistence::SerializableModel;
use bqo_svm::utils::{stats, validation};
use bqo_svm::Dataset;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "bqo-svm")]
#[command(about = "Distributed L2-loss linear SVM trainer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file
    #[arg(long)]
    data: PathBuf,

    /// Optional test data file, evaluated after training
    #[arg(long)]
    test: Option<PathBuf>,

    /// Data format: auto, libsvm, or tsv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Maximum number of outer iterations
    #[arg(long, default_value = "200")]
    max_iter: usize,

    /// Local passes per outer iteration
    #[arg(long, default_value = "10")]
    max_inner_iter: usize,

    /// Duality gap at which training stops
    #[arg(long, default_value = "1e-6")]
    tolerance: f64,

    /// Number of worker threads
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Base seed of the coordinate visiting order
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Visit coordinates in file order instead of a random permutation
    #[arg(long)]
    sequential: bool,

    /// Output model file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Data format: auto, libsvm, or tsv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show decision values
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Data format: auto, libsvm, or tsv
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_dataset(path: &Path, format: &str) -> Result<Box<dyn Dataset>> {
    let format = DataFormat::resolve(format, path)?;
    info!("Loading {path:?} as {format} format");
    let dataset = format.load(path)?;
    info!(
        "Loaded {} samples with {} features",
        dataset.len(),
        dataset.dim()
    );
    Ok(dataset)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let train = load_dataset(&args.data, &args.format)?;
    let test = match &args.test {
        Some(path) => Some(load_dataset(path, &args.format)?),
        None => None,
    };

    log_sparsity(&*train);
    let (positive, negative, ratio) = validation::check_label_balance(&*train);
    info!("Labels: {positive} positive, {negative} negative");
    if !(0.1..=10.0).contains(&ratio) {
        warn!("Training labels are heavily imbalanced ({positive} vs {negative})");
    }

    // train and test must share one feature space
    let dim = test
        .as_ref()
        .map_or(train.dim(), |t| t.dim().max(train.dim()));

    let visit_order = if args.sequential {
        VisitOrder::Sequential
    } else {
        VisitOrder::Random
    };
    info!(
        "Parameters: C={}, max_iter={}, max_inner_iter={}, workers={}",
        args.c, args.max_iter, args.max_inner_iter, args.workers
    );

    let model = SVM::new()
        .with_c(args.c)
        .with_max_iterations(args.max_iter)
        .with_inner_iterations(args.max_inner_iter)
        .with_tolerance(args.tolerance)
        .with_workers(args.workers)
        .with_seed(args.seed)
        .with_visit_order(visit_order)
        .train_with_dim(&*train, dim)?;

    let info = model.info();
    println!(
        "Training finished: {} after {} iterations (duality gap {:.3e})",
        info.state, info.iterations, info.duality_gap
    );
    println!(
        "Training accuracy: {:.2}%",
        model.evaluate(&*train) * 100.0
    );
    if let Some(test) = &test {
        println!("Test accuracy: {:.2}%", model.evaluate(&**test) * 100.0);
    }

    if let Some(output) = &args.output {
        SerializableModel::from_trained_model(&model).save_to_file(output)?;
        info!("Model saved to: {output:?}");
    }

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = SerializableModel::load_from_file(&args.model)?.to_trained_model()?;
    let dataset = load_dataset(&args.data, &args.format)?;
    let predictions = model.predict_dataset(&*dataset);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    writeln!(out, "# Predictions for {} samples", predictions.len())?;
    writeln!(
        out,
        "# Format: sample_index predicted_label{}",
        if args.confidence { " decision_value" } else { "" }
    )?;
    for (i, pred) in predictions.iter().enumerate() {
        if args.confidence {
            writeln!(out, "{} {:.0} {:.6}", i, pred.label, pred.decision_value)?;
        } else {
            writeln!(out, "{} {:.0}", i, pred.label)?;
        }
    }
    out.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_trained_model()?;
    let dataset = load_dataset(&args.data, &args.format)?;

    if dataset.dim() > serializable_model.dim {
        warn!(
            "Test data has {} features, model was trained on {}; extra features are ignored",
            dataset.dim(),
            serializable_model.dim
        );
    }

    println!("=== Model Evaluation ===");
    serializable_model.print_summary();

    println!("\nTest Results:");
    println!(
        "  Accuracy: {:.2}%",
        model.evaluate(&*dataset) * 100.0
    );

    if args.detailed {
        let metrics = model.evaluate_detailed(&*dataset);
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    serializable_model.print_summary();

    let weights = &serializable_model.weights[..serializable_model.dim];
    let mut largest: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
    largest.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    println!("\nLargest weights:");
    for (index, weight) in largest.iter().take(10) {
        // LIBSVM feature numbers are 1-based
        println!("  w[{}] = {weight:.6}", index + 1);
    }
    if largest.len() > 10 {
        println!("  ... ({} more)", largest.len() - 10);
    }

    Ok(())
}

fn log_sparsity(dataset: &dyn Dataset) {
    let samples = dataset.get_batch(&(0..dataset.len()).collect::<Vec<_>>());
    let s = stats::sparse_vector_stats(&samples);
    info!(
        "Non-zeros per sample: mean {:.1} (sd {:.1}), min {}, max {}",
        s.mean_nnz,
        s.variance_nnz.sqrt(),
        s.min_nnz,
        s.max_nnz
    );
}
