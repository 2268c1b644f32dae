// KMNIST CNN — Convolutional network for Kuzushiji-MNIST (or MNIST) (Hornet)
//
// Trains a small CNN one sample at a time on IDX-format image files.
//
// Architecture:
//   Convolutional(3×3, 8 filters) → MaxPooling(2×2, stride 2) → FullyConnected(10) → Softmax
//
//   [28, 28] → [26, 26, 8] → [13, 13, 8] → [10] → [10]
//
// Training: 12 epochs of per-sample SGD, learning rate 0.005 shrinking by a
// factor of 0.82 after every epoch, cross-entropy loss. The test split is
// evaluated once at the end.
//
// Usage:
//   cargo run --release -p kmnist-cnn-demo                              # synthetic data
//   cargo run --release -p kmnist-cnn-demo -- --data-dir path/to/kmnist # real IDX files
//   RUST_LOG=debug cargo run -p kmnist-cnn-demo -- --epochs 2           # layer-level logs

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use hornet::prelude::*;
use tracing_subscriber::EnvFilter;

type DynError = Box<dyn Error>;

#[derive(Parser, Debug)]
#[command(version, about = "Train a small CNN on IDX-format image data")]
struct Cli {
    /// Directory holding train-*/t10k-* IDX files. Synthetic data is used when omitted.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Training samples to load.
    #[arg(long, default_value_t = 6000)]
    train_limit: usize,

    /// Test samples to load.
    #[arg(long, default_value_t = 10000)]
    test_limit: usize,

    #[arg(long, default_value_t = 12)]
    epochs: usize,

    /// Learning rate of the first epoch.
    #[arg(long, default_value_t = 0.005)]
    lr: f64,

    /// Factor applied to the learning rate after each epoch.
    #[arg(long, default_value_t = 0.82)]
    lr_decay: f64,

    /// Samples between progress reports (0 disables them).
    #[arg(long, default_value_t = 100)]
    report_interval: usize,

    /// Seed for parameter initialization and shuffling.
    #[arg(long)]
    seed: Option<u64>,

    /// Synthetic samples per split when no data directory is given.
    #[arg(long, default_value_t = 600)]
    synthetic: usize,
}

fn load_data(cli: &Cli) -> std::result::Result<(IdxDataset, IdxDataset), IdxError> {
    match &cli.data_dir {
        Some(dir) => {
            println!("Loading IDX data from: {}", dir.display());
            let train = IdxDataset::load(dir, IdxSplit::Train, Some(cli.train_limit))?;
            let mut test = IdxDataset::load(dir, IdxSplit::Test, Some(cli.test_limit))?;
            // targets must index the same classes in both splits
            test.relabel(train.classes())?;
            Ok((train, test))
        }
        None => {
            println!(
                "Using synthetic data ({} train, {} test)",
                cli.synthetic, cli.synthetic
            );
            println!("  Tip: use --data-dir <path> for real IDX files");
            let seed = cli.seed.unwrap_or(0);
            let train = IdxDataset::synthetic(cli.synthetic, 28, 28, 10, seed)?;
            let test = IdxDataset::synthetic(cli.synthetic, 28, 28, 10, seed.wrapping_add(1))?;
            Ok((train, test))
        }
    }
}

fn build_network(input_dims: Shape, classes: usize, seed: Option<u64>) -> hornet::Result<Network> {
    let net = match seed {
        Some(seed) => Network::with_seed(input_dims, seed),
        None => Network::new(input_dims),
    };
    net.conv_square(3, 8)?
        .max_pool(&[2, 2], &[2, 2])?
        .fully_connected(classes)?
        .softmax()
}

fn main() -> std::result::Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("=== Hornet: KMNIST CNN ===");
    println!();

    let (train, test) = load_data(&cli)?;
    println!("  Train: {} images, {} classes", train.len(), train.classes().len());
    println!("  Test:  {} images", test.len());
    println!();

    let network = build_network(train.input_dims(), train.classes().len(), cli.seed)?;
    println!("{network}");
    println!();

    let mut config = TrainerConfig::default()
        .with_learning_rate(cli.lr)
        .with_lr_decay(cli.lr_decay)
        .with_report_interval(cli.report_interval);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    let mut trainer = Trainer::new(network, config);

    let result = trainer.fit(train.images(), train.targets(), cli.epochs)?;
    println!("{result}");
    println!();

    let eval = trainer.evaluate(test.images(), test.targets())?;
    println!("Test: {eval}");

    Ok(())
}
