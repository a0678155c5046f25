//! Synergraph CLI - drive the metapath minibatch pipeline from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Inspect a prepared dataset
//! synergraph stats data/prepared.json
//!
//! # Dry-run minibatch assembly over one training epoch
//! synergraph batches data/prepared.json --batch-size 32 --samples 100
//!
//! # Train the label-statistics baseline with early stopping
//! synergraph train data/prepared.json --checkpoint checkpoint.bin \
//!     --epochs 20 --patience 8
//!
//! # Re-evaluate a saved checkpoint
//! synergraph evaluate data/prepared.json --checkpoint checkpoint.bin --split test
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::path::PathBuf;
use std::time::Instant;
use synergraph_core::{assemble_minibatch, BatchIndexGenerator, DrugPair, PairSide};
use synergraph_train::{
    leak_masks, no_masks, write_val_loss_csv, BaselineModel, Checkpoint, DdiDataset, PairModel,
    RegressionSummary, SplitKind, TrainConfig, Trainer,
};

#[derive(Parser)]
#[command(name = "synergraph")]
#[command(about = "Metapath minibatch pipeline for drug-pair prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a prepared dataset
    Stats {
        /// Prepared dataset (JSON)
        dataset: PathBuf,
    },

    /// Dry-run minibatch assembly over one training epoch
    Batches {
        /// Prepared dataset (JSON)
        dataset: PathBuf,

        /// Batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// Neighbors sampled per anchor and metapath (0 keeps all)
        #[arg(long, default_value = "100")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "1024")]
        seed: u64,

        /// Apply the training-time leakage masks
        #[arg(long)]
        masked: bool,
    },

    /// Train the label-statistics baseline model
    Train {
        /// Prepared dataset (JSON)
        dataset: PathBuf,

        /// Checkpoint output path
        #[arg(short, long, default_value = "checkpoint.bin")]
        checkpoint: PathBuf,

        /// Validation-loss CSV output path
        #[arg(long)]
        val_loss_csv: Option<PathBuf>,

        /// Batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// Neighbors sampled per anchor and metapath (0 keeps all)
        #[arg(long, default_value = "100")]
        samples: usize,

        /// Number of epochs
        #[arg(long, default_value = "20")]
        epochs: usize,

        /// Early-stopping patience
        #[arg(long, default_value = "8")]
        patience: usize,

        /// Random seed
        #[arg(long, default_value = "1024")]
        seed: u64,

        /// Repeat the run N times and report mean ± std
        #[arg(long, default_value = "1")]
        repeat: usize,

        /// Weight of the therapeutic-effect loss
        #[arg(long, default_value = "1.0")]
        loss_ratio_te: f64,

        /// Weight of the side-effect loss
        #[arg(long, default_value = "1.0")]
        loss_ratio_se: f64,
    },

    /// Evaluate a saved checkpoint
    Evaluate {
        /// Prepared dataset (JSON)
        dataset: PathBuf,

        /// Checkpoint to load
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Split to evaluate
        #[arg(long, default_value = "test")]
        split: SplitArg,

        /// Batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// Neighbors sampled per anchor and metapath (0 keeps all)
        #[arg(long, default_value = "100")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "1024")]
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Val,
    Test,
}

impl From<SplitArg> for SplitKind {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Train => SplitKind::Train,
            SplitArg::Val => SplitKind::Val,
            SplitArg::Test => SplitKind::Test,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Stats { dataset } => stats(&dataset),
        Commands::Batches {
            dataset,
            batch_size,
            samples,
            seed,
            masked,
        } => batches(&dataset, batch_size, samples, seed, masked),
        Commands::Train {
            dataset,
            checkpoint,
            val_loss_csv,
            batch_size,
            samples,
            epochs,
            patience,
            seed,
            repeat,
            loss_ratio_te,
            loss_ratio_se,
        } => train(
            &dataset,
            &checkpoint,
            val_loss_csv.as_deref(),
            TrainConfig::default()
                .with_batch_size(batch_size)
                .with_neighbor_samples(neighbor_samples(samples))
                .with_epochs(epochs)
                .with_patience(patience)
                .with_seed(seed)
                .with_loss_ratios(loss_ratio_te, loss_ratio_se),
            repeat,
        ),
        Commands::Evaluate {
            dataset,
            checkpoint,
            split,
            batch_size,
            samples,
            seed,
        } => evaluate(
            &dataset,
            &checkpoint,
            split.into(),
            TrainConfig::default()
                .with_batch_size(batch_size)
                .with_neighbor_samples(neighbor_samples(samples))
                .with_seed(seed),
        ),
    }
}

fn neighbor_samples(samples: usize) -> Option<usize> {
    if samples == 0 {
        None
    } else {
        Some(samples)
    }
}

fn load_dataset(path: &std::path::Path) -> Result<DdiDataset> {
    let start = Instant::now();
    let dataset = DdiDataset::from_json_file(path)
        .with_context(|| format!("failed to load dataset from {}", path.display()))?;
    println!("Loaded dataset in {:.2?}", start.elapsed());
    Ok(dataset)
}

fn stats(path: &std::path::Path) -> Result<()> {
    let ds = load_dataset(path)?;

    println!("Drugs:          {}", ds.num_drugs);
    println!("Targets:        {}", ds.num_targets);
    println!("Cell lines:     {}", ds.num_cell_lines);
    println!("Side effects:   {}", ds.num_side_effects);
    println!("Metapaths:      {}", ds.num_metapaths());
    for (metapath, adjacency) in ds.metapaths.iter().zip(ds.tables.side(PairSide::Row)) {
        println!(
            "  {:<12} width {} | anchors {} | instances {}",
            metapath.to_string(),
            adjacency.width(),
            adjacency.len(),
            adjacency.num_instances()
        );
    }
    println!(
        "Samples:        train {} | val {} | test {}",
        ds.train.len(),
        ds.val.len(),
        ds.test.len()
    );
    Ok(())
}

fn batches(
    path: &std::path::Path,
    batch_size: usize,
    samples: usize,
    seed: u64,
    masked: bool,
) -> Result<()> {
    let ds = load_dataset(path)?;
    let masks = if masked {
        leak_masks(ds.num_metapaths())
    } else {
        no_masks(ds.num_metapaths())
    };
    let mut rng = XorShiftRng::seed_from_u64(seed);
    let mut generator = BatchIndexGenerator::shuffled(
        batch_size,
        ds.train.len(),
        Box::new(XorShiftRng::seed_from_u64(seed.wrapping_add(1))),
    );

    let iterations = generator.num_iterations();
    let bar = ProgressBar::new(iterations as u64);
    let mut total_edges = 0usize;
    let mut total_nodes = 0usize;
    let mut empty_graphs = 0usize;
    let start = Instant::now();

    for _ in 0..iterations {
        let idx = generator.next_batch();
        let batch: Vec<DrugPair> = idx.iter().map(|&i| ds.train.pairs[i]).collect();
        let minibatch = assemble_minibatch(
            &ds.tables,
            &batch,
            neighbor_samples(samples),
            &masks,
            ds.offset(),
            &mut rng,
        )?;
        for side in PairSide::BOTH {
            for metapath in minibatch.side(side) {
                total_edges += metapath.num_edges();
                total_nodes += metapath.num_nodes();
                if metapath.num_edges() == 0 {
                    empty_graphs += 1;
                }
            }
        }
        bar.inc(1);
    }
    bar.finish();

    let graphs = iterations * 2 * ds.num_metapaths();
    println!("Assembled {} graphs in {:.2?}", graphs, start.elapsed());
    if graphs > 0 {
        println!(
            "Edges: {} (avg {:.1}/graph) | Nodes: {} (avg {:.1}/graph) | empty graphs: {}",
            total_edges,
            total_edges as f64 / graphs as f64,
            total_nodes,
            total_nodes as f64 / graphs as f64,
            empty_graphs
        );
    }
    Ok(())
}

fn train(
    path: &std::path::Path,
    checkpoint: &std::path::Path,
    val_loss_csv: Option<&std::path::Path>,
    config: TrainConfig,
    repeat: usize,
) -> Result<()> {
    let ds = load_dataset(path)?;
    let mut runs = Vec::new();

    for run in 0..repeat.max(1) {
        let run_config = config.clone().with_seed(config.seed.wrapping_add(run as u64));
        let trainer = Trainer::new(run_config);
        let mut model = BaselineModel::new(ds.num_side_effects);
        let report = trainer
            .fit(&ds, &mut model, checkpoint)
            .context("training failed")?;

        println!(
            "Run {} | best epoch {} | best val loss {:.4} | {} epochs",
            run, report.best_epoch, report.best_val_loss, report.epochs_run
        );
        println!("  Test | {}", report.test.te.summary());
        if let (Some(auroc), Some(auprc)) = (report.test.se_auroc, report.test.se_auprc) {
            println!("  Test | SE AUROC: {:.4} | SE AUPRC: {:.4}", auroc, auprc);
        }
        if let Some(csv) = val_loss_csv {
            write_val_loss_csv(csv, &report.val_losses)
                .with_context(|| format!("failed to write {}", csv.display()))?;
        }
        runs.push(report.test.te);
    }

    if runs.len() > 1 {
        println!("Summary | {}", RegressionSummary::from_runs(&runs).summary());
    }
    Ok(())
}

fn evaluate(
    path: &std::path::Path,
    checkpoint: &std::path::Path,
    split: SplitKind,
    config: TrainConfig,
) -> Result<()> {
    let ds = load_dataset(path)?;
    let snapshot = Checkpoint::load(checkpoint)
        .with_context(|| format!("failed to load checkpoint from {}", checkpoint.display()))?;
    let mut model = BaselineModel::new(ds.num_side_effects);
    model
        .load_params(&snapshot.params)
        .context("checkpoint does not fit the baseline model")?;

    let trainer = Trainer::new(config);
    let report = trainer.evaluate(&ds, &model, split)?;
    println!(
        "Evaluated {} samples | loss {:.4}",
        report.num_samples, report.loss
    );
    println!("{}", report.te.summary());
    if let Some(auroc) = report.se_auroc {
        println!("SE AUROC: {:.4}", auroc);
    }
    if let Some(auprc) = report.se_auprc {
        println!("SE AUPRC: {:.4}", auprc);
    }
    Ok(())
}
