//! Epoch orchestration over the minibatch pipeline.
//!
//! The trainer owns the loop structure: shuffled index batches, train-time
//! leakage masks, symmetrized evaluation, early stopping and checkpoint
//! reload. The model behind [`PairModel`] owns everything learned. Loss
//! ratios are opaque configuration; no scheduling happens here.

use crate::checkpoint::Checkpoint;
use crate::data::{DdiDataset, Split, SplitKind};
use crate::error::Result;
use crate::metrics::{
    bce_loss, micro_average_precision, micro_roc_auc, mse_loss, RegressionMetrics,
};
use crate::model::{BatchLabels, ModelInput, PairModel};
use crate::stopping::{EarlyStopping, StopSignal};
use ndarray::{Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::path::Path;
use std::time::Instant;
use synergraph_core::{assemble_minibatch, BatchIndexGenerator, DrugPair, PerSide};
use tracing::{debug, info};

/// Training configuration.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Samples per training batch (default: 32).
    pub batch_size: usize,
    /// Neighbors kept per anchor and metapath, `None` for all (default: 100).
    pub neighbor_samples: Option<usize>,
    /// Maximum number of epochs (default: 20).
    pub epochs: usize,
    /// Early-stopping patience in epochs (default: 8).
    pub patience: usize,
    /// Seed for batch shuffling and neighbor subsampling (default: 1024).
    pub seed: u64,
    /// Weight of the therapeutic-effect loss (default: 1.0).
    pub loss_ratio_te: f64,
    /// Weight of the side-effect loss (default: 1.0).
    pub loss_ratio_se: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            neighbor_samples: Some(100),
            epochs: 20,
            patience: 8,
            seed: 1024,
            loss_ratio_te: 1.0,
            loss_ratio_se: 1.0,
        }
    }
}

impl TrainConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_neighbor_samples(mut self, samples: Option<usize>) -> Self {
        self.neighbor_samples = samples;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_loss_ratios(mut self, te: f64, se: f64) -> Self {
        self.loss_ratio_te = te;
        self.loss_ratio_se = se;
        self
    }
}

/// Training-time exclusion masks: only the direct drug-drug template (the
/// last metapath) encodes the predicted link and gets masked.
pub fn leak_masks(num_metapaths: usize) -> PerSide<Vec<bool>> {
    let mut flags = vec![false; num_metapaths];
    if let Some(last) = flags.last_mut() {
        *last = true;
    }
    PerSide::splat(flags)
}

/// Evaluation-time masks: nothing is excluded.
pub fn no_masks(num_metapaths: usize) -> PerSide<Vec<bool>> {
    PerSide::splat(vec![false; num_metapaths])
}

/// Metrics of one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvalReport {
    /// Weighted total loss.
    pub loss: f64,
    /// Therapeutic-effect regression metrics.
    pub te: RegressionMetrics,
    /// Micro-averaged side-effect AUROC, when both classes occur.
    pub se_auroc: Option<f64>,
    /// Micro-averaged side-effect AUPRC, when positives occur.
    pub se_auprc: Option<f64>,
    /// Number of samples evaluated.
    pub num_samples: usize,
}

/// Outcome of one full training run.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Epochs actually run (≤ configured epochs under early stopping).
    pub epochs_run: usize,
    /// Epoch of the reloaded best checkpoint.
    pub best_epoch: usize,
    /// Validation loss of the best checkpoint.
    pub best_val_loss: f64,
    /// Validation loss per epoch.
    pub val_losses: Vec<f64>,
    /// Test metrics of the best checkpoint.
    pub test: EvalReport,
}

/// Drives training and evaluation of a [`PairModel`] over a dataset.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train until the epoch limit or patience is exhausted, keeping the
    /// best-validation checkpoint at `checkpoint_path`, then reload it and
    /// report test metrics.
    pub fn fit<M: PairModel>(
        &self,
        dataset: &DdiDataset,
        model: &mut M,
        checkpoint_path: &Path,
    ) -> Result<FitReport> {
        let cfg = &self.config;
        let mut rng = XorShiftRng::seed_from_u64(cfg.seed);
        let generator_rng = XorShiftRng::seed_from_u64(cfg.seed.wrapping_add(1));
        let mut generator = BatchIndexGenerator::shuffled(
            cfg.batch_size,
            dataset.train.len(),
            Box::new(generator_rng),
        );
        let train_masks = leak_masks(dataset.num_metapaths());
        let mut stopping = EarlyStopping::new(cfg.patience);
        let mut val_losses = Vec::new();
        let mut best_epoch = 0;
        let mut epochs_run = 0;

        for epoch in 0..cfg.epochs {
            epochs_run = epoch + 1;
            let epoch_start = Instant::now();
            let mut loss_accum = 0.0;
            let mut batches = 0usize;

            for iteration in 0..generator.num_iterations() {
                let mut idx = generator.next_batch();
                idx.sort_unstable();
                let (pairs, cells, te, se) = gather_batch(&dataset.train, &idx);
                let minibatch = assemble_minibatch(
                    &dataset.tables,
                    &pairs,
                    cfg.neighbor_samples,
                    &train_masks,
                    dataset.offset(),
                    &mut rng,
                )?;
                let input = ModelInput {
                    minibatch: &minibatch,
                    pairs: &pairs,
                    cell_lines: &cells,
                };
                let labels = BatchLabels {
                    te: &te,
                    se: se.view(),
                };
                let prediction = model.train_step(&input, &labels)?;

                let te_loss = mse_loss(&prediction.te, &te);
                let se_loss = bce_loss(prediction.se.view(), se.view());
                let total = cfg.loss_ratio_te * te_loss + cfg.loss_ratio_se * se_loss;
                loss_accum += total;
                batches += 1;
                if iteration % 100 == 0 {
                    debug!(
                        "Epoch {:05} | Iteration {:05} | Train_Loss {:.4}",
                        epoch, iteration, total
                    );
                }
            }

            let val = self.evaluate_with(dataset, model, SplitKind::Val, &mut rng)?;
            val_losses.push(val.loss);
            info!(
                "Epoch {:05} | Train_Loss {:.4} | Val_Loss {:.4} | Time(s) {:.2}",
                epoch,
                loss_accum / batches.max(1) as f64,
                val.loss,
                epoch_start.elapsed().as_secs_f64()
            );

            match stopping.step(val.loss) {
                StopSignal::Improved => {
                    best_epoch = epoch;
                    Checkpoint {
                        epoch,
                        val_loss: val.loss,
                        params: model.params(),
                    }
                    .save(checkpoint_path)?;
                }
                StopSignal::NoImprovement { .. } => {}
                StopSignal::Stop => {
                    info!("Early stopping based on the validation loss after epoch {}", epoch);
                    break;
                }
            }
        }

        let checkpoint = Checkpoint::load(checkpoint_path)?;
        model.load_params(&checkpoint.params)?;
        let test = self.evaluate(dataset, model, SplitKind::Test)?;
        info!("Test | {}", test.te.summary());

        Ok(FitReport {
            epochs_run,
            best_epoch,
            best_val_loss: checkpoint.val_loss,
            val_losses,
            test,
        })
    }

    /// Evaluate one split with symmetrized pairs and a fresh seeded RNG.
    pub fn evaluate<M: PairModel>(
        &self,
        dataset: &DdiDataset,
        model: &M,
        kind: SplitKind,
    ) -> Result<EvalReport> {
        let mut rng = XorShiftRng::seed_from_u64(self.config.seed.wrapping_add(2));
        self.evaluate_with(dataset, model, kind, &mut rng)
    }

    /// Evaluation core: every pair is scored in both orientations and the
    /// two predictions are averaged before metric computation.
    fn evaluate_with<M: PairModel, R: Rng + ?Sized>(
        &self,
        dataset: &DdiDataset,
        model: &M,
        kind: SplitKind,
        rng: &mut R,
    ) -> Result<EvalReport> {
        let cfg = &self.config;
        let split = dataset.split(kind);
        let masks = no_masks(dataset.num_metapaths());
        let half = (cfg.batch_size / 2).max(1);
        let mut generator = BatchIndexGenerator::sequential(half, split.len());

        let num_effects = dataset.num_side_effects;
        let mut te_predictions = Vec::with_capacity(split.len());
        let mut te_labels = Vec::with_capacity(split.len());
        let mut se_predictions = Vec::with_capacity(split.len() * num_effects);
        let mut se_labels = Vec::with_capacity(split.len() * num_effects);

        for _ in 0..generator.num_iterations() {
            let idx = generator.next_batch();
            let (pairs, cells, te, se) = gather_batch(split, &idx);
            let n = pairs.len();

            let mut combined_pairs = pairs.clone();
            combined_pairs.extend(pairs.iter().map(|p| p.swapped()));
            let mut combined_cells = cells.clone();
            combined_cells.extend_from_slice(&cells);

            let minibatch = assemble_minibatch(
                &dataset.tables,
                &combined_pairs,
                cfg.neighbor_samples,
                &masks,
                dataset.offset(),
                rng,
            )?;
            let input = ModelInput {
                minibatch: &minibatch,
                pairs: &combined_pairs,
                cell_lines: &combined_cells,
            };
            let prediction = model.predict(&input)?;

            for i in 0..n {
                te_predictions.push((prediction.te[i] + prediction.te[i + n]) / 2.0);
                for j in 0..num_effects {
                    se_predictions.push((prediction.se[[i, j]] + prediction.se[[i + n, j]]) / 2.0);
                }
            }
            te_labels.extend_from_slice(&te);
            se_labels.extend(se.iter().copied());
        }

        let num_samples = te_labels.len();
        let se_predictions = Array2::from_shape_vec((num_samples, num_effects), se_predictions)
            .map_err(|e| crate::error::Error::Core(e.into()))?;
        let se_labels = Array2::from_shape_vec((num_samples, num_effects), se_labels)
            .map_err(|e| crate::error::Error::Core(e.into()))?;

        let te_loss = mse_loss(&te_predictions, &te_labels);
        let se_loss = bce_loss(se_predictions.view(), se_labels.view());
        Ok(EvalReport {
            loss: cfg.loss_ratio_te * te_loss + cfg.loss_ratio_se * se_loss,
            te: RegressionMetrics::from_pairs(&te_labels, &te_predictions),
            se_auroc: micro_roc_auc(se_labels.view(), se_predictions.view()),
            se_auprc: micro_average_precision(se_labels.view(), se_predictions.view()),
            num_samples,
        })
    }
}

fn gather_batch(
    split: &Split,
    idx: &[usize],
) -> (Vec<DrugPair>, Vec<usize>, Vec<f64>, Array2<f32>) {
    let pairs = idx.iter().map(|&i| split.pairs[i]).collect();
    let cells = idx.iter().map(|&i| split.cell_lines[i]).collect();
    let te = idx.iter().map(|&i| split.te_labels[i]).collect();
    let se = split.se_labels.select(Axis(0), idx);
    (pairs, cells, te, se)
}
