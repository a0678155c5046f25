//! The seam between the minibatch pipeline and the learned network.
//!
//! The attention/aggregation stack lives outside this workspace; anything
//! that can map an assembled [`Minibatch`] to per-sample predictions plugs
//! in through [`PairModel`]. The trainer owns batching, loss computation
//! and checkpointing; models own the forward/backward math.

use crate::checkpoint::ParamTable;
use crate::error::Result;
use ndarray::{Array2, ArrayView2};
use synergraph_core::{DrugPair, Minibatch};

/// One assembled batch as seen by a model.
#[derive(Debug)]
pub struct ModelInput<'a> {
    /// Batch-local metapath graphs with edge-aligned instance indices.
    pub minibatch: &'a Minibatch,
    /// The batch's sample pairs, in batch order.
    pub pairs: &'a [DrugPair],
    /// Cell-line id per sample.
    pub cell_lines: &'a [usize],
}

/// Labels of one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchLabels<'a> {
    /// Therapeutic-effect label per sample.
    pub te: &'a [f64],
    /// Multi-hot side-effect labels per sample.
    pub se: ArrayView2<'a, f32>,
}

/// Per-sample predictions of both heads.
#[derive(Debug, Clone)]
pub struct BatchPrediction {
    /// Therapeutic-effect score per sample.
    pub te: Vec<f64>,
    /// Side-effect probability per (sample, effect).
    pub se: Array2<f64>,
}

/// A trainable drug-pair predictor.
pub trait PairModel {
    /// Run one optimization step on a labeled batch and return the
    /// predictions made before the update.
    fn train_step(
        &mut self,
        input: &ModelInput<'_>,
        labels: &BatchLabels<'_>,
    ) -> Result<BatchPrediction>;

    /// Predict a batch without updating parameters.
    fn predict(&self, input: &ModelInput<'_>) -> Result<BatchPrediction>;

    /// Export parameters for checkpointing.
    fn params(&self) -> ParamTable;

    /// Restore parameters from a checkpoint.
    fn load_params(&mut self, params: &ParamTable) -> Result<()>;
}
