#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Training and evaluation collaborators around the minibatch pipeline.
//!
//! The learned network itself lives outside this workspace behind the
//! [`PairModel`] trait; this crate supplies everything around it:
//!
//! - [`DdiDataset`] - prepared-dataset container with integrity checks
//! - [`Trainer`] - epoch loop, leak masks, symmetrized evaluation,
//!   early stopping and checkpoint reload
//! - [`metrics`] - MSE/RMSE/MAE/Pearson and micro AUROC/AUPRC
//! - [`EarlyStopping`] / [`Checkpoint`] - patience monitor + persistence
//! - [`BaselineModel`] - label-statistics model for smoke runs and floors

pub mod baseline;
pub mod checkpoint;
pub mod data;
mod error;
pub mod metrics;
pub mod model;
pub mod stopping;
pub mod trainer;

pub use baseline::BaselineModel;
pub use checkpoint::{write_val_loss_csv, Checkpoint, ParamTable};
pub use data::{DdiDataset, RawAdjacency, RawDataset, RawSplit, SampleRecord, Split, SplitKind};
pub use error::{Error, Result};
pub use metrics::{RegressionMetrics, RegressionSummary};
pub use model::{BatchLabels, BatchPrediction, ModelInput, PairModel};
pub use stopping::{EarlyStopping, StopSignal};
pub use trainer::{leak_masks, no_masks, EvalReport, FitReport, TrainConfig, Trainer};
