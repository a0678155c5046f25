#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Minibatch metapath-subgraph construction for heterogeneous drug-pair
//! prediction.
//!
//! Drug-pair models score a (drug, drug, cell-line) sample from the
//! metapath neighborhoods of both drugs. This crate builds the per-batch
//! inputs those models consume:
//!
//! - [`BatchIndexGenerator`] - epoch index slicing with auto-reset/reshuffle
//! - [`parse_adjacency_rows`] - neighbor-row parsing with leakage exclusion
//!   and frequency-smoothed subsampling
//! - [`assemble_minibatch`] - per-(side, metapath) batch-local multigraphs
//!   with edge-aligned path-instance matrices
//!
//! The adjacency tables themselves are precomputed offline and read-only
//! here; every batch gets fresh local structures and nothing is shared or
//! mutated across batches. All randomness comes from caller-seeded sources.
//!
//! # Example
//!
//! ```rust
//! use ndarray::array;
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//! use synergraph_core::{
//!     assemble_minibatch, AdjacencyTables, DrugPair, MetapathAdjacency, PerSide,
//! };
//!
//! // One drug→target→drug metapath over two drugs.
//! let adjacency = MetapathAdjacency::new(
//!     vec!["0 1".into(), "1 0".into()],
//!     vec![array![[0, 5, 1]], array![[1, 5, 0]]],
//!     3,
//! )?;
//! let tables = AdjacencyTables::new(PerSide::splat(vec![adjacency]))?;
//!
//! let mut rng = XorShiftRng::seed_from_u64(42);
//! let batch = [DrugPair::new(0, 1)];
//! let masks = PerSide::splat(vec![false]);
//! let minibatch = assemble_minibatch(&tables, &batch, None, &masks, 2, &mut rng)?;
//! assert_eq!(minibatch.num_metapaths(), 1);
//! # Ok::<(), synergraph_core::Error>(())
//! ```

pub mod adjacency;
pub mod batch;
mod error;
pub mod minibatch;
pub mod parse;
pub mod types;

pub use adjacency::{AdjacencyTables, MetapathAdjacency};
pub use batch::BatchIndexGenerator;
pub use error::{Error, Result};
pub use minibatch::{assemble_minibatch, MetapathBatch, Minibatch};
pub use parse::{parse_adjacency_rows, ParseOptions, ParsedAdjacency};
pub use types::{DrugPair, ExclusionSet, Metapath, NodeId, PairSide, PerSide, TypeMask};

// Re-export the graph and array backends so consumers match versions.
pub use ndarray;
pub use petgraph;
