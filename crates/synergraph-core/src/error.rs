use crate::types::NodeId;
use thiserror::Error;

/// Errors raised by the minibatch construction core.
#[derive(Debug, Error)]
pub enum Error {
    /// A neighbor row contained a token that is not an integer.
    #[error("malformed adjacency row {row_index}: token `{token}` is not an integer")]
    MalformedRow { row_index: usize, token: String },

    /// A neighbor row was empty (every row must carry at least its anchor id).
    #[error("empty adjacency row {row_index}: expected at least an anchor id")]
    EmptyRow { row_index: usize },

    /// Neighbor-row terminal count and instance-matrix row count disagree.
    #[error(
        "adjacency row {row_index} (anchor {anchor}) lists {terminals} terminals \
         but carries {instance_rows} instance rows"
    )]
    InstanceCountMismatch {
        row_index: usize,
        anchor: NodeId,
        terminals: usize,
        instance_rows: usize,
    },

    /// An instance matrix does not have the metapath's column count.
    #[error("instance width mismatch on row {row_index}: expected {expected} columns, got {got}")]
    InstanceWidthMismatch {
        row_index: usize,
        expected: usize,
        got: usize,
    },

    /// Leakage extraction needs at least two instance columns.
    #[error("instance width {width} too narrow for leakage extraction (need at least 2 columns)")]
    InstanceTooNarrow { width: usize },

    /// A batch anchor id has no entry in the adjacency table.
    #[error("anchor id {anchor} outside adjacency table of {len} entries")]
    AnchorOutOfRange { anchor: NodeId, len: usize },

    /// Neighbor-row and instance-set sequences have different lengths.
    #[error("adjacency table carries {rows} neighbor rows but {instances} instance sets")]
    TableArityMismatch { rows: usize, instances: usize },

    /// An exclusion-mask vector does not cover every metapath.
    #[error("exclusion mask covers {got} metapaths, adjacency tables carry {expected}")]
    MaskArityMismatch { expected: usize, got: usize },

    /// The two sides of an adjacency table disagree on metapath count.
    #[error("adjacency tables disagree across sides: {row} metapaths vs {col}")]
    SideArityMismatch { row: usize, col: usize },

    /// Weighted without-replacement sampling rejected its weight vector.
    #[error("weighted neighbor sampling failed: {0}")]
    Sampling(#[from] rand::distributions::WeightedError),

    /// Stacked instance rows did not form a rectangular matrix.
    #[error("instance stacking produced a non-rectangular matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A batch anchor vanished from the local node mapping.
    #[error("batch anchor {anchor} missing from local node mapping")]
    UnmappedAnchor { anchor: NodeId },
}

/// Result type alias for the core crate.
pub type Result<T> = std::result::Result<T, Error>;
