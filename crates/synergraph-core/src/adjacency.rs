//! Precomputed per-metapath neighbor tables.
//!
//! For every metapath and every anchor drug the dataset preparation step
//! stores one neighbor row (a whitespace-separated integer string whose
//! first token is the anchor) and one instance matrix (one row per
//! anchor→terminal path instance). These tables are read-only across all
//! batches; the minibatch assembler only ever borrows slices of them.

use crate::error::{Error, Result};
use crate::types::{NodeId, PairSide, PerSide};
use ndarray::Array2;

/// Neighbor rows and instance matrices for one (side, metapath), indexed by
/// anchor drug id.
#[derive(Debug, Clone)]
pub struct MetapathAdjacency {
    rows: Vec<String>,
    instances: Vec<Array2<NodeId>>,
    width: usize,
}

impl MetapathAdjacency {
    /// Create a table, checking that rows and instance sets pair up and that
    /// every non-empty instance matrix has the metapath's column count.
    pub fn new(rows: Vec<String>, instances: Vec<Array2<NodeId>>, width: usize) -> Result<Self> {
        if rows.len() != instances.len() {
            return Err(Error::TableArityMismatch {
                rows: rows.len(),
                instances: instances.len(),
            });
        }
        for (row_index, inst) in instances.iter().enumerate() {
            if inst.nrows() > 0 && inst.ncols() != width {
                return Err(Error::InstanceWidthMismatch {
                    row_index,
                    expected: width,
                    got: inst.ncols(),
                });
            }
        }
        Ok(Self {
            rows,
            instances,
            width,
        })
    }

    /// Number of anchors covered.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table covers no anchors.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Instance-matrix column count for this metapath.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of stored path instances across all anchors.
    pub fn num_instances(&self) -> usize {
        self.instances.iter().map(Array2::nrows).sum()
    }

    /// Neighbor row of one anchor.
    pub fn row(&self, anchor: NodeId) -> Result<&str> {
        self.index_of(anchor).map(|i| self.rows[i].as_str())
    }

    /// Instance matrix of one anchor.
    pub fn instances_of(&self, anchor: NodeId) -> Result<&Array2<NodeId>> {
        self.index_of(anchor).map(|i| &self.instances[i])
    }

    /// Borrow the rows and instance matrices for a batch of anchors, in
    /// batch order.
    pub fn gather(&self, anchors: &[NodeId]) -> Result<(Vec<&str>, Vec<&Array2<NodeId>>)> {
        let mut rows = Vec::with_capacity(anchors.len());
        let mut instances = Vec::with_capacity(anchors.len());
        for &anchor in anchors {
            let i = self.index_of(anchor)?;
            rows.push(self.rows[i].as_str());
            instances.push(&self.instances[i]);
        }
        Ok((rows, instances))
    }

    fn index_of(&self, anchor: NodeId) -> Result<usize> {
        usize::try_from(anchor)
            .ok()
            .filter(|&i| i < self.rows.len())
            .ok_or(Error::AnchorOutOfRange {
                anchor,
                len: self.rows.len(),
            })
    }
}

/// All adjacency tables, organized `[side][metapath]`.
#[derive(Debug, Clone)]
pub struct AdjacencyTables {
    per_side: PerSide<Vec<MetapathAdjacency>>,
}

impl AdjacencyTables {
    /// Create from per-side tables; both sides must cover the same metapaths.
    pub fn new(per_side: PerSide<Vec<MetapathAdjacency>>) -> Result<Self> {
        if per_side.row.len() != per_side.col.len() {
            return Err(Error::SideArityMismatch {
                row: per_side.row.len(),
                col: per_side.col.len(),
            });
        }
        Ok(Self { per_side })
    }

    /// Number of metapaths per side.
    pub fn num_metapaths(&self) -> usize {
        self.per_side.row.len()
    }

    /// Tables for one side, in metapath order.
    pub fn side(&self, side: PairSide) -> &[MetapathAdjacency] {
        &self.per_side[side]
    }
}
