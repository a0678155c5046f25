//! Shared data-model types for the heterogeneous drug-interaction graph.
//!
//! All node kinds (drugs, targets) live in one integer id space; a
//! [`TypeMask`] recovers the kind of a given id. Drug-pair samples carry a
//! [`PairSide`] role deciding which member of the pair anchors a metapath
//! expansion, and [`PerSide`] holds one value per role.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Global node identifier, shared across node types.
///
/// Signed so that offset adjustment during leakage checks may transiently
/// go negative without wrapping.
pub type NodeId = i64;

/// Which member of a drug pair anchors the current metapath expansion.
///
/// The two roles read leakage columns in mirrored order and number their
/// synthetic self-loop rows in different id ranges, so the role is an
/// explicit type rather than an integer flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairSide {
    /// The first (row) drug of the pair.
    Row,
    /// The second (col) drug of the pair.
    Col,
}

impl PairSide {
    /// Both roles, in storage order.
    pub const BOTH: [PairSide; 2] = [PairSide::Row, PairSide::Col];

    /// Storage index of this role.
    pub fn index(self) -> usize {
        match self {
            PairSide::Row => 0,
            PairSide::Col => 1,
        }
    }

    /// Offset added to synthetic self-loop instance rows for this role.
    pub(crate) fn self_loop_offset(self, offset: NodeId) -> NodeId {
        match self {
            PairSide::Row => 0,
            PairSide::Col => offset,
        }
    }

    /// Extract the two (drug, partner) pairs checked against the exclusion
    /// set, from the first/second and last/second-to-last instance columns.
    /// The partner element is offset-adjusted by the caller's id-space split.
    pub(crate) fn leak_pairs(
        self,
        instance: ArrayView1<'_, NodeId>,
        offset: NodeId,
    ) -> [(NodeId, NodeId); 2] {
        let w = instance.len();
        let (first, second) = (instance[0], instance[1]);
        let (last, second_last) = (instance[w - 1], instance[w - 2]);
        match self {
            PairSide::Row => [(first, second - offset), (last, second_last - offset)],
            PairSide::Col => [(second, first - offset), (second_last, last - offset)],
        }
    }
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairSide::Row => write!(f, "row"),
            PairSide::Col => write!(f, "col"),
        }
    }
}

/// One value per [`PairSide`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub row: T,
    pub col: T,
}

impl<T> PerSide<T> {
    /// Create from explicit per-role values.
    pub fn new(row: T, col: T) -> Self {
        Self { row, col }
    }

    /// Use the same value for both roles.
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            row: value.clone(),
            col: value,
        }
    }

    /// Iterate `(side, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (PairSide, &T)> {
        PairSide::BOTH.iter().map(move |&side| (side, &self[side]))
    }
}

impl<T> Index<PairSide> for PerSide<T> {
    type Output = T;

    fn index(&self, side: PairSide) -> &T {
        match side {
            PairSide::Row => &self.row,
            PairSide::Col => &self.col,
        }
    }
}

impl<T> IndexMut<PairSide> for PerSide<T> {
    fn index_mut(&mut self, side: PairSide) -> &mut T {
        match side {
            PairSide::Row => &mut self.row,
            PairSide::Col => &mut self.col,
        }
    }
}

/// A drug-drug sample pair (side information such as the cell line is kept
/// by the caller alongside the pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrugPair {
    /// First drug of the pair.
    pub row: NodeId,
    /// Second drug of the pair.
    pub col: NodeId,
}

impl DrugPair {
    /// Create a new pair.
    pub fn new(row: NodeId, col: NodeId) -> Self {
        Self { row, col }
    }

    /// The pair member anchoring the given role.
    pub fn anchor(self, side: PairSide) -> NodeId {
        match side {
            PairSide::Row => self.row,
            PairSide::Col => self.col,
        }
    }

    /// The pair with its members swapped (used for symmetrized evaluation).
    pub fn swapped(self) -> Self {
        Self {
            row: self.col,
            col: self.row,
        }
    }
}

/// Held-out sample pairs whose direct connection must not leak into a
/// training-time subgraph.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    pairs: HashSet<(NodeId, NodeId)>,
}

impl ExclusionSet {
    /// Build from the current batch's sample pairs, kept in given orientation.
    pub fn from_pairs(pairs: &[DrugPair]) -> Self {
        Self {
            pairs: pairs.iter().map(|p| (p.row, p.col)).collect(),
        }
    }

    /// Whether `(drug, partner)` is a held-out pair.
    pub fn contains(&self, drug: NodeId, partner: NodeId) -> bool {
        self.pairs.contains(&(drug, partner))
    }

    /// Number of held-out pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// An ordered tuple of node-type labels describing an anchor-to-anchor path
/// pattern, e.g. `0-1-0` for drug→target→drug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metapath {
    node_types: Vec<u8>,
}

impl Metapath {
    /// Create from node-type labels.
    pub fn new(node_types: Vec<u8>) -> Self {
        Self { node_types }
    }

    /// Node-type labels along the path.
    pub fn node_types(&self) -> &[u8] {
        &self.node_types
    }

    /// Number of node positions in one path instance.
    pub fn instance_width(&self) -> usize {
        self.node_types.len()
    }
}

impl fmt::Display for Metapath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.node_types.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", labels.join("-"))
    }
}

/// Dense node-type table over the shared id space: ids `0..counts[0]` get
/// type 0, the next `counts[1]` ids type 1, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMask {
    codes: Vec<u8>,
}

impl TypeMask {
    /// Build from per-type node counts.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut codes = Vec::with_capacity(counts.iter().sum());
        for (code, &count) in counts.iter().enumerate() {
            codes.extend(std::iter::repeat(code as u8).take(count));
        }
        Self { codes }
    }

    /// Type code of a node, or `None` for ids outside the mask.
    pub fn type_of(&self, node: NodeId) -> Option<u8> {
        usize::try_from(node).ok().and_then(|i| self.codes.get(i)).copied()
    }

    /// Number of nodes carrying the given type code.
    pub fn count_of(&self, code: u8) -> usize {
        self.codes.iter().filter(|&&c| c == code).count()
    }

    /// Total number of nodes covered.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the mask covers no nodes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn type_mask_from_counts() {
        let mask = TypeMask::from_counts(&[3, 2]);
        assert_eq!(mask.len(), 5);
        assert_eq!(mask.type_of(0), Some(0));
        assert_eq!(mask.type_of(2), Some(0));
        assert_eq!(mask.type_of(3), Some(1));
        assert_eq!(mask.type_of(5), None);
        assert_eq!(mask.type_of(-1), None);
        assert_eq!(mask.count_of(1), 2);
    }

    #[test]
    fn pair_anchor_and_swap() {
        let pair = DrugPair::new(7, 11);
        assert_eq!(pair.anchor(PairSide::Row), 7);
        assert_eq!(pair.anchor(PairSide::Col), 11);
        assert_eq!(pair.swapped(), DrugPair::new(11, 7));
    }

    #[test]
    fn exclusion_set_orientation() {
        let set = ExclusionSet::from_pairs(&[DrugPair::new(1, 2)]);
        assert!(set.contains(1, 2));
        assert!(!set.contains(2, 1));
    }

    #[test]
    fn leak_pairs_row_and_col_order() {
        // Instance row drug→target→target→drug, offset 10 between id spaces.
        let inst = array![3i64, 15, 17, 4];
        let row = PairSide::Row.leak_pairs(inst.view(), 10);
        assert_eq!(row, [(3, 5), (4, 7)]);
        let col = PairSide::Col.leak_pairs(inst.view(), 10);
        assert_eq!(col, [(15, -7), (17, -6)]);
    }

    #[test]
    fn leak_pairs_width_two() {
        // Therapeutic-effect template: the two columns double as both ends.
        let inst = array![3i64, 14];
        let row = PairSide::Row.leak_pairs(inst.view(), 10);
        assert_eq!(row, [(3, 4), (14, -7)]);
    }

    #[test]
    fn metapath_display_and_width() {
        let mp = Metapath::new(vec![0, 1, 1, 0]);
        assert_eq!(mp.instance_width(), 4);
        assert_eq!(mp.to_string(), "0-1-1-0");
    }

    #[test]
    fn per_side_indexing() {
        let mut per = PerSide::new(1, 2);
        per[PairSide::Col] = 5;
        assert_eq!(per[PairSide::Row], 1);
        assert_eq!(per[PairSide::Col], 5);
        let collected: Vec<_> = per.iter().map(|(s, v)| (s.index(), *v)).collect();
        assert_eq!(collected, vec![(0, 1), (1, 5)]);
    }
}
