//! Batch-local metapath graph assembly.
//!
//! For every (side, metapath) the assembler gathers the batch anchors'
//! neighbor rows, parses them (see [`crate::parse`]), and materializes a
//! directed petgraph multigraph over the batch-local index space. Edges
//! point terminal→anchor so a message-passing aggregator gathers from
//! neighbors into anchors, and they are inserted in (anchor, terminal)
//! order with the instance matrix permuted identically, so the aggregator
//! can zip edges and instance rows positionally.

use crate::adjacency::AdjacencyTables;
use crate::error::{Error, Result};
use crate::parse::{parse_adjacency_rows, ParseOptions, ParsedAdjacency};
use crate::types::{DrugPair, ExclusionSet, NodeId, PairSide, PerSide};
use ndarray::{Array2, Axis};
use petgraph::graph::{DiGraph, NodeIndex};
use rand::Rng;

/// One metapath's share of a minibatch: the batch-local multigraph, the
/// edge-aligned instance matrix, and each batch sample's anchor position.
#[derive(Debug, Clone)]
pub struct MetapathBatch {
    /// Directed multigraph over local indices; parallel edges and self-loops
    /// are permitted, edges run terminal→anchor.
    pub graph: DiGraph<(), ()>,
    /// Instance rows aligned with the graph's edge order.
    pub instances: Array2<NodeId>,
    /// Local index of each batch sample's anchor, in batch order.
    pub anchor_positions: Vec<usize>,
}

impl MetapathBatch {
    /// Number of batch-local nodes.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges (equals the instance-row count).
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }
}

/// All metapath batches of one minibatch, organized `[side][metapath]`.
#[derive(Debug, Clone)]
pub struct Minibatch {
    pub per_side: PerSide<Vec<MetapathBatch>>,
}

impl Minibatch {
    /// Number of metapaths per side.
    pub fn num_metapaths(&self) -> usize {
        self.per_side.row.len()
    }

    /// Metapath batches of one side.
    pub fn side(&self, side: PairSide) -> &[MetapathBatch] {
        &self.per_side[side]
    }
}

/// Assemble the batch-local graphs for a batch of drug pairs.
///
/// `masks[side][metapath]` selects where the batch's own pairs are masked
/// out of the constructed subgraph (training only; evaluation passes
/// all-false masks). `offset` is the id-space boundary between the two node
/// roles. The RNG is only consumed when `samples` requests subsampling.
///
/// Every (side, metapath) yields a valid [`MetapathBatch`] even when no
/// edges survive exclusion; a zero-edge graph keeps its instance matrix in
/// parse order.
pub fn assemble_minibatch<R: Rng + ?Sized>(
    tables: &AdjacencyTables,
    batch: &[DrugPair],
    samples: Option<usize>,
    masks: &PerSide<Vec<bool>>,
    offset: NodeId,
    rng: &mut R,
) -> Result<Minibatch> {
    let exclusion = ExclusionSet::from_pairs(batch);
    let mut per_side = PerSide::new(Vec::new(), Vec::new());

    for side in PairSide::BOTH {
        let adjacencies = tables.side(side);
        let flags = &masks[side];
        if flags.len() != adjacencies.len() {
            return Err(Error::MaskArityMismatch {
                expected: adjacencies.len(),
                got: flags.len(),
            });
        }

        let anchors: Vec<NodeId> = batch.iter().map(|pair| pair.anchor(side)).collect();
        for (adjacency, &use_mask) in adjacencies.iter().zip(flags) {
            let (rows, instance_sets) = adjacency.gather(&anchors)?;
            let opts = ParseOptions {
                samples,
                exclusion: use_mask.then_some(&exclusion),
                offset,
                side,
                instance_width: adjacency.width(),
            };
            let parsed = parse_adjacency_rows(&rows, &instance_sets, &opts, rng)?;
            per_side[side].push(build_metapath_batch(parsed, &anchors)?);
        }
    }

    Ok(Minibatch { per_side })
}

/// Materialize one parsed (side, metapath) into its multigraph, sorting
/// edges by (anchor, terminal) and permuting the instance rows in lockstep.
fn build_metapath_batch(parsed: ParsedAdjacency, anchors: &[NodeId]) -> Result<MetapathBatch> {
    let ParsedAdjacency {
        edges,
        instances,
        num_nodes,
        mapping,
    } = parsed;

    let mut graph = DiGraph::<(), ()>::with_capacity(num_nodes, edges.len());
    for _ in 0..num_nodes {
        graph.add_node(());
    }

    let instances = if edges.is_empty() {
        instances
    } else {
        let mut order: Vec<usize> = (0..edges.len()).collect();
        order.sort_by_key(|&i| edges[i]);
        for &i in &order {
            let (anchor, terminal) = edges[i];
            graph.add_edge(NodeIndex::new(terminal), NodeIndex::new(anchor), ());
        }
        instances.select(Axis(0), &order)
    };

    let anchor_positions = anchors
        .iter()
        .map(|anchor| {
            mapping
                .get(anchor)
                .copied()
                .ok_or(Error::UnmappedAnchor { anchor: *anchor })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MetapathBatch {
        graph,
        instances,
        anchor_positions,
    })
}
