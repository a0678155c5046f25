//! Neighbor-row parsing for one (side, metapath) of a minibatch.
//!
//! Each anchor drug contributes one whitespace-separated neighbor row and
//! one instance matrix whose rows spell out the intermediate node ids of
//! every anchor→terminal path instance. Parsing turns a batch of such rows
//! into a flat edge list over a compact, batch-local index space together
//! with the surviving instance rows, keeping three alignments intact:
//!
//! 1. every surviving terminal has exactly one surviving instance row,
//! 2. edge order and instance-row order are the same permutation,
//! 3. the global→local mapping is a bijection assigned by ascending id.
//!
//! Neighbor selection runs in two stages: optional frequency-smoothed
//! subsampling (damping high-degree terminals by `count^(3/4) / count`),
//! then optional leakage exclusion, which drops any path instance whose
//! end pairs reproduce a held-out sample of the current batch.

use crate::error::{Error, Result};
use crate::types::{ExclusionSet, NodeId, PairSide};
use ndarray::Array2;
use rand::seq::index::sample_weighted;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Knobs for one parse call.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'a> {
    /// Subsample at most this many terminals per anchor (`None` keeps all).
    pub samples: Option<usize>,
    /// Held-out pairs to mask out, or `None` outside training.
    pub exclusion: Option<&'a ExclusionSet>,
    /// Numeric boundary between the two node roles' id ranges.
    pub offset: NodeId,
    /// Which pair member anchors this expansion.
    pub side: PairSide,
    /// Instance-matrix column count for this metapath.
    pub instance_width: usize,
}

/// Batch-local result of parsing one (side, metapath).
#[derive(Debug, Clone)]
pub struct ParsedAdjacency {
    /// `(anchor, terminal)` pairs in batch-local indices, in append order.
    pub edges: Vec<(usize, usize)>,
    /// Surviving instance rows, aligned row-for-row with `edges`.
    pub instances: Array2<NodeId>,
    /// Number of distinct nodes touched.
    pub num_nodes: usize,
    /// Global id → local index, assigned by ascending global id.
    pub mapping: BTreeMap<NodeId, usize>,
}

/// Parse a batch of neighbor rows into a batch-local edge list, the aligned
/// instance matrix, the touched-node count and the local-index mapping.
///
/// `rows[i]` and `instance_sets[i]` describe the same anchor; an anchor with
/// no terminals yields a single synthetic self-loop whose instance row
/// repeats the anchor id (offset into the reverse role's id range when
/// parsing the `Col` side).
pub fn parse_adjacency_rows<R: Rng + ?Sized>(
    rows: &[&str],
    instance_sets: &[&Array2<NodeId>],
    opts: &ParseOptions<'_>,
    rng: &mut R,
) -> Result<ParsedAdjacency> {
    if rows.len() != instance_sets.len() {
        return Err(Error::TableArityMismatch {
            rows: rows.len(),
            instances: instance_sets.len(),
        });
    }
    let width = opts.instance_width;
    if opts.exclusion.is_some() && width < 2 {
        return Err(Error::InstanceTooNarrow { width });
    }

    let mut edges_global: Vec<(NodeId, NodeId)> = Vec::new();
    let mut nodes: BTreeSet<NodeId> = BTreeSet::new();
    let mut stacked: Vec<NodeId> = Vec::new();
    let mut rows_kept = 0usize;

    for (row_index, (&raw, &inst)) in rows.iter().zip(instance_sets).enumerate() {
        let parsed = parse_row(raw, row_index)?;
        let anchor = parsed[0];
        nodes.insert(anchor);
        let terminals = &parsed[1..];

        if terminals.is_empty() {
            // No metapath neighbors: the anchor stands in for itself with a
            // single synthetic path instance.
            if inst.nrows() != 0 {
                return Err(Error::InstanceCountMismatch {
                    row_index,
                    anchor,
                    terminals: 0,
                    instance_rows: inst.nrows(),
                });
            }
            edges_global.push((anchor, anchor));
            let fill = anchor + opts.side.self_loop_offset(opts.offset);
            stacked.extend(std::iter::repeat(fill).take(width));
            rows_kept += 1;
            continue;
        }

        if inst.nrows() != terminals.len() {
            return Err(Error::InstanceCountMismatch {
                row_index,
                anchor,
                terminals: terminals.len(),
                instance_rows: inst.nrows(),
            });
        }
        if inst.ncols() != width {
            return Err(Error::InstanceWidthMismatch {
                row_index,
                expected: width,
                got: inst.ncols(),
            });
        }

        let mut keep = match opts.samples {
            None => (0..terminals.len()).collect(),
            Some(requested) => sample_positions(terminals, requested, rng)?,
        };
        if let Some(exclusion) = opts.exclusion {
            keep.retain(|&i| {
                let [first, last] = opts.side.leak_pairs(inst.row(i), opts.offset);
                !exclusion.contains(first.0, first.1) && !exclusion.contains(last.0, last.1)
            });
        }

        for &i in &keep {
            let dst = terminals[i];
            nodes.insert(dst);
            edges_global.push((anchor, dst));
            stacked.extend(inst.row(i).iter().copied());
        }
        rows_kept += keep.len();
    }

    let mapping: BTreeMap<NodeId, usize> = nodes
        .iter()
        .copied()
        .enumerate()
        .map(|(local, global)| (global, local))
        .collect();
    let edges = edges_global
        .iter()
        .map(|&(anchor, dst)| (mapping[&anchor], mapping[&dst]))
        .collect();
    let instances = Array2::from_shape_vec((rows_kept, width), stacked)?;

    Ok(ParsedAdjacency {
        edges,
        instances,
        num_nodes: mapping.len(),
        mapping,
    })
}

fn parse_row(raw: &str, row_index: usize) -> Result<Vec<NodeId>> {
    let mut parsed = Vec::new();
    for token in raw.split_whitespace() {
        let id = token.parse::<NodeId>().map_err(|_| Error::MalformedRow {
            row_index,
            token: token.to_string(),
        })?;
        parsed.push(id);
    }
    if parsed.is_empty() {
        return Err(Error::EmptyRow { row_index });
    }
    Ok(parsed)
}

/// Draw `min(requested, n)` terminal positions without replacement, each
/// position weighted by `count(value)^(3/4) / count(value)` so that
/// high-degree terminal values are damped. Positions come back sorted so
/// the selection stays aligned with the instance-matrix row order.
fn sample_positions<R: Rng + ?Sized>(
    terminals: &[NodeId],
    requested: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let n = terminals.len();
    let amount = requested.min(n);
    if amount == n {
        return Ok((0..n).collect());
    }
    let mut counts: HashMap<NodeId, usize> = HashMap::with_capacity(n);
    for &t in terminals {
        *counts.entry(t).or_insert(0) += 1;
    }
    let weights: Vec<f64> = terminals
        .iter()
        .map(|t| {
            let count = counts[t] as f64;
            count.powf(0.75) / count
        })
        .collect();
    let mut keep: Vec<usize> = sample_weighted(rng, n, |i| weights[i], amount)?.into_vec();
    keep.sort_unstable();
    Ok(keep)
}
