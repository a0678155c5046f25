//! Property-based tests for the adjacency parser and minibatch assembler.
//!
//! These check the structural invariants that must hold for every input:
//!
//! - edge lists and instance matrices are always the same length
//! - the batch-local node mapping is a dense bijection
//! - parsing without sampling is deterministic
//! - subsampling returns exactly `min(samples, n)` positions per anchor
//! - excluded pairs never survive into the constructed subgraph

#![allow(clippy::unwrap_used)]

use ndarray::Array2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use synergraph_core::{
    assemble_minibatch, parse_adjacency_rows, AdjacencyTables, DrugPair, ExclusionSet,
    MetapathAdjacency, NodeId, PairSide, ParseOptions, PerSide,
};

const WIDTH: usize = 3;
const OFFSET: NodeId = 100;

/// Neighbor lists for a handful of anchors; terminal ids live in the
/// target range so they never collide with anchors.
fn anchors_strategy() -> impl Strategy<Value = Vec<Vec<NodeId>>> {
    prop::collection::vec(
        prop::collection::vec(100i64..140, 0..10),
        1..6,
    )
}

fn build_inputs(terminals_per_anchor: &[Vec<NodeId>]) -> (Vec<String>, Vec<Array2<NodeId>>) {
    let mut rows = Vec::new();
    let mut instances = Vec::new();
    for (anchor, terminals) in terminals_per_anchor.iter().enumerate() {
        let anchor = anchor as NodeId;
        let mut row = anchor.to_string();
        for t in terminals {
            row.push(' ');
            row.push_str(&t.to_string());
        }
        rows.push(row);
        let inst = Array2::from_shape_fn((terminals.len(), WIDTH), |(r, c)| match c {
            0 => anchor,
            1 => terminals[r],
            _ => anchor,
        });
        instances.push(inst);
    }
    (rows, instances)
}

proptest! {
    #[test]
    fn edges_and_instances_always_align(terminals in anchors_strategy()) {
        let (rows, instances) = build_inputs(&terminals);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let inst_refs: Vec<&Array2<NodeId>> = instances.iter().collect();
        let opts = ParseOptions {
            samples: None,
            exclusion: None,
            offset: OFFSET,
            side: PairSide::Row,
            instance_width: WIDTH,
        };
        let mut rng = XorShiftRng::seed_from_u64(1);
        let parsed = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng).unwrap();

        let expected: usize = terminals.iter().map(|t| t.len().max(1)).sum();
        prop_assert_eq!(parsed.edges.len(), expected);
        prop_assert_eq!(parsed.instances.nrows(), expected);
        prop_assert_eq!(parsed.instances.ncols(), WIDTH);
    }

    #[test]
    fn mapping_is_dense_bijection(terminals in anchors_strategy()) {
        let (rows, instances) = build_inputs(&terminals);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let inst_refs: Vec<&Array2<NodeId>> = instances.iter().collect();
        let opts = ParseOptions {
            samples: None,
            exclusion: None,
            offset: OFFSET,
            side: PairSide::Row,
            instance_width: WIDTH,
        };
        let mut rng = XorShiftRng::seed_from_u64(2);
        let parsed = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng).unwrap();

        let endpoints: std::collections::BTreeSet<usize> = parsed
            .edges
            .iter()
            .flat_map(|&(a, d)| [a, d])
            .collect();
        prop_assert!(endpoints.len() <= parsed.num_nodes);
        let mut locals: Vec<usize> = parsed.mapping.values().copied().collect();
        locals.sort_unstable();
        prop_assert_eq!(locals, (0..parsed.num_nodes).collect::<Vec<_>>());
        // Mapping keys ascend with their local indices.
        let keys: Vec<NodeId> = parsed.mapping.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn parsing_without_sampling_is_idempotent(terminals in anchors_strategy()) {
        let (rows, instances) = build_inputs(&terminals);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let inst_refs: Vec<&Array2<NodeId>> = instances.iter().collect();
        let opts = ParseOptions {
            samples: None,
            exclusion: None,
            offset: OFFSET,
            side: PairSide::Col,
            instance_width: WIDTH,
        };
        let mut rng_a = XorShiftRng::seed_from_u64(3);
        let mut rng_b = XorShiftRng::seed_from_u64(99);
        let a = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng_a).unwrap();
        let b = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng_b).unwrap();
        prop_assert_eq!(a.edges, b.edges);
        prop_assert_eq!(a.instances, b.instances);
    }

    #[test]
    fn sampling_cardinality_is_clamped(
        terminals in anchors_strategy(),
        samples in 1usize..6,
        seed in 0u64..32,
    ) {
        let (rows, instances) = build_inputs(&terminals);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let inst_refs: Vec<&Array2<NodeId>> = instances.iter().collect();
        let opts = ParseOptions {
            samples: Some(samples),
            exclusion: None,
            offset: OFFSET,
            side: PairSide::Row,
            instance_width: WIDTH,
        };
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let parsed = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng).unwrap();

        let expected: usize = terminals
            .iter()
            .map(|t| if t.is_empty() { 1 } else { samples.min(t.len()) })
            .sum();
        prop_assert_eq!(parsed.edges.len(), expected);
        prop_assert_eq!(parsed.instances.nrows(), expected);
    }

    #[test]
    fn excluded_pairs_never_survive(
        terminals in anchors_strategy(),
        excluded_terminal in 100i64..140,
    ) {
        let (rows, instances) = build_inputs(&terminals);
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let inst_refs: Vec<&Array2<NodeId>> = instances.iter().collect();
        // Instance rows read (anchor, terminal-OFFSET) on the Row side; plant
        // every anchor's pair with one terminal into the exclusion set.
        let pairs: Vec<DrugPair> = (0..terminals.len() as NodeId)
            .map(|anchor| DrugPair::new(anchor, excluded_terminal - OFFSET))
            .collect();
        let exclusion = ExclusionSet::from_pairs(&pairs);
        let opts = ParseOptions {
            samples: None,
            exclusion: Some(&exclusion),
            offset: OFFSET,
            side: PairSide::Row,
            instance_width: WIDTH,
        };
        let mut rng = XorShiftRng::seed_from_u64(5);
        let parsed = parse_adjacency_rows(&row_refs, &inst_refs, &opts, &mut rng).unwrap();

        // No surviving instance row may carry the excluded terminal.
        for row in parsed.instances.rows() {
            prop_assert_ne!(row[1], excluded_terminal);
        }
    }

    #[test]
    fn assembled_graphs_align_for_any_batch(
        pairs in prop::collection::vec((0i64..4, 0i64..4), 1..6),
        mask_direct in any::<bool>(),
    ) {
        let mut rows = Vec::new();
        let mut instances = Vec::new();
        for anchor in 0i64..4 {
            let partner = (anchor + 1) % 4;
            rows.push(format!("{} {}", anchor, partner));
            instances.push(Array2::from_shape_vec((1, 2), vec![anchor, partner]).unwrap());
        }
        let adjacency = MetapathAdjacency::new(rows, instances, 2).unwrap();
        let tables = AdjacencyTables::new(PerSide::splat(vec![adjacency])).unwrap();
        let batch: Vec<DrugPair> = pairs.iter().map(|&(r, c)| DrugPair::new(r, c)).collect();
        let masks = PerSide::splat(vec![mask_direct]);
        let mut rng = XorShiftRng::seed_from_u64(7);

        let mb = assemble_minibatch(&tables, &batch, None, &masks, 0, &mut rng).unwrap();
        for side in PairSide::BOTH {
            for metapath in mb.side(side) {
                prop_assert_eq!(metapath.num_edges(), metapath.instances.nrows());
                prop_assert_eq!(metapath.anchor_positions.len(), batch.len());
                for &pos in &metapath.anchor_positions {
                    prop_assert!(pos < metapath.num_nodes());
                }
            }
        }
    }
}
