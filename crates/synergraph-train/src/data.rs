//! Prepared-dataset container.
//!
//! The upstream preparation step exports one JSON document holding the
//! per-side/per-metapath adjacency tables, the train/val/test sample
//! triples and both label families. Parsing the raw upstream formats is
//! out of scope here; this module only validates and reshapes the prepared
//! container into the core's table types.

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use synergraph_core::{
    AdjacencyTables, DrugPair, Metapath, MetapathAdjacency, NodeId, PairSide, PerSide, TypeMask,
};

/// One (side, metapath) adjacency table in serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAdjacency {
    /// One neighbor row per anchor drug.
    pub rows: Vec<String>,
    /// One instance matrix per anchor, as nested rows.
    pub instances: Vec<Vec<Vec<NodeId>>>,
    /// Instance-matrix column count for this metapath.
    pub width: usize,
}

/// One sample triple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SampleRecord {
    /// First drug of the pair.
    pub row: NodeId,
    /// Second drug of the pair.
    pub col: NodeId,
    /// Cell-line id of the measurement.
    pub cell_line: usize,
}

/// One data split in serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSplit {
    pub samples: Vec<SampleRecord>,
    /// Therapeutic-effect label per sample (synergy-score column already
    /// selected upstream).
    pub te_labels: Vec<f64>,
    /// Multi-hot side-effect labels per sample.
    pub se_labels: Vec<Vec<f32>>,
}

/// Serialized dataset document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDataset {
    pub num_drugs: usize,
    pub num_targets: usize,
    pub num_cell_lines: usize,
    pub num_side_effects: usize,
    /// Node-type labels of each metapath template, e.g. `[[0,1,0], [0,0]]`.
    pub metapaths: Vec<Vec<u8>>,
    /// Adjacency tables per pair side, one entry per metapath.
    pub adjacency: PerSide<Vec<RawAdjacency>>,
    pub train: RawSplit,
    pub val: RawSplit,
    pub test: RawSplit,
}

/// A validated data split.
#[derive(Debug, Clone)]
pub struct Split {
    pub pairs: Vec<DrugPair>,
    pub cell_lines: Vec<usize>,
    pub te_labels: Vec<f64>,
    pub se_labels: Array2<f32>,
}

impl Split {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the split holds no samples.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Which split to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Train,
    Val,
    Test,
}

/// A validated, ready-to-train dataset.
#[derive(Debug, Clone)]
pub struct DdiDataset {
    pub tables: AdjacencyTables,
    pub metapaths: Vec<Metapath>,
    pub type_mask: TypeMask,
    pub num_drugs: usize,
    pub num_targets: usize,
    pub num_cell_lines: usize,
    pub num_side_effects: usize,
    pub train: Split,
    pub val: Split,
    pub test: Split,
}

impl DdiDataset {
    /// Load and validate a prepared dataset from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let raw: RawDataset = serde_json::from_reader(BufReader::new(file))?;
        Self::from_raw(raw)
    }

    /// Validate and reshape a deserialized dataset.
    pub fn from_raw(raw: RawDataset) -> Result<Self> {
        if raw.metapaths.len() != raw.adjacency.row.len() {
            return Err(Error::Dataset(format!(
                "{} metapath templates but {} row-side adjacency tables",
                raw.metapaths.len(),
                raw.adjacency.row.len()
            )));
        }

        let build_side = |side: &[RawAdjacency]| -> Result<Vec<MetapathAdjacency>> {
            side.iter().map(build_adjacency).collect()
        };
        let tables = AdjacencyTables::new(PerSide::new(
            build_side(&raw.adjacency.row)?,
            build_side(&raw.adjacency.col)?,
        ))?;

        let metapaths: Vec<Metapath> = raw.metapaths.into_iter().map(Metapath::new).collect();
        for (metapath, adjacency) in metapaths.iter().zip(tables.side(PairSide::Row)) {
            if metapath.instance_width() != adjacency.width() {
                return Err(Error::Dataset(format!(
                    "metapath {} has width {} but its adjacency table stores width {}",
                    metapath,
                    metapath.instance_width(),
                    adjacency.width()
                )));
            }
        }

        let train = build_split(raw.train, raw.num_side_effects, raw.num_cell_lines, "train")?;
        let val = build_split(raw.val, raw.num_side_effects, raw.num_cell_lines, "val")?;
        let test = build_split(raw.test, raw.num_side_effects, raw.num_cell_lines, "test")?;

        Ok(Self {
            tables,
            metapaths,
            type_mask: TypeMask::from_counts(&[raw.num_drugs, raw.num_targets]),
            num_drugs: raw.num_drugs,
            num_targets: raw.num_targets,
            num_cell_lines: raw.num_cell_lines,
            num_side_effects: raw.num_side_effects,
            train,
            val,
            test,
        })
    }

    /// Numeric boundary between the drug and target id ranges.
    pub fn offset(&self) -> NodeId {
        self.num_drugs as NodeId
    }

    /// Number of metapaths per side.
    pub fn num_metapaths(&self) -> usize {
        self.tables.num_metapaths()
    }

    /// Borrow one split.
    pub fn split(&self, kind: SplitKind) -> &Split {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Val => &self.val,
            SplitKind::Test => &self.test,
        }
    }
}

fn build_adjacency(raw: &RawAdjacency) -> Result<MetapathAdjacency> {
    let mut instances = Vec::with_capacity(raw.instances.len());
    for (anchor, rows) in raw.instances.iter().enumerate() {
        let mut flat = Vec::with_capacity(rows.len() * raw.width);
        for row in rows {
            if row.len() != raw.width {
                return Err(Error::Dataset(format!(
                    "anchor {} carries an instance row of width {}, expected {}",
                    anchor,
                    row.len(),
                    raw.width
                )));
            }
            flat.extend_from_slice(row);
        }
        let matrix = Array2::from_shape_vec((rows.len(), raw.width), flat)
            .map_err(|e| Error::Dataset(format!("anchor {}: {}", anchor, e)))?;
        instances.push(matrix);
    }
    Ok(MetapathAdjacency::new(raw.rows.clone(), instances, raw.width)?)
}

fn build_split(
    raw: RawSplit,
    num_side_effects: usize,
    num_cell_lines: usize,
    name: &str,
) -> Result<Split> {
    let n = raw.samples.len();
    if raw.te_labels.len() != n {
        return Err(Error::Dataset(format!(
            "{} split: {} samples but {} therapeutic-effect labels",
            name,
            n,
            raw.te_labels.len()
        )));
    }
    if raw.se_labels.len() != n {
        return Err(Error::Dataset(format!(
            "{} split: {} samples but {} side-effect label rows",
            name,
            n,
            raw.se_labels.len()
        )));
    }

    let mut pairs = Vec::with_capacity(n);
    let mut cell_lines = Vec::with_capacity(n);
    for record in &raw.samples {
        if record.cell_line >= num_cell_lines {
            return Err(Error::Dataset(format!(
                "{} split: cell-line id {} outside vocabulary of {}",
                name, record.cell_line, num_cell_lines
            )));
        }
        pairs.push(DrugPair::new(record.row, record.col));
        cell_lines.push(record.cell_line);
    }

    let mut flat = Vec::with_capacity(n * num_side_effects);
    for (i, row) in raw.se_labels.iter().enumerate() {
        if row.len() != num_side_effects {
            return Err(Error::Dataset(format!(
                "{} split: sample {} carries {} side-effect labels, expected {}",
                name,
                i,
                row.len(),
                num_side_effects
            )));
        }
        flat.extend_from_slice(row);
    }
    let se_labels = Array2::from_shape_vec((n, num_side_effects), flat)
        .map_err(|e| Error::Dataset(format!("{} split labels: {}", name, e)))?;

    Ok(Split {
        pairs,
        cell_lines,
        te_labels: raw.te_labels,
        se_labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_adjacency() -> RawAdjacency {
        RawAdjacency {
            rows: vec!["0 1".into(), "1 0".into()],
            instances: vec![vec![vec![0, 2, 1]], vec![vec![1, 2, 0]]],
            width: 3,
        }
    }

    fn raw_split(n: usize) -> RawSplit {
        RawSplit {
            samples: (0..n)
                .map(|i| SampleRecord {
                    row: (i % 2) as NodeId,
                    col: ((i + 1) % 2) as NodeId,
                    cell_line: 0,
                })
                .collect(),
            te_labels: vec![0.5; n],
            se_labels: vec![vec![1.0, 0.0]; n],
        }
    }

    fn raw_dataset() -> RawDataset {
        RawDataset {
            num_drugs: 2,
            num_targets: 1,
            num_cell_lines: 1,
            num_side_effects: 2,
            metapaths: vec![vec![0, 1, 0]],
            adjacency: PerSide::splat(vec![raw_adjacency()]),
            train: raw_split(4),
            val: raw_split(2),
            test: raw_split(2),
        }
    }

    #[test]
    fn valid_dataset_builds() {
        let ds = DdiDataset::from_raw(raw_dataset()).unwrap();
        assert_eq!(ds.num_metapaths(), 1);
        assert_eq!(ds.offset(), 2);
        assert_eq!(ds.train.len(), 4);
        assert_eq!(ds.train.se_labels.dim(), (4, 2));
        assert_eq!(ds.type_mask.len(), 3);
    }

    #[test]
    fn label_count_mismatch_is_rejected() {
        let mut raw = raw_dataset();
        raw.val.te_labels.pop();
        let err = DdiDataset::from_raw(raw);
        assert!(matches!(err, Err(Error::Dataset(_))));
    }

    #[test]
    fn ragged_side_effect_rows_are_rejected() {
        let mut raw = raw_dataset();
        raw.test.se_labels[0] = vec![1.0];
        assert!(matches!(DdiDataset::from_raw(raw), Err(Error::Dataset(_))));
    }

    #[test]
    fn metapath_width_must_match_tables() {
        let mut raw = raw_dataset();
        raw.metapaths = vec![vec![0, 1, 1, 0]];
        assert!(matches!(DdiDataset::from_raw(raw), Err(Error::Dataset(_))));
    }

    #[test]
    fn json_round_trip() {
        let raw = raw_dataset();
        let text = serde_json::to_string(&raw).unwrap();
        let back: RawDataset = serde_json::from_str(&text).unwrap();
        let ds = DdiDataset::from_raw(back).unwrap();
        assert_eq!(ds.val.len(), 2);
    }
}
