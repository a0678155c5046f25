//! Checkpoint persistence and run artifacts.
//!
//! A checkpoint is the best model's named parameter tables plus the epoch
//! and validation loss it was taken at, serialized with bincode. The
//! per-epoch validation-loss history is dumped as a two-column CSV.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Named parameter vectors of a model, ordered for deterministic encoding.
pub type ParamTable = BTreeMap<String, Vec<f32>>;

/// Best-model snapshot taken by the trainer on validation improvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Epoch the snapshot was taken at.
    pub epoch: usize,
    /// Validation loss at that epoch.
    pub val_loss: f64,
    /// Model parameters by name.
    pub params: ParamTable,
}

impl Checkpoint {
    /// Serialize to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Deserialize from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }
}

/// Write the per-epoch validation losses as `epoch,val_loss` rows.
pub fn write_val_loss_csv(path: &Path, losses: &[f64]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "epoch,val_loss")?;
    for (epoch, loss) in losses.iter().enumerate() {
        writeln!(out, "{},{}", epoch, loss)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.bin");
        let mut params = ParamTable::new();
        params.insert("te_mean".into(), vec![0.25, 4.0]);
        params.insert("se_rates".into(), vec![0.1, 0.9]);
        let ck = Checkpoint {
            epoch: 3,
            val_loss: 0.72,
            params,
        };
        ck.save(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.epoch, 3);
        assert!((loaded.val_loss - 0.72).abs() < 1e-12);
        assert_eq!(loaded.params["se_rates"], vec![0.1, 0.9]);
    }

    #[test]
    fn csv_dump_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("val_loss.csv");
        write_val_loss_csv(&path, &[0.9, 0.8, 0.85]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,val_loss");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("1,"));
    }
}
