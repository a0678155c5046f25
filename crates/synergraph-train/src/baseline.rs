//! Label-statistics baseline model.
//!
//! Predicts the running mean therapeutic effect and per-effect base rates,
//! ignoring the graphs entirely. It exists to exercise the full pipeline
//! (tests, smoke runs, sanity floors for real models), not to be good.

use crate::checkpoint::ParamTable;
use crate::error::{Error, Result};
use crate::model::{BatchLabels, BatchPrediction, ModelInput, PairModel};
use ndarray::Array2;

/// Running-mean predictor for both heads.
#[derive(Debug, Clone)]
pub struct BaselineModel {
    te_sum: f64,
    se_sums: Vec<f64>,
    count: f64,
}

impl BaselineModel {
    /// Baseline over the given number of side effects.
    pub fn new(num_side_effects: usize) -> Self {
        Self {
            te_sum: 0.0,
            se_sums: vec![0.0; num_side_effects],
            count: 0.0,
        }
    }

    fn te_mean(&self) -> f64 {
        if self.count > 0.0 {
            self.te_sum / self.count
        } else {
            0.0
        }
    }

    fn se_rate(&self, effect: usize) -> f64 {
        if self.count > 0.0 {
            // Keep rates off the exact 0/1 boundary for finite BCE.
            (self.se_sums[effect] / self.count).clamp(1e-3, 1.0 - 1e-3)
        } else {
            0.5
        }
    }

    fn predict_batch(&self, num_samples: usize) -> BatchPrediction {
        let te = vec![self.te_mean(); num_samples];
        let se = Array2::from_shape_fn((num_samples, self.se_sums.len()), |(_, effect)| {
            self.se_rate(effect)
        });
        BatchPrediction { te, se }
    }
}

impl PairModel for BaselineModel {
    fn train_step(
        &mut self,
        input: &ModelInput<'_>,
        labels: &BatchLabels<'_>,
    ) -> Result<BatchPrediction> {
        let prediction = self.predict_batch(input.pairs.len());
        for &y in labels.te {
            self.te_sum += y;
        }
        for row in labels.se.rows() {
            for (effect, &y) in row.iter().enumerate() {
                self.se_sums[effect] += f64::from(y);
            }
        }
        self.count += labels.te.len() as f64;
        Ok(prediction)
    }

    fn predict(&self, input: &ModelInput<'_>) -> Result<BatchPrediction> {
        Ok(self.predict_batch(input.pairs.len()))
    }

    fn params(&self) -> ParamTable {
        let mut params = ParamTable::new();
        params.insert("te_sum".into(), vec![self.te_sum as f32]);
        params.insert(
            "se_sums".into(),
            self.se_sums.iter().map(|&s| s as f32).collect(),
        );
        params.insert("count".into(), vec![self.count as f32]);
        params
    }

    fn load_params(&mut self, params: &ParamTable) -> Result<()> {
        let get = |name: &str| {
            params
                .get(name)
                .ok_or_else(|| Error::Model(format!("missing baseline parameter `{}`", name)))
        };
        self.te_sum = f64::from(
            *get("te_sum")?
                .first()
                .ok_or_else(|| Error::Model("empty `te_sum` parameter".into()))?,
        );
        self.count = f64::from(
            *get("count")?
                .first()
                .ok_or_else(|| Error::Model("empty `count` parameter".into()))?,
        );
        let se_sums = get("se_sums")?;
        if se_sums.len() != self.se_sums.len() {
            return Err(Error::Model(format!(
                "baseline expects {} side effects, checkpoint has {}",
                self.se_sums.len(),
                se_sums.len()
            )));
        }
        self.se_sums = se_sums.iter().map(|&s| f64::from(s)).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use synergraph_core::{DrugPair, Minibatch, PerSide};

    fn empty_minibatch() -> Minibatch {
        Minibatch {
            per_side: PerSide::splat(Vec::new()),
        }
    }

    #[test]
    fn running_means_track_labels() {
        let mut model = BaselineModel::new(2);
        let mb = empty_minibatch();
        let pairs = [DrugPair::new(0, 1), DrugPair::new(1, 0)];
        let input = ModelInput {
            minibatch: &mb,
            pairs: &pairs,
            cell_lines: &[0, 0],
        };
        let se = array![[1.0f32, 0.0], [1.0, 0.0]];
        let labels = BatchLabels {
            te: &[2.0, 4.0],
            se: se.view(),
        };
        model.train_step(&input, &labels).unwrap();

        let pred = model.predict(&input).unwrap();
        assert!((pred.te[0] - 3.0).abs() < 1e-12);
        assert!(pred.se[[0, 0]] > 0.9);
        assert!(pred.se[[0, 1]] < 0.1);
    }

    #[test]
    fn params_round_trip() {
        let mut model = BaselineModel::new(2);
        let mb = empty_minibatch();
        let pairs = [DrugPair::new(0, 1)];
        let input = ModelInput {
            minibatch: &mb,
            pairs: &pairs,
            cell_lines: &[0],
        };
        let se = array![[0.0f32, 1.0]];
        let labels = BatchLabels {
            te: &[1.5],
            se: se.view(),
        };
        model.train_step(&input, &labels).unwrap();

        let mut restored = BaselineModel::new(2);
        restored.load_params(&model.params()).unwrap();
        let a = model.predict(&input).unwrap();
        let b = restored.predict(&input).unwrap();
        assert_eq!(a.te, b.te);
        assert_eq!(a.se, b.se);
    }

    #[test]
    fn shape_mismatch_rejected_on_load() {
        let model = BaselineModel::new(3);
        let mut other = BaselineModel::new(2);
        assert!(matches!(
            other.load_params(&model.params()),
            Err(Error::Model(_))
        ));
    }
}
