//! Metric and loss computation for the two prediction heads.
//!
//! The therapeutic-effect head is a regression evaluated with MSE, RMSE,
//! MAE and Pearson correlation; the side-effect head is a multi-label
//! classification evaluated with micro-averaged AUROC and AUPRC over the
//! flattened label/score matrices.
//!
//! | Metric  | Range   | Notes                                      |
//! |---------|---------|--------------------------------------------|
//! | MSE     | [0, ∞)  | mean squared error                         |
//! | RMSE    | [0, ∞)  | √MSE                                       |
//! | MAE     | [0, ∞)  | mean absolute error                        |
//! | Pearson | [-1, 1] | 0 when either side has zero variance       |
//! | AUROC   | [0, 1]  | rank-based, tie-aware; `None` if one class |
//! | AUPRC   | [0, 1]  | average precision; `None` if no positives  |

use ndarray::ArrayView2;

/// Probability clamp for binary cross entropy.
const BCE_EPS: f64 = 1e-7;

/// Regression metrics for the therapeutic-effect head.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegressionMetrics {
    /// Mean squared error.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Pearson correlation coefficient.
    pub pearson: f64,
}

impl RegressionMetrics {
    /// Compute all regression metrics over aligned label/prediction slices.
    pub fn from_pairs(labels: &[f64], predictions: &[f64]) -> Self {
        debug_assert_eq!(labels.len(), predictions.len());
        if labels.is_empty() {
            return Self::default();
        }
        let mse = mean_squared_error(labels, predictions);
        Self {
            mse,
            rmse: mse.sqrt(),
            mae: mean_absolute_error(labels, predictions),
            pearson: pearson(labels, predictions),
        }
    }

    /// Format as a one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "MSE: {:.4} | RMSE: {:.4} | MAE: {:.4} | Pearson: {:.4}",
            self.mse, self.rmse, self.mae, self.pearson
        )
    }
}

/// Mean and standard deviation of each regression metric across repeated
/// training runs.
#[derive(Debug, Clone, Default)]
pub struct RegressionSummary {
    pub mse: (f64, f64),
    pub rmse: (f64, f64),
    pub mae: (f64, f64),
    pub pearson: (f64, f64),
    pub num_runs: usize,
}

impl RegressionSummary {
    /// Aggregate per-run metrics into mean/std pairs.
    pub fn from_runs(runs: &[RegressionMetrics]) -> Self {
        Self {
            mse: mean_std(runs.iter().map(|m| m.mse)),
            rmse: mean_std(runs.iter().map(|m| m.rmse)),
            mae: mean_std(runs.iter().map(|m| m.mae)),
            pearson: mean_std(runs.iter().map(|m| m.pearson)),
            num_runs: runs.len(),
        }
    }

    /// Format as a multi-line summary.
    pub fn summary(&self) -> String {
        format!(
            "MSE {:.4} ± {:.4} | RMSE {:.4} ± {:.4} | MAE {:.4} ± {:.4} | Pearson {:.4} ± {:.4} (runs={})",
            self.mse.0,
            self.mse.1,
            self.rmse.0,
            self.rmse.1,
            self.mae.0,
            self.mae.1,
            self.pearson.0,
            self.pearson.1,
            self.num_runs
        )
    }
}

fn mean_std(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Mean squared error.
pub fn mean_squared_error(labels: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), predictions.len());
    if labels.is_empty() {
        return 0.0;
    }
    labels
        .iter()
        .zip(predictions)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / labels.len() as f64
}

/// Mean absolute error.
pub fn mean_absolute_error(labels: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), predictions.len());
    if labels.is_empty() {
        return 0.0;
    }
    labels
        .iter()
        .zip(predictions)
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / labels.len() as f64
}

/// Pearson correlation coefficient; 0 when either side has no variance.
pub fn pearson(labels: &[f64], predictions: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), predictions.len());
    let n = labels.len() as f64;
    if labels.is_empty() {
        return 0.0;
    }
    let mean_y = labels.iter().sum::<f64>() / n;
    let mean_p = predictions.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_y = 0.0;
    let mut var_p = 0.0;
    for (y, p) in labels.iter().zip(predictions) {
        let dy = y - mean_y;
        let dp = p - mean_p;
        cov += dy * dp;
        var_y += dy * dy;
        var_p += dp * dp;
    }
    let denom = (var_y * var_p).sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        cov / denom
    }
}

/// Rank-based AUROC with tie-aware average ranks.
///
/// Returns `None` when only one class is present.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    debug_assert_eq!(labels.len(), scores.len());
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(std::cmp::Ordering::Equal));

    // Average ranks over tied score groups, then the Mann-Whitney statistic.
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j averaged across the tie group.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

/// Average precision (area under the precision-recall curve, step-wise).
///
/// Returns `None` when there are no positive labels.
pub fn average_precision(labels: &[bool], scores: &[f64]) -> Option<f64> {
    debug_assert_eq!(labels.len(), scores.len());
    let positives = labels.iter().filter(|&&l| l).count();
    if positives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ap = 0.0;
    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        let mut group_tp = 0usize;
        while j < order.len() && scores[order[j]] == scores[order[i]] {
            if labels[order[j]] {
                group_tp += 1;
            }
            j += 1;
        }
        tp += group_tp;
        seen += j - i;
        let precision = tp as f64 / seen as f64;
        let recall_delta = group_tp as f64 / positives as f64;
        ap += precision * recall_delta;
        i = j;
    }
    Some(ap)
}

/// Micro-averaged AUROC over flattened multi-label matrices.
pub fn micro_roc_auc(labels: ArrayView2<'_, f32>, scores: ArrayView2<'_, f64>) -> Option<f64> {
    let (flat_labels, flat_scores) = flatten(labels, scores);
    roc_auc(&flat_labels, &flat_scores)
}

/// Micro-averaged average precision over flattened multi-label matrices.
pub fn micro_average_precision(
    labels: ArrayView2<'_, f32>,
    scores: ArrayView2<'_, f64>,
) -> Option<f64> {
    let (flat_labels, flat_scores) = flatten(labels, scores);
    average_precision(&flat_labels, &flat_scores)
}

fn flatten(labels: ArrayView2<'_, f32>, scores: ArrayView2<'_, f64>) -> (Vec<bool>, Vec<f64>) {
    debug_assert_eq!(labels.dim(), scores.dim());
    let flat_labels = labels.iter().map(|&l| l > 0.5).collect();
    let flat_scores = scores.iter().copied().collect();
    (flat_labels, flat_scores)
}

/// Mean squared error loss over aligned slices.
pub fn mse_loss(predictions: &[f64], labels: &[f64]) -> f64 {
    mean_squared_error(labels, predictions)
}

/// Mean binary cross entropy over probability/label matrices.
pub fn bce_loss(probabilities: ArrayView2<'_, f64>, labels: ArrayView2<'_, f32>) -> f64 {
    debug_assert_eq!(probabilities.dim(), labels.dim());
    let count = probabilities.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(BCE_EPS, 1.0 - BCE_EPS);
            let y = f64::from(y);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn regression_metrics_known_values() {
        let labels = [1.0, 2.0, 3.0, 4.0];
        let preds = [1.5, 2.5, 2.5, 4.5];
        let m = RegressionMetrics::from_pairs(&labels, &preds);
        assert!((m.mse - 0.25).abs() < 1e-12);
        assert!((m.rmse - 0.5).abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
        assert!(m.pearson > 0.9);
    }

    #[test]
    fn pearson_perfect_and_flat() {
        let labels = [1.0, 2.0, 3.0];
        assert!((pearson(&labels, &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&labels, &[5.0, 3.0, 1.0]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&labels, &[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn auroc_separable_and_random() {
        let labels = [true, true, false, false];
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]), Some(0.0));
        // All scores tied: AUROC is exactly one half.
        assert_eq!(roc_auc(&labels, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        // Single-class input has no defined AUROC.
        assert_eq!(roc_auc(&[true, true], &[0.1, 0.9]), None);
    }

    #[test]
    fn auroc_with_ties_matches_hand_computation() {
        // Scores: pos 0.8, pos 0.5, neg 0.5, neg 0.2.
        // Pairs: (p1,n1)=1, (p1,n2)=1, (p2,n1)=0.5, (p2,n2)=1 → 3.5/4.
        let got = roc_auc(&[true, true, false, false], &[0.8, 0.5, 0.5, 0.2]).unwrap();
        assert!((got - 0.875).abs() < 1e-12);
    }

    #[test]
    fn average_precision_known_values() {
        // Ranking: pos, neg, pos → AP = 1/1 * 0.5 + 2/3 * 0.5
        let got = average_precision(&[true, false, true], &[0.9, 0.8, 0.7]).unwrap();
        assert!((got - (0.5 + 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(average_precision(&[false, false], &[0.1, 0.2]), None);
    }

    #[test]
    fn micro_metrics_flatten_matrices() {
        let labels = array![[1.0f32, 0.0], [0.0, 1.0]];
        let scores = array![[0.9, 0.1], [0.2, 0.8]];
        assert_eq!(micro_roc_auc(labels.view(), scores.view()), Some(1.0));
        let ap = micro_average_precision(labels.view(), scores.view()).unwrap();
        assert!((ap - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bce_loss_confident_and_wrong() {
        let labels = array![[1.0f32, 0.0]];
        let good = array![[0.99, 0.01]];
        let bad = array![[0.01, 0.99]];
        assert!(bce_loss(good.view(), labels.view()) < 0.05);
        assert!(bce_loss(bad.view(), labels.view()) > 3.0);
    }

    #[test]
    fn summary_aggregates_runs() {
        let runs = [
            RegressionMetrics {
                mse: 1.0,
                rmse: 1.0,
                mae: 1.0,
                pearson: 0.5,
            },
            RegressionMetrics {
                mse: 3.0,
                rmse: 2.0,
                mae: 2.0,
                pearson: 0.7,
            },
        ];
        let summary = RegressionSummary::from_runs(&runs);
        assert!((summary.mse.0 - 2.0).abs() < 1e-12);
        assert!((summary.mse.1 - 1.0).abs() < 1e-12);
        assert_eq!(summary.num_runs, 2);
    }
}
