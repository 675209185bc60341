//! Binary classification metrics.
//!
//! ROC construction follows the usual reference semantics: scores are
//! visited in descending order, one curve point is emitted per distinct
//! score, collinear intermediate points are dropped and an initial
//! `(0, 0)` point with an infinite threshold is prepended.

use crate::error::{Error, Result};
use serde::Serialize;

/// Validate that every prediction is a probability in `[0, 1]`.
pub fn validate_predictions(predictions: &[f64]) -> Result<()> {
    if let Some((index, value)) = predictions
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(Error::InvalidInput(format!(
            "prediction {value} at index {index} is outside [0, 1]"
        )));
    }
    Ok(())
}

/// Validate that every label is 0 or 1.
pub fn validate_labels(labels: &[u8]) -> Result<()> {
    if let Some((index, value)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
        return Err(Error::InvalidInput(format!(
            "label {value} at index {index} is not binary"
        )));
    }
    Ok(())
}

fn check_aligned(labels: &[u8], scores: &[f64]) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(Error::InvalidInput(format!(
            "labels length {} != predictions length {}",
            labels.len(),
            scores.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::InvalidInput("no samples to evaluate".to_string()));
    }
    Ok(())
}

/// Round to two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Receiver operating characteristic curve
#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    /// False positive rate per point
    pub fpr: Vec<f64>,
    /// True positive rate per point
    pub tpr: Vec<f64>,
    /// Decision threshold per point, strictly decreasing; the first is `+inf`
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// `(fpr, tpr)` pairs in curve order
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.fpr.iter().copied().zip(self.tpr.iter().copied()).collect()
    }

    /// Trapezoidal area under the curve
    pub fn area_under_curve(&self) -> f64 {
        self.fpr
            .windows(2)
            .zip(self.tpr.windows(2))
            .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
            .sum()
    }

    /// Youden's index `tpr + (1 - fpr) - 1` for every point
    pub fn youden_index(&self) -> Vec<f64> {
        self.tpr
            .iter()
            .zip(self.fpr.iter())
            .map(|(tpr, fpr)| tpr + (1.0 - fpr) - 1.0)
            .collect()
    }
}

/// Compute the ROC curve of `scores` against binary `labels`.
///
/// Fails when the inputs are misaligned, empty, out of range, or contain
/// only one class.
pub fn roc_curve(labels: &[u8], scores: &[f64], drop_intermediate: bool) -> Result<RocCurve> {
    check_aligned(labels, scores)?;
    validate_labels(labels)?;
    validate_predictions(scores)?;

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(Error::InvalidInput(
            "ROC is undefined when only one class is present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);

    for (pos, &idx) in order.iter().enumerate() {
        if labels[idx] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }

        let block_ends = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if block_ends {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[idx]);
        }
    }

    if drop_intermediate && tps.len() > 2 {
        let second_diff = |v: &[usize], i: usize| v[i + 1] as i64 - 2 * v[i] as i64 + v[i - 1] as i64;
        let last = tps.len() - 1;
        let keep: Vec<usize> = (0..=last)
            .filter(|&i| i == 0 || i == last || second_diff(&fps, i) != 0 || second_diff(&tps, i) != 0)
            .collect();

        tps = keep.iter().map(|&i| tps[i]).collect();
        fps = keep.iter().map(|&i| fps[i]).collect();
        thresholds = keep.iter().map(|&i| thresholds[i]).collect();
    }

    let mut curve = RocCurve {
        fpr: Vec::with_capacity(tps.len() + 1),
        tpr: Vec::with_capacity(tps.len() + 1),
        thresholds: Vec::with_capacity(tps.len() + 1),
    };
    curve.fpr.push(0.0);
    curve.tpr.push(0.0);
    curve.thresholds.push(f64::INFINITY);

    for ((tp, fp), threshold) in tps.into_iter().zip(fps).zip(thresholds) {
        curve.fpr.push(fp as f64 / negatives as f64);
        curve.tpr.push(tp as f64 / positives as f64);
        curve.thresholds.push(threshold);
    }

    Ok(curve)
}

/// Area under the ROC curve.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Result<f64> {
    Ok(roc_curve(labels, scores, true)?.area_under_curve())
}

/// Threshold chosen from a ROC curve
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThresholdSelection {
    /// Index into the curve
    pub index: usize,
    /// Threshold value at that index
    pub threshold: f64,
    /// Youden's index at that threshold
    pub youden: f64,
}

/// Pick the threshold maximizing Youden's index; ties go to the first point.
pub fn best_threshold(curve: &RocCurve) -> Result<ThresholdSelection> {
    let youden = curve.youden_index();
    let mut best: Option<(usize, f64)> = None;

    for (index, &j) in youden.iter().enumerate() {
        match best {
            Some((_, best_j)) if !(j > best_j) => {}
            _ => best = Some((index, j)),
        }
    }

    let (index, youden) =
        best.ok_or_else(|| Error::InvalidInput("empty ROC curve".to_string()))?;

    Ok(ThresholdSelection {
        index,
        threshold: curve.thresholds[index],
        youden,
    })
}

/// Binarize probabilities: `p >= threshold` is positive.
pub fn binarize(scores: &[f64], threshold: f64) -> Vec<u8> {
    scores
        .iter()
        .map(|&p| u8::from(p >= threshold))
        .collect()
}

/// 2x2 confusion matrix, rows = actual, columns = predicted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Count `(actual, predicted)` pairs
    pub fn from_predictions(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::InvalidInput(format!(
                "actual length {} != predicted length {}",
                actual.len(),
                predicted.len()
            )));
        }
        validate_labels(actual)?;
        validate_labels(predicted)?;

        let mut matrix = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (0, 0) => matrix.true_negatives += 1,
                (0, _) => matrix.false_positives += 1,
                (_, 0) => matrix.false_negatives += 1,
                _ => matrix.true_positives += 1,
            }
        }
        Ok(matrix)
    }

    /// Matrix as `[actual][predicted]`
    pub fn rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn correct(&self) -> usize {
        self.true_negatives + self.true_positives
    }

    pub fn predicted_positives(&self) -> usize {
        self.true_positives + self.false_positives
    }

    pub fn actual_positives(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

/// Metrics derived from a confusion matrix, rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl BinaryMetrics {
    /// Derive metrics, falling back to 0.0 wherever a denominator is zero.
    ///
    /// F1 is computed from the already rounded precision and recall.
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let tp = matrix.true_positives as f64;

        let accuracy = if matrix.total() > 0 {
            round2(matrix.correct() as f64 / matrix.total() as f64)
        } else {
            0.0
        };

        let precision = if matrix.predicted_positives() > 0 {
            round2(tp / matrix.predicted_positives() as f64)
        } else {
            0.0
        };

        let recall = if matrix.actual_positives() > 0 {
            round2(tp / matrix.actual_positives() as f64)
        } else {
            0.0
        };

        let f1 = if precision + recall > 0.0 {
            round2(2.0 * (precision * recall) / (precision + recall))
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1,
        }
    }
}

impl std::fmt::Display for BinaryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Accuracy: {:.2} | Precision: {:.2} | Recall: {:.2} | F1 Score: {:.2}",
            self.accuracy, self.precision, self.recall, self.f1
        )
    }
}

/// Everything computed from one set of aligned labels and probabilities
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub num_samples: usize,
    pub num_positives: usize,
    pub auc: f64,
    pub selection: ThresholdSelection,
    pub confusion_matrix: ConfusionMatrix,
    pub metrics: BinaryMetrics,
    pub roc_curve: RocCurve,
}

/// ROC, AUC, Youden threshold, confusion matrix and derived metrics.
pub fn evaluate_scores(labels: &[u8], scores: &[f64]) -> Result<EvaluationSummary> {
    let roc_curve = roc_curve(labels, scores, true)?;
    let auc = roc_curve.area_under_curve();
    let selection = best_threshold(&roc_curve)?;

    let predicted = binarize(scores, selection.threshold);
    let confusion_matrix = ConfusionMatrix::from_predictions(labels, &predicted)?;
    let metrics = BinaryMetrics::from_confusion(&confusion_matrix);

    Ok(EvaluationSummary {
        num_samples: labels.len(),
        num_positives: labels.iter().filter(|&&l| l == 1).count(),
        auc,
        selection,
        confusion_matrix,
        metrics,
        roc_curve,
    })
}
