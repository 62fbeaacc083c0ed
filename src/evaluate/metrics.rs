//! Classification metrics for the evaluation report.

use thiserror::Error;

/// Errors produced while computing metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Test set is empty")]
    Empty,
    #[error("Labels and predictions differ in length ({labels} vs {predictions})")]
    LengthMismatch { labels: usize, predictions: usize },
    #[error("AUC requires both classes in the test labels (found only {0})")]
    SingleClass(u8),
    #[error("Label out of range for binary classification: {0}")]
    InvalidLabel(f64),
}

/// Area under the ROC curve via the rank statistic.
///
/// Tied scores receive their average rank, so interchangeable scores
/// contribute 0.5 per positive/negative pair. Both classes must be present.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Result<f64, MetricsError> {
    if labels.is_empty() {
        return Err(MetricsError::Empty);
    }
    if labels.len() != scores.len() {
        return Err(MetricsError::LengthMismatch {
            labels: labels.len(),
            predictions: scores.len(),
        });
    }
    let positives = labels.iter().filter(|&&label| label == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MetricsError::SingleClass(if positives == 0 { 0 } else { 1 }));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks across tie groups, then sum the positive ranks.
    let mut rank_sum_positive = 0.0f64;
    let mut idx = 0usize;
    while idx < order.len() {
        let mut end = idx + 1;
        while end < order.len() && scores[order[end]] == scores[order[idx]] {
            end += 1;
        }
        // Ranks are 1-based; the group [idx, end) shares the average rank.
        let avg_rank = ((idx + 1) + end) as f64 / 2.0;
        for &row in &order[idx..end] {
            if labels[row] == 1 {
                rank_sum_positive += avg_rank;
            }
        }
        idx = end;
    }

    let positives = positives as f64;
    let negatives = negatives as f64;
    let u = rank_sum_positive - positives * (positives + 1.0) / 2.0;
    Ok(u / (positives * negatives))
}

/// F1 score with predictions compared to labels verbatim.
///
/// A prediction counts as positive only when it equals exactly 1.0; there is
/// no thresholding step, so continuous scores in (0, 1) all count as
/// negative predictions. That is the contract of the pipeline this report
/// feeds; callers holding probabilities must threshold before calling.
pub fn f1_verbatim(labels: &[u8], predictions: &[f64]) -> Result<f64, MetricsError> {
    if labels.is_empty() {
        return Err(MetricsError::Empty);
    }
    if labels.len() != predictions.len() {
        return Err(MetricsError::LengthMismatch {
            labels: labels.len(),
            predictions: predictions.len(),
        });
    }
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&label, &prediction) in labels.iter().zip(predictions) {
        let predicted_positive = prediction == 1.0;
        match (label == 1, predicted_positive) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denominator = 2 * tp + fp + fn_;
    if denominator == 0 {
        return Ok(0.0);
    }
    Ok(2.0 * tp as f64 / denominator as f64)
}

/// Convert float labels read from the test CSV into {0, 1}.
pub fn binary_labels(raw: &[f64]) -> Result<Vec<u8>, MetricsError> {
    raw.iter()
        .map(|&value| {
            if value == 0.0 {
                Ok(0)
            } else if value == 1.0 {
                Ok(1)
            } else {
                Err(MetricsError::InvalidLabel(value))
            }
        })
        .collect()
}
