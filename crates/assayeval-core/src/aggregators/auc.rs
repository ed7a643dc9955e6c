//! Class-balanced ROC-AUC for classification endpoints.

use std::collections::BTreeMap;

use assayeval_types::{EndpointResult, EvalError, Result, ResultsMap, TaskType};
use ndarray::{Array1, ArrayView1};

use crate::aggregator::Aggregator;

/// Per-sample weights that give both classes the same total weight.
///
/// A sample of class `c` gets `n / (2 * n_c)`; a class that is absent
/// contributes nothing.
pub fn labels_to_weights(y_true: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = y_true.len() as f64;
    let positives = y_true.iter().filter(|&&y| y == 1.0).count() as f64;
    let negatives = n - positives;
    y_true.mapv(|y| {
        let class_count = if y == 1.0 { positives } else { negatives };
        n / (2.0 * class_count)
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone)]
pub struct RocCurve {
    /// From (0, 0) to (1, 1), one point per distinct score.
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

/// Weighted ROC curve of `scores` against binary `labels`.
///
/// Tied scores are treated as one threshold, so the curve does not depend on
/// the order of tied samples.
pub fn roc_curve(
    labels: ArrayView1<'_, f64>,
    scores: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
) -> Result<RocCurve> {
    let undefined = |reason: &str| EvalError::UndefinedMetric {
        metric: "roc_auc",
        endpoint: "-".to_string(),
        reason: reason.to_string(),
    };
    if labels.is_empty() {
        return Err(undefined("empty input"));
    }
    if labels.len() != scores.len() || labels.len() != weights.len() {
        return Err(undefined("labels, scores and weights differ in length"));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(undefined("scores contain NaN or infinite values"));
    }

    let (mut total_pos, mut total_neg) = (0.0, 0.0);
    for (&y, &w) in labels.iter().zip(weights.iter()) {
        if y == 1.0 {
            total_pos += w;
        } else {
            total_neg += w;
        }
    }
    if total_pos <= 0.0 {
        return Err(undefined("only one class present: no positive samples"));
    }
    if total_neg <= 0.0 {
        return Err(undefined("only one class present: no negative samples"));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0.0, 0.0);
    let mut i = 0;
    while i < order.len() {
        let current = scores[order[i]];
        while i < order.len() && scores[order[i]] == current {
            let idx = order[i];
            if labels[idx] == 1.0 {
                tp += weights[idx];
            } else {
                fp += weights[idx];
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: current,
            fpr: fp / total_neg,
            tpr: tp / total_pos,
        });
    }

    let auc = points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum();

    Ok(RocCurve { points, auc })
}

/// ROC-AUC on the positive-class probability column, weighted by
/// [`labels_to_weights`].
pub struct RocAucAggregator;

impl Aggregator for RocAucAggregator {
    fn name(&self) -> &'static str {
        "roc_auc"
    }

    fn task_type(&self) -> TaskType {
        TaskType::Classification
    }

    fn score(&self, endpoint: &str, result: &EndpointResult) -> Result<f64> {
        let positive = result
            .y_score()
            .positive_class()
            .ok_or_else(|| EvalError::PredictionShape {
                endpoint: endpoint.to_string(),
                reason: "expected a two-column class-probability matrix".to_string(),
            })?;
        let weights = labels_to_weights(result.y_true().view());
        roc_curve(result.y_true().view(), positive, weights.view())
            .map(|curve| curve.auc)
            .map_err(|err| match err {
                EvalError::UndefinedMetric { metric, reason, .. } => EvalError::UndefinedMetric {
                    metric,
                    endpoint: endpoint.to_string(),
                    reason,
                },
                other => other,
            })
    }
}

/// ROC-AUC for every classification endpoint.
pub fn compute_roc_auc_scores(
    results: &ResultsMap,
    task_types: &BTreeMap<String, TaskType>,
) -> Result<BTreeMap<String, f64>> {
    RocAucAggregator.aggregate(results, task_types)
}
